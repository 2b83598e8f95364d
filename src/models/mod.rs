//! Request and response shapes of the home-users endpoints.

mod home_users;
mod switch_user;
mod user_plex_account;

pub use self::home_users::{
    GetHomeUsersResponse, GetHomeUsersResponseBody, HomeUser, HomeUserSubscription,
};
pub use self::switch_user::{SwitchUserRequest, SwitchUserRequestBody, SwitchUserResponse};
pub use self::user_plex_account::{
    MailingListStatus, PlexAccountProfile, PlexAccountSubscription, PlexService, UserPlexAccount,
};
