use serde::{Deserialize, Serialize};

use crate::codec;
use crate::response::OperationResponse;

/// The Plex Home of the signed-in account and its members.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetHomeUsersResponseBody {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "codec::null_as_default", rename = "guestUserID")]
    pub guest_user_id: i64,
    #[serde(default, deserialize_with = "codec::null_as_default", rename = "guestUserUUID")]
    pub guest_user_uuid: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub guest_enabled: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub subscription: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub users: Vec<HomeUser>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeUser {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub friendly_name: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub has_password: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub restricted: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub updated_at: i64,
    #[serde(default)]
    pub restriction_profile: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub admin: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub guest: bool,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub protected: bool,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub subscription: HomeUserSubscription,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HomeUserSubscription {
    #[serde(default, deserialize_with = "codec::null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "codec::null_as_default", rename = "type")]
    pub kind: String,
}

pub type GetHomeUsersResponse = OperationResponse<GetHomeUsersResponseBody>;
