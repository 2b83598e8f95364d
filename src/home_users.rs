use http::Method;

use crate::client::PlexApi;
use crate::models::{GetHomeUsersResponse, SwitchUserRequest, SwitchUserResponse};
use crate::operation::OperationSpec;
use crate::options::{Options, SupportedOption};
use crate::response::BodyFormat;

pub(crate) const GET_HOME_USERS: OperationSpec = OperationSpec {
    id: "get-home-users",
    method: Method::GET,
    path: "/home/users",
    success_statuses: &[200],
    response_format: BodyFormat::Json,
    retry_status_codes: Some(&["429", "500", "502", "503", "504"]),
    supported_options: &[
        SupportedOption::ServerUrl,
        SupportedOption::Retries,
        SupportedOption::Timeout,
    ],
};

pub(crate) const SWITCH_USER: OperationSpec = OperationSpec {
    id: "switch-user",
    method: Method::POST,
    path: "/home/users/{id}/switch",
    success_statuses: &[200, 201],
    response_format: BodyFormat::Json,
    retry_status_codes: None,
    supported_options: &[SupportedOption::ServerUrl, SupportedOption::Timeout],
};

/// Plex Home membership operations.
#[derive(Clone, Debug)]
pub struct HomeUsers {
    api: PlexApi,
}

impl HomeUsers {
    pub(crate) fn new(api: PlexApi) -> Self {
        Self { api }
    }

    /// Lists every user of the signed-in account's home.
    ///
    /// Retried on 429 and 5xx gateway statuses when a retry policy is
    /// configured for the SDK or passed in `options`.
    pub async fn get_home_users(&self, options: Options) -> crate::Result<GetHomeUsersResponse> {
        self.api.invoke(&GET_HOME_USERS, &(), options).await
    }

    /// Switches the active account to another home user.
    ///
    /// Never retried: a per-call retry policy is rejected with
    /// [`Error::UnsupportedOption`](crate::Error::UnsupportedOption).
    pub async fn switch_user(
        &self,
        request: SwitchUserRequest,
        options: Options,
    ) -> crate::Result<SwitchUserResponse> {
        self.api.invoke(&SWITCH_USER, &request, options).await
    }
}
