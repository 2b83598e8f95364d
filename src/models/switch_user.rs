use serde::{Deserialize, Serialize};

use crate::models::UserPlexAccount;
use crate::request::{MediaType, OperationParams, RequestBody, serialize_body};
use crate::response::OperationResponse;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SwitchUserRequestBody {
    /// Required when the target user is protected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitchUserRequest {
    /// Id of the home user to switch to.
    pub id: String,
    pub request_body: SwitchUserRequestBody,
}

impl SwitchUserRequest {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            request_body: SwitchUserRequestBody::default(),
        }
    }

    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.request_body.pin = Some(pin.into());
        self
    }
}

impl OperationParams for SwitchUserRequest {
    fn path_params(&self) -> Vec<(&'static str, String)> {
        vec![("id", self.id.clone())]
    }

    fn request_body(&self) -> crate::Result<Option<RequestBody>> {
        serialize_body(Some(&self.request_body), MediaType::Json)
    }
}

pub type SwitchUserResponse = OperationResponse<UserPlexAccount>;

#[cfg(test)]
mod tests {
    use super::SwitchUserRequest;
    use crate::request::OperationParams;

    #[test]
    fn pin_is_omitted_when_unset() {
        let body = SwitchUserRequest::new(7)
            .request_body()
            .expect("serializes")
            .expect("json object body");
        assert_eq!(body.bytes().as_ref(), b"{}");
        assert_eq!(body.content_type(), "application/json");
    }

    #[test]
    fn pin_and_id_are_carried() {
        let request = SwitchUserRequest::new("7").pin("1234");
        assert_eq!(request.path_params(), vec![("id", "7".to_owned())]);
        let body = request
            .request_body()
            .expect("serializes")
            .expect("json object body");
        assert_eq!(body.bytes().as_ref(), br#"{"pin":"1234"}"#);
    }
}
