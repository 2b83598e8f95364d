use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, SdkError};
use crate::util::truncate_body;

/// Wire format of a successful response body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyFormat {
    #[default]
    Json,
    Xml,
}

/// A fully buffered transport response.
#[derive(Clone, Debug)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T>(&self) -> crate::Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body).map_err(|source| Error::Deserialize {
            source,
            body: truncate_body(&self.body),
        })
    }

    pub fn xml<T>(&self) -> crate::Result<T>
    where
        T: DeserializeOwned,
    {
        let text = std::str::from_utf8(&self.body).map_err(|source| Error::DeserializeXml {
            source: <quick_xml::DeError as serde::de::Error>::custom(source),
            body: truncate_body(&self.body),
        })?;
        quick_xml::de::from_str(text).map_err(|source| Error::DeserializeXml {
            source,
            body: truncate_body(&self.body),
        })
    }
}

/// Typed outcome of one operation call.
#[derive(Clone, Debug)]
pub struct OperationResponse<T> {
    pub status_code: StatusCode,
    pub content_type: String,
    pub raw_response: RawResponse,
    pub object: Option<T>,
}

impl<T> OperationResponse<T> {
    pub fn into_object(self) -> Option<T> {
        self.object
    }
}

/// Interprets the final response of a call.
///
/// A status in `success_statuses` decodes the body into `T` (an empty body
/// yields `T::default()`). Any other status becomes [`Error::Api`] carrying the
/// raw body untouched.
pub fn decode_response<T>(
    response: RawResponse,
    success_statuses: &[u16],
    format: BodyFormat,
) -> crate::Result<OperationResponse<T>>
where
    T: DeserializeOwned + Default,
{
    let status = response.status();
    if !success_statuses.contains(&status.as_u16()) {
        return Err(Error::Api(Box::new(SdkError::new("API error", response))));
    }

    let object = if response.body().iter().all(u8::is_ascii_whitespace) {
        T::default()
    } else {
        match format {
            BodyFormat::Json => response.json()?,
            BodyFormat::Xml => response.xml()?,
        }
    };

    Ok(OperationResponse {
        status_code: status,
        content_type: response.content_type().to_owned(),
        raw_response: response,
        object: Some(object),
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::header::{CONTENT_TYPE, HeaderValue};
    use http::{HeaderMap, StatusCode};
    use serde::Deserialize;

    use super::{BodyFormat, RawResponse, decode_response};
    use crate::error::ErrorCode;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Identity {
        #[serde(default)]
        id: i64,
        #[serde(default)]
        name: String,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename = "MediaContainer")]
    struct Container {
        #[serde(rename = "@size")]
        size: u32,
        #[serde(rename = "@machineIdentifier")]
        machine_identifier: String,
    }

    fn response(status: u16, body: &'static str) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RawResponse::new(
            StatusCode::from_u16(status).expect("valid status"),
            headers,
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn success_status_decodes_json_shape() {
        let decoded = decode_response::<Identity>(
            response(200, r#"{"id":7,"name":"Ann"}"#),
            &[200],
            BodyFormat::Json,
        )
        .expect("decode should succeed");

        assert_eq!(decoded.status_code, StatusCode::OK);
        assert_eq!(decoded.content_type, "application/json");
        assert_eq!(
            decoded.object,
            Some(Identity {
                id: 7,
                name: "Ann".to_owned()
            })
        );
    }

    #[test]
    fn empty_success_body_yields_default_object() {
        let decoded = decode_response::<Identity>(response(204, ""), &[200, 204], BodyFormat::Json)
            .expect("empty body should decode");

        assert_eq!(decoded.object, Some(Identity::default()));
    }

    #[test]
    fn non_success_status_keeps_raw_body() {
        let error = decode_response::<Identity>(
            response(404, r#"{"error":"not found"}"#),
            &[200],
            BodyFormat::Json,
        )
        .expect_err("404 must be an api error");

        let api = error.as_api_error().expect("api error");
        assert_eq!(api.status_code(), 404);
        assert_eq!(api.body().as_ref(), br#"{"error":"not found"}"#);
        assert_eq!(api.raw_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let error = decode_response::<Identity>(response(200, "{\"id\":"), &[200], BodyFormat::Json)
            .expect_err("malformed json must fail");

        assert_eq!(error.code(), ErrorCode::Deserialize);
        assert!(error.as_api_error().is_none());
    }

    #[test]
    fn xml_format_decodes_attributes() {
        let decoded = decode_response::<Container>(
            response(
                200,
                r#"<MediaContainer size="2" machineIdentifier="abc123"></MediaContainer>"#,
            ),
            &[200],
            BodyFormat::Xml,
        )
        .expect("xml should decode");

        assert_eq!(
            decoded.object,
            Some(Container {
                size: 2,
                machine_identifier: "abc123".to_owned()
            })
        );
    }

    #[test]
    fn xml_with_invalid_utf8_is_a_decode_error() {
        let body: &'static [u8] = b"<MediaContainer size=\"1\" machineIdentifier=\"ab\xFF\"/>";
        let response = RawResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(body));

        let error = decode_response::<Container>(response, &[200], BodyFormat::Xml)
            .expect_err("invalid utf-8 must not decode");

        assert_eq!(error.code(), ErrorCode::DeserializeXml);
    }
}
