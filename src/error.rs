use bytes::Bytes;
use http::Method;
use thiserror::Error;

use crate::response::RawResponse;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Read,
    Timeout,
    /// The response body exceeded the transport's size limit.
    BodyTooLarge,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Read => "read",
            Self::Timeout => "timeout",
            Self::BodyTooLarge => "body_too_large",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

/// Why a call stopped before producing an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-call or SDK-wide timeout expired.
    Deadline,
    /// The caller cancelled the call's token.
    Token,
    /// The next backoff wait would run past the retry policy's elapsed-time budget.
    MaxElapsedTime,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Deadline => "deadline",
            Self::Token => "token",
            Self::MaxElapsedTime => "max_elapsed_time",
        };
        formatter.write_str(text)
    }
}

/// Failure reported by the transport when no usable response came back.
#[derive(Debug, Error)]
#[error("{kind} transport failure: {source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(
        kind: TransportErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub(crate) fn into_source(self) -> BoxError {
        self.source
    }
}

/// An API-level failure: the final response carried a status code outside the
/// operation's success set. The body is kept verbatim.
#[derive(Clone, Debug)]
pub struct SdkError {
    message: String,
    status_code: u16,
    body: Bytes,
    raw_response: RawResponse,
}

impl SdkError {
    pub(crate) fn new(message: impl Into<String>, raw_response: RawResponse) -> Self {
        Self {
            message: message.into(),
            status_code: raw_response.status().as_u16(),
            body: raw_response.body().clone(),
            raw_response,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn raw_response(&self) -> &RawResponse {
        &self.raw_response
    }
}

impl std::fmt::Display for SdkError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}: status {} body: {}",
            self.message,
            self.status_code,
            crate::util::truncate_body(&self.body)
        )
    }
}

impl std::error::Error for SdkError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    InvalidUri,
    InvalidPathTemplate,
    PathParam,
    SerializeJson,
    SerializeForm,
    InvalidHeaderName,
    InvalidHeaderValue,
    RequestBuild,
    UnsupportedOption,
    ServerIndex,
    TlsInit,
    Transport,
    Cancelled,
    Hook,
    Security,
    Api,
    Deserialize,
    DeserializeXml,
    Coercion,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUri => "invalid_uri",
            Self::InvalidPathTemplate => "invalid_path_template",
            Self::PathParam => "path_param",
            Self::SerializeJson => "serialize_json",
            Self::SerializeForm => "serialize_form",
            Self::InvalidHeaderName => "invalid_header_name",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::RequestBuild => "request_build",
            Self::UnsupportedOption => "unsupported_option",
            Self::ServerIndex => "server_index",
            Self::TlsInit => "tls_init",
            Self::Transport => "transport",
            Self::Cancelled => "cancelled",
            Self::Hook => "hook",
            Self::Security => "security",
            Self::Api => "api",
            Self::Deserialize => "deserialize",
            Self::DeserializeXml => "deserialize_xml",
            Self::Coercion => "coercion",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid request uri: {uri}")]
    InvalidUri { uri: String },
    #[error("invalid path template {template}: {message}")]
    InvalidPathTemplate { template: String, message: String },
    #[error("missing or unusable path parameter {name} in {template}")]
    PathParam { name: String, template: String },
    #[error("failed to serialize request json: {source}")]
    SerializeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize request form: {source}")]
    SerializeForm {
        #[source]
        source: serde_urlencoded::ser::Error,
    },
    #[error("invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("option {option} is not supported by operation {operation_id}")]
    UnsupportedOption {
        option: &'static str,
        operation_id: &'static str,
    },
    #[error("server index {index} is out of range ({available} servers configured)")]
    ServerIndex { index: usize, available: usize },
    #[error("failed to initialize tls: {message}")]
    TlsInit { message: String },
    #[error("http transport error ({kind}) for {method} {uri}: {source}")]
    Transport {
        kind: TransportErrorKind,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("request cancelled ({reason}) for {method} {uri}")]
    Cancelled {
        reason: CancelReason,
        method: Method,
        uri: String,
    },
    #[error("hook failed for operation {operation_id}: {source}")]
    Hook {
        operation_id: String,
        permanent: bool,
        #[source]
        source: BoxError,
    },
    #[error("failed to resolve security credentials: {source}")]
    Security {
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Api(Box<SdkError>),
    #[error("failed to decode response json: {source}; body={body}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("failed to decode response xml: {source}; body={body}")]
    DeserializeXml {
        #[source]
        source: quick_xml::DeError,
        body: String,
    },
    #[error("cannot coerce {value} into {target}")]
    Coercion { value: String, target: &'static str },
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUri { .. } => ErrorCode::InvalidUri,
            Self::InvalidPathTemplate { .. } => ErrorCode::InvalidPathTemplate,
            Self::PathParam { .. } => ErrorCode::PathParam,
            Self::SerializeJson { .. } => ErrorCode::SerializeJson,
            Self::SerializeForm { .. } => ErrorCode::SerializeForm,
            Self::InvalidHeaderName { .. } => ErrorCode::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => ErrorCode::InvalidHeaderValue,
            Self::RequestBuild { .. } => ErrorCode::RequestBuild,
            Self::UnsupportedOption { .. } => ErrorCode::UnsupportedOption,
            Self::ServerIndex { .. } => ErrorCode::ServerIndex,
            Self::TlsInit { .. } => ErrorCode::TlsInit,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
            Self::Hook { .. } => ErrorCode::Hook,
            Self::Security { .. } => ErrorCode::Security,
            Self::Api(_) => ErrorCode::Api,
            Self::Deserialize { .. } => ErrorCode::Deserialize,
            Self::DeserializeXml { .. } => ErrorCode::DeserializeXml,
            Self::Coercion { .. } => ErrorCode::Coercion,
        }
    }

    /// Returns the API error when the final response had a non-success status.
    pub fn as_api_error(&self) -> Option<&SdkError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Transport failures and hook failures the hook itself marked as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Hook { permanent, .. } => !permanent,
            _ => false,
        }
    }
}
