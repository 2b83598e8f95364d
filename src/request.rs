use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request};
use serde::Serialize;

use crate::error::Error;
use crate::headers::HeaderParam;
use crate::util::{join_base_path, parse_header_value};

/// Serialization used for a request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaType {
    #[default]
    Json,
    Form,
}

impl MediaType {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Form => "application/x-www-form-urlencoded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody {
    bytes: Bytes,
    content_type: String,
}

impl RequestBody {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// The outgoing request as the executor, security source and hooks see it.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<RequestBody>) {
        self.body = body;
    }

    /// Sets a header, replacing every earlier value of the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn try_set_header(&mut self, name: &str, value: &str) -> crate::Result<()> {
        let name = crate::util::parse_header_name(name)?;
        let value = parse_header_value(name.as_str(), value)?;
        self.set_header(name, value);
        Ok(())
    }

    pub(crate) fn to_http_request(&self) -> crate::Result<Request<Bytes>> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str());
        let Some(headers) = builder.headers_mut() else {
            return Err(Error::InvalidUri {
                uri: self.url.clone(),
            });
        };
        headers.extend(self.headers.clone());

        let body = match &self.body {
            Some(body) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(
                        CONTENT_TYPE,
                        parse_header_value(CONTENT_TYPE.as_str(), &body.content_type)?,
                    );
                }
                body.bytes.clone()
            }
            None => Bytes::new(),
        };

        builder
            .body(body)
            .map_err(|source| Error::RequestBuild { source })
    }
}

/// A parameter value: either a single scalar or an array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    pub(crate) fn join(&self, separator: &str) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::List(values) => values.join(separator),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryStyle {
    #[default]
    Form,
    PipeDelimited,
    SpaceDelimited,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    pub value: ParamValue,
    pub style: QueryStyle,
    pub explode: bool,
}

impl QueryParam {
    pub fn form(name: &'static str, value: impl Into<ParamValue>) -> Self {
        Self {
            name,
            value: value.into(),
            style: QueryStyle::Form,
            explode: true,
        }
    }

    pub fn with_style(mut self, style: QueryStyle, explode: bool) -> Self {
        self.style = style;
        self.explode = explode;
        self
    }
}

/// Path, query, header and body inputs of one operation, declared per request
/// type instead of discovered through reflection.
pub trait OperationParams {
    fn path_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn query_params(&self) -> Vec<QueryParam> {
        Vec::new()
    }

    fn header_params(&self) -> Vec<HeaderParam> {
        Vec::new()
    }

    fn request_body(&self) -> crate::Result<Option<RequestBody>> {
        Ok(None)
    }
}

impl OperationParams for () {}

/// Joins `template` onto `base_url`, substituting `{name}` placeholders with
/// percent-encoded values from `path_params`.
pub fn generate_url(
    base_url: &str,
    template: &str,
    path_params: &[(&str, String)],
) -> crate::Result<String> {
    let joined = join_base_path(base_url, "");
    let mut url = url::Url::parse(&joined).map_err(|_| Error::InvalidUri {
        uri: joined.clone(),
    })?;

    let mut resolved_segments = Vec::new();
    for segment in template.split('/').filter(|segment| !segment.is_empty()) {
        resolved_segments.push(resolve_segment(template, segment, path_params)?);
    }

    {
        let Ok(mut segments) = url.path_segments_mut() else {
            return Err(Error::InvalidUri { uri: joined });
        };
        segments.pop_if_empty();
        segments.extend(resolved_segments.iter().map(String::as_str));
        if template.ends_with('/') && !resolved_segments.is_empty() {
            segments.push("");
        }
    }

    Ok(url.to_string())
}

fn resolve_segment(
    template: &str,
    segment: &str,
    path_params: &[(&str, String)],
) -> crate::Result<String> {
    let mut resolved = String::with_capacity(segment.len());
    let mut substituted = None;
    let mut rest = segment;
    while let Some(open) = rest.find(['{', '}']) {
        if rest.as_bytes()[open] == b'}' {
            return Err(Error::InvalidPathTemplate {
                template: template.to_owned(),
                message: "unmatched '}'".to_owned(),
            });
        }
        resolved.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            return Err(Error::InvalidPathTemplate {
                template: template.to_owned(),
                message: "unclosed '{'".to_owned(),
            });
        };
        let name = &after_open[..close];
        if name.is_empty() || name.contains('{') {
            return Err(Error::InvalidPathTemplate {
                template: template.to_owned(),
                message: format!("invalid placeholder {{{name}}}"),
            });
        }
        let Some((_, value)) = path_params.iter().find(|(param, _)| *param == name) else {
            return Err(Error::PathParam {
                name: name.to_owned(),
                template: template.to_owned(),
            });
        };
        resolved.push_str(value);
        substituted = Some(name);
        rest = &after_open[close + 1..];
    }
    resolved.push_str(rest);

    // `url` drops dot segments instead of encoding them.
    match substituted {
        Some(name) if matches!(resolved.as_str(), "." | "..") => Err(Error::PathParam {
            name: name.to_owned(),
            template: template.to_owned(),
        }),
        _ => Ok(resolved),
    }
}

/// Appends query parameters, encoding arrays per their declared style.
pub fn append_query(url_text: &str, params: &[QueryParam]) -> crate::Result<String> {
    if params.is_empty() {
        return Ok(url_text.to_owned());
    }

    let mut url = url::Url::parse(url_text).map_err(|_| Error::InvalidUri {
        uri: url_text.to_owned(),
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        for param in params {
            match (&param.value, param.style, param.explode) {
                (ParamValue::List(values), QueryStyle::Form, true) => {
                    for value in values {
                        pairs.append_pair(param.name, value);
                    }
                }
                (value, QueryStyle::Form, _) => {
                    pairs.append_pair(param.name, &value.join(","));
                }
                (value, QueryStyle::PipeDelimited, _) => {
                    pairs.append_pair(param.name, &value.join("|"));
                }
                (value, QueryStyle::SpaceDelimited, _) => {
                    pairs.append_pair(param.name, &value.join(" "));
                }
            }
        }
    }
    Ok(url.to_string())
}

/// Serializes an optional payload. A missing payload, or one that serializes
/// to JSON `null`, produces no body.
pub fn serialize_body<T>(payload: Option<&T>, media_type: MediaType) -> crate::Result<Option<RequestBody>>
where
    T: Serialize + ?Sized,
{
    let Some(payload) = payload else {
        return Ok(None);
    };

    let bytes = match media_type {
        MediaType::Json => {
            let encoded =
                serde_json::to_vec(payload).map_err(|source| Error::SerializeJson { source })?;
            if encoded == b"null" {
                return Ok(None);
            }
            encoded
        }
        MediaType::Form => serde_urlencoded::to_string(payload)
            .map_err(|source| Error::SerializeForm { source })?
            .into_bytes(),
    };

    Ok(Some(RequestBody::new(bytes, media_type.content_type())))
}

#[cfg(test)]
mod tests {
    use http::Method;
    use http::header::CONTENT_TYPE;
    use serde::Serialize;

    use super::{
        MediaType, ParamValue, QueryParam, QueryStyle, RequestBody, RequestDescriptor,
        append_query, generate_url, serialize_body,
    };
    use crate::error::ErrorCode;

    #[derive(Serialize)]
    struct Pin {
        #[serde(skip_serializing_if = "Option::is_none")]
        pin: Option<String>,
    }

    #[test]
    fn path_template_substitutes_placeholders() {
        let url = generate_url(
            "https://plex.tv/api/v2",
            "/home/users/{id}/switch",
            &[("id", "7".to_owned())],
        )
        .expect("url should build");

        assert_eq!(url, "https://plex.tv/api/v2/home/users/7/switch");
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let url = generate_url(
            "https://plex.tv/api/v2/",
            "/home/users/{id}",
            &[("id", "a b/c".to_owned())],
        )
        .expect("url should build");

        assert_eq!(url, "https://plex.tv/api/v2/home/users/a%20b%2Fc");
    }

    #[test]
    fn dot_segment_values_are_rejected() {
        for value in [".", ".."] {
            let error = generate_url(
                "https://plex.tv/api/v2",
                "/home/users/{id}/switch",
                &[("id", value.to_owned())],
            )
            .expect_err("dot segment must not rewrite the path");
            assert_eq!(error.code(), ErrorCode::PathParam);
        }

        let url = generate_url(
            "https://plex.tv/api/v2",
            "/home/users/{id}/switch",
            &[("id", "...".to_owned())],
        )
        .expect("three dots are an ordinary segment");
        assert_eq!(url, "https://plex.tv/api/v2/home/users/.../switch");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let error = generate_url("https://plex.tv/api/v2", "/home/users/{id}/switch", &[])
            .expect_err("missing id must fail");
        assert_eq!(error.code(), ErrorCode::PathParam);
    }

    #[test]
    fn unclosed_placeholder_is_a_template_error() {
        let error = generate_url(
            "https://plex.tv/api/v2",
            "/home/users/{id",
            &[("id", "7".to_owned())],
        )
        .expect_err("unclosed brace must fail");
        assert_eq!(error.code(), ErrorCode::InvalidPathTemplate);
    }

    #[test]
    fn same_inputs_build_the_same_url() {
        let params = [("id", "42".to_owned())];
        let first = generate_url("https://plex.tv/api/v2", "/home/users/{id}", &params);
        let second = generate_url("https://plex.tv/api/v2", "/home/users/{id}", &params);
        assert_eq!(first.expect("first"), second.expect("second"));
    }

    #[test]
    fn query_arrays_follow_declared_style() {
        let url = append_query(
            "https://plex.tv/api/v2/home/users",
            &[
                QueryParam::form("tag", ParamValue::List(vec!["a".into(), "b".into()])),
                QueryParam::form("type", ParamValue::List(vec!["1".into(), "2".into()]))
                    .with_style(QueryStyle::Form, false),
                QueryParam::form("ids", ParamValue::List(vec!["3".into(), "4".into()]))
                    .with_style(QueryStyle::PipeDelimited, false),
            ],
        )
        .expect("query should append");

        assert_eq!(
            url,
            "https://plex.tv/api/v2/home/users?tag=a&tag=b&type=1%2C2&ids=3%7C4"
        );
    }

    #[test]
    fn json_body_carries_content_type() {
        let body = serialize_body(
            Some(&Pin {
                pin: Some("1234".to_owned()),
            }),
            MediaType::Json,
        )
        .expect("serialize")
        .expect("body");

        assert_eq!(body.bytes().as_ref(), br#"{"pin":"1234"}"#);
        assert_eq!(body.content_type(), "application/json");
    }

    #[test]
    fn absent_payload_has_no_body() {
        assert!(
            serialize_body::<Pin>(None, MediaType::Json)
                .expect("serialize")
                .is_none()
        );
        assert!(
            serialize_body(Some(&Option::<Pin>::None), MediaType::Json)
                .expect("serialize")
                .is_none()
        );
    }

    #[test]
    fn http_request_gets_body_content_type() {
        let mut descriptor = RequestDescriptor::new(Method::POST, "https://plex.tv/api/v2/x");
        descriptor.set_body(Some(RequestBody::new("{}", "application/json")));

        let request = descriptor.to_http_request().expect("request builds");
        assert_eq!(
            request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );
        assert_eq!(request.body().as_ref(), b"{}");
    }
}
