use std::sync::Arc;

use crate::error::{BoxError, Error};
use crate::request::RequestDescriptor;
use crate::util::parse_header_value;

pub const PLEX_TOKEN_HEADER: &str = "X-Plex-Token";

/// Credentials attached to outgoing requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Security {
    pub api_key: Option<String>,
}

impl Security {
    pub fn api_key(token: impl Into<String>) -> Self {
        Self {
            api_key: Some(token.into()),
        }
    }
}

impl std::fmt::Debug for Security {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Security")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Yields the credentials to use for the next attempt.
pub trait SecuritySource: Send + Sync {
    fn security(&self) -> Result<Security, BoxError>;
}

impl SecuritySource for Security {
    fn security(&self) -> Result<Security, BoxError> {
        Ok(self.clone())
    }
}

/// Adapts a closure, for tokens that rotate between calls.
pub struct SecurityFn<F>(pub F);

impl<F> SecuritySource for SecurityFn<F>
where
    F: Fn() -> Result<Security, BoxError> + Send + Sync,
{
    fn security(&self) -> Result<Security, BoxError> {
        (self.0)()
    }
}

pub(crate) fn populate_security(
    descriptor: &mut RequestDescriptor,
    source: Option<&Arc<dyn SecuritySource>>,
) -> crate::Result<()> {
    let Some(source) = source else {
        return Ok(());
    };
    let security = source
        .security()
        .map_err(|source| Error::Security { source })?;
    if let Some(token) = security.api_key.as_deref() {
        let mut value = parse_header_value(PLEX_TOKEN_HEADER, token)?;
        value.set_sensitive(true);
        descriptor
            .headers_mut()
            .insert(http::HeaderName::from_static("x-plex-token"), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::Method;

    use super::{Security, SecurityFn, SecuritySource, populate_security};
    use crate::error::{BoxError, ErrorCode};
    use crate::request::RequestDescriptor;

    #[test]
    fn api_key_is_written_as_sensitive_plex_token() {
        let source: Arc<dyn SecuritySource> = Arc::new(Security::api_key("secret"));
        let mut descriptor = RequestDescriptor::new(Method::GET, "https://plex.tv/api/v2");

        populate_security(&mut descriptor, Some(&source)).expect("security applies");

        let value = descriptor
            .headers()
            .get("x-plex-token")
            .expect("token header");
        assert_eq!(value.to_str().ok(), Some("secret"));
        assert!(value.is_sensitive());
    }

    #[test]
    fn failing_source_is_a_security_error() {
        let source: Arc<dyn SecuritySource> =
            Arc::new(SecurityFn(|| -> Result<Security, BoxError> {
                Err("token store offline".into())
            }));
        let mut descriptor = RequestDescriptor::new(Method::GET, "https://plex.tv/api/v2");

        let error = populate_security(&mut descriptor, Some(&source))
            .expect_err("source failure must surface");
        assert_eq!(error.code(), ErrorCode::Security);
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", Security::api_key("secret"));
        assert!(!rendered.contains("secret"));
    }
}
