use std::collections::BTreeMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::retry::RetryPolicy;

/// Per-call overrides. Anything left unset falls back to the SDK configuration.
#[derive(Clone, Debug, Default)]
pub struct Options {
    server_url: Option<String>,
    timeout: Option<Duration>,
    retries: Option<RetryPolicy>,
    set_headers: BTreeMap<String, String>,
    cancellation: Option<CancellationToken>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.max(Duration::from_millis(1)));
        self
    }

    pub fn retries(mut self, retries: RetryPolicy) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Adds a header written after every other header, replacing any value
    /// the SDK would otherwise send under that name.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_headers.insert(name.into(), value.into());
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn server_url_override(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    pub(crate) fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn retries_override(&self) -> Option<&RetryPolicy> {
        self.retries.as_ref()
    }

    pub(crate) fn headers(&self) -> &BTreeMap<String, String> {
        &self.set_headers
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone().unwrap_or_default()
    }

    fn requested(&self) -> impl Iterator<Item = SupportedOption> + '_ {
        [
            (self.server_url.is_some(), SupportedOption::ServerUrl),
            (self.timeout.is_some(), SupportedOption::Timeout),
            (self.retries.is_some(), SupportedOption::Retries),
        ]
        .into_iter()
        .filter_map(|(set, option)| set.then_some(option))
    }

    /// Rejects any option the operation does not accept.
    pub(crate) fn ensure_supported(
        &self,
        supported: &[SupportedOption],
        operation_id: &'static str,
    ) -> crate::Result<()> {
        match self.requested().find(|option| !supported.contains(option)) {
            Some(option) => Err(Error::UnsupportedOption {
                option: option.as_str(),
                operation_id,
            }),
            None => Ok(()),
        }
    }
}

/// Options an operation may declare it honours. Extra headers and the
/// cancellation token are accepted by every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportedOption {
    ServerUrl,
    Timeout,
    Retries,
}

impl SupportedOption {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerUrl => "server_url",
            Self::Timeout => "timeout",
            Self::Retries => "retries",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Options, SupportedOption};
    use crate::error::{Error, ErrorCode};
    use crate::retry::RetryPolicy;

    #[test]
    fn unset_options_are_always_accepted() {
        Options::new()
            .set_header("x-request-id", "1")
            .ensure_supported(&[], "switch-user")
            .expect("headers need no declaration");
    }

    #[test]
    fn undeclared_option_is_rejected_by_name() {
        let options = Options::new()
            .timeout(Duration::from_secs(1))
            .retries(RetryPolicy::backoff());

        let error = options
            .ensure_supported(
                &[SupportedOption::ServerUrl, SupportedOption::Timeout],
                "switch-user",
            )
            .expect_err("retries are not declared");

        assert_eq!(error.code(), ErrorCode::UnsupportedOption);
        match error {
            Error::UnsupportedOption {
                option,
                operation_id,
            } => {
                assert_eq!(option, "retries");
                assert_eq!(operation_id, "switch-user");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn timeout_is_clamped_to_one_millisecond() {
        let options = Options::new().timeout(Duration::ZERO);
        assert_eq!(options.timeout_override(), Some(Duration::from_millis(1)));
    }
}
