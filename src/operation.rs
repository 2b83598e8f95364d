use http::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::PlexApi;
use crate::executor::effective_deadline;
use crate::headers::{HeaderPopulator, parse_overrides};
use crate::hooks::HookContext;
use crate::options::{Options, SupportedOption};
use crate::request::{OperationParams, RequestDescriptor, append_query, generate_url};
use crate::response::{BodyFormat, OperationResponse, decode_response};
use crate::retry::RetryPolicy;

/// Static description of one API operation. Every endpoint method is an
/// `OperationSpec` plus its parameter and response types.
#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub id: &'static str,
    pub method: Method,
    /// Path template appended to the server URL, with `{name}` placeholders.
    pub path: &'static str,
    pub success_statuses: &'static [u16],
    pub response_format: BodyFormat,
    /// Status codes retried when the policy in effect names none. `None`
    /// means the operation is never retried.
    pub retry_status_codes: Option<&'static [&'static str]>,
    pub supported_options: &'static [SupportedOption],
}

impl OperationSpec {
    fn accept(&self) -> &'static str {
        match self.response_format {
            BodyFormat::Json => "application/json",
            BodyFormat::Xml => "application/xml",
        }
    }

    /// Per-call policy first, then the SDK default.
    fn retry_policy(&self, options: &Options, default: Option<&RetryPolicy>) -> Option<RetryPolicy> {
        let codes = self.retry_status_codes?;
        options
            .retries_override()
            .or(default)
            .cloned()
            .map(|policy| policy.with_default_status_codes(codes))
    }
}

impl PlexApi {
    pub(crate) async fn invoke<P, T>(
        &self,
        operation: &OperationSpec,
        params: &P,
        options: Options,
    ) -> crate::Result<OperationResponse<T>>
    where
        P: OperationParams + ?Sized,
        T: DeserializeOwned + Default,
    {
        options.ensure_supported(operation.supported_options, operation.id)?;
        let configuration = self.configuration();

        let base_url = options
            .server_url_override()
            .unwrap_or(configuration.server_url());
        let url = generate_url(base_url, operation.path, &params.path_params())?;
        let url = append_query(&url, &params.query_params())?;

        let mut request = RequestDescriptor::new(operation.method.clone(), url);
        request.set_body(params.request_body()?);
        let overrides = parse_overrides(options.headers())?;
        HeaderPopulator {
            accept: operation.accept(),
            user_agent: configuration.user_agent(),
            globals: configuration.globals(),
            operation_params: params.header_params(),
            overrides: &overrides,
        }
        .apply(&mut request)?;

        let context = HookContext::new(
            base_url,
            operation.id,
            options.cancellation_token(),
            effective_deadline(options.timeout_override(), configuration.timeout()),
            configuration.security_source.clone(),
        )
        .with_header_overrides(overrides);
        let retry_policy = operation.retry_policy(&options, configuration.retry_policy());
        debug!(
            operation = operation.id,
            retries = retry_policy.is_some(),
            "invoking operation"
        );

        let response = configuration
            .executor
            .execute(&context, request, retry_policy.as_ref())
            .await?;
        decode_response(response, operation.success_statuses, operation.response_format)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::OperationSpec;
    use crate::options::{Options, SupportedOption};
    use crate::response::BodyFormat;
    use crate::retry::RetryPolicy;

    const RETRIED: OperationSpec = OperationSpec {
        id: "retried",
        method: Method::GET,
        path: "/things",
        success_statuses: &[200],
        response_format: BodyFormat::Json,
        retry_status_codes: Some(&["503"]),
        supported_options: &[SupportedOption::Retries],
    };

    #[test]
    fn call_policy_wins_over_default_and_gains_operation_codes() {
        let default = RetryPolicy::backoff().max_attempts(2);
        let options = Options::new().retries(RetryPolicy::backoff().max_attempts(5));

        let policy = RETRIED
            .retry_policy(&options, Some(&default))
            .expect("policy in effect");

        assert_eq!(policy.configured_max_attempts(), 5);
        assert!(policy.configured_status_codes().contains("503"));
    }

    #[test]
    fn no_policy_anywhere_means_no_retries() {
        assert!(RETRIED.retry_policy(&Options::new(), None).is_none());
    }

    #[test]
    fn operation_without_retry_codes_ignores_default_policy() {
        let never = OperationSpec {
            retry_status_codes: None,
            ..RETRIED
        };
        assert!(
            never
                .retry_policy(&Options::new(), Some(&RetryPolicy::backoff()))
                .is_none()
        );
    }
}
