use std::sync::Arc;
use std::time::{Duration, SystemTime};

use http::Method;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{Instrument, debug, info_span, warn};

use crate::error::{CancelReason, Error, TransportErrorKind};
use crate::headers::apply_overrides;
use crate::hooks::{
    AfterErrorContext, AfterSuccessContext, BeforeRequestContext, HookContext, HookError, Hooks,
};
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use crate::retry::RetryPolicy;
use crate::security::populate_security;
use crate::transport::Transport;
use crate::util::{parse_retry_after, redact_uri_for_logs};

/// Result of one attempt, before the retry decision. Failures are
/// classified where they happen, so the retry decision never depends on how
/// an after-error hook rewrote the error.
enum AttemptOutcome {
    Response(RawResponse),
    /// The transport failed. `error` has been through the after-error hooks;
    /// `kind` is what the transport reported.
    TransportFailed {
        kind: TransportErrorKind,
        error: Error,
    },
    /// A before-request hook failed with a retryable error. After-error hooks
    /// do not see it.
    HookFailed(Error),
}

/// Runs one logical call: security injection, hooks, transport send, and the
/// retry loop, all inside the call's cancellation scope.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    hooks: Arc<Hooks>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Executor")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, hooks: Arc<Hooks>) -> Self {
        Self { transport, hooks }
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Sends `request`, retrying per `retry_policy` when one is given.
    ///
    /// Returns the last response received whatever its status; decoding the
    /// status is left to the caller. Cancellation of the context token or
    /// expiry of its deadline aborts any in-flight send or backoff wait.
    pub async fn execute(
        &self,
        context: &HookContext,
        request: RequestDescriptor,
        retry_policy: Option<&RetryPolicy>,
    ) -> crate::Result<RawResponse> {
        let method = request.method().clone();
        let redacted_uri = redact_uri_for_logs(request.url());
        let cancelled = |reason| Error::Cancelled {
            reason,
            method: method.clone(),
            uri: redacted_uri.clone(),
        };

        let attempts = async {
            let response = match retry_policy {
                Some(policy) => self.send_with_retry(context, request, policy).await?,
                None => self.send_once(context, request).await?,
            };
            self.hooks
                .after_success(&AfterSuccessContext { hook: context }, response)
                .map_err(|error| error.into_error(context.operation_id()))
        };

        if context.cancellation().is_cancelled() {
            return Err(cancelled(CancelReason::Token));
        }
        match context.deadline() {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = context.cancellation().cancelled() => Err(cancelled(CancelReason::Token)),
                    _ = sleep_until(deadline) => Err(cancelled(CancelReason::Deadline)),
                    result = attempts => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = context.cancellation().cancelled() => Err(cancelled(CancelReason::Token)),
                    result = attempts => result,
                }
            }
        }
    }

    async fn send_once(
        &self,
        context: &HookContext,
        request: RequestDescriptor,
    ) -> crate::Result<RawResponse> {
        let span = info_span!(
            "plexapi.request",
            operation = context.operation_id(),
            method = %request.method(),
            uri = %redact_uri_for_logs(request.url()),
            attempt = 1_usize,
            max_attempts = 1_usize
        );
        async {
            let mut request = request;
            authorize(context, &mut request)?;
            let request = self
                .prepare_attempt(context, request, 1)
                .map_err(|error| error.into_error(context.operation_id()))?;
            finish(self.attempt(context, &request, 1).await?)
        }
        .instrument(span)
        .await
    }

    async fn send_with_retry(
        &self,
        context: &HookContext,
        mut request: RequestDescriptor,
        policy: &RetryPolicy,
    ) -> crate::Result<RawResponse> {
        let max_attempts = policy.configured_max_attempts();
        let max_elapsed_time = policy.configured_max_elapsed_time();
        let started_at = Instant::now();
        let mut attempt = 0_usize;

        loop {
            attempt += 1;
            let span = info_span!(
                "plexapi.request",
                operation = context.operation_id(),
                method = %request.method(),
                uri = %redact_uri_for_logs(request.url()),
                attempt = attempt,
                max_attempts = max_attempts
            );

            let (revision, outcome) = self
                .run_attempt(context, request, attempt, policy)
                .instrument(span.clone())
                .await?;
            request = revision;

            let retry_delay = match &outcome {
                AttemptOutcome::Response(response)
                    if policy.is_retryable_status(response.status()) =>
                {
                    let fallback = policy.backoff_for_retry(attempt);
                    Some(
                        parse_retry_after(response.headers(), SystemTime::now())
                            .map(|delay| delay.min(policy.configured_max_interval()))
                            .unwrap_or(fallback),
                    )
                }
                AttemptOutcome::Response(_) => None,
                AttemptOutcome::TransportFailed { .. } | AttemptOutcome::HookFailed(_) => {
                    Some(policy.backoff_for_retry(attempt))
                }
            };
            let Some(retry_delay) = retry_delay else {
                return finish(outcome);
            };

            let elapsed = started_at.elapsed();
            if attempt >= max_attempts || elapsed >= max_elapsed_time {
                span.in_scope(|| debug!(attempt, "retries exhausted"));
                return finish(outcome);
            }
            if elapsed.saturating_add(retry_delay) >= max_elapsed_time {
                return Err(Error::Cancelled {
                    reason: CancelReason::MaxElapsedTime,
                    method: request.method().clone(),
                    uri: redact_uri_for_logs(request.url()),
                });
            }

            span.in_scope(|| match &outcome {
                AttemptOutcome::Response(response) => warn!(
                    status = response.status().as_u16(),
                    delay_ms = retry_delay.as_millis() as u64,
                    "retrying request after retryable status"
                ),
                AttemptOutcome::TransportFailed { error, .. }
                | AttemptOutcome::HookFailed(error) => warn!(
                    delay_ms = retry_delay.as_millis() as u64,
                    error = %error,
                    "retrying request after failed attempt"
                ),
            });
            if !retry_delay.is_zero() {
                sleep(retry_delay).await;
            }
        }
    }

    /// One retry-loop attempt. Returns the descriptor revision to carry into
    /// the next attempt alongside the outcome; permanent failures end the call.
    async fn run_attempt(
        &self,
        context: &HookContext,
        request: RequestDescriptor,
        attempt: usize,
        policy: &RetryPolicy,
    ) -> crate::Result<(RequestDescriptor, AttemptOutcome)> {
        let mut request = request;
        authorize(context, &mut request)?;
        let fallback = request.clone();
        let request = match self.prepare_attempt(context, request, attempt) {
            Ok(request) => request,
            Err(HookError::Retryable(source)) => {
                let error = HookError::Retryable(source).into_error(context.operation_id());
                return Ok((fallback, AttemptOutcome::HookFailed(error)));
            }
            Err(error) => return Err(error.into_error(context.operation_id())),
        };

        match self.attempt(context, &request, attempt).await? {
            AttemptOutcome::TransportFailed { kind, error }
                if kind == TransportErrorKind::BodyTooLarge
                    || !policy.retries_connection_errors() =>
            {
                Err(error)
            }
            outcome => Ok((request, outcome)),
        }
    }

    fn prepare_attempt(
        &self,
        context: &HookContext,
        request: RequestDescriptor,
        attempt: usize,
    ) -> Result<RequestDescriptor, HookError> {
        self.hooks.before_request(
            &BeforeRequestContext {
                hook: context,
                attempt,
            },
            request,
        )
    }

    async fn attempt(
        &self,
        context: &HookContext,
        request: &RequestDescriptor,
        attempt: usize,
    ) -> crate::Result<AttemptOutcome> {
        let http_request = request.to_http_request()?;
        let started = Instant::now();
        debug!("sending request");

        match self.transport.send(http_request).await {
            Ok(response) => {
                debug!(
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                Ok(AttemptOutcome::Response(response))
            }
            Err(source) => {
                let kind = source.kind();
                let error = transport_error(request.method(), request.url(), source);
                let error = self.hooks.after_error(
                    &AfterErrorContext {
                        hook: context,
                        attempt,
                    },
                    None,
                    error,
                );
                Ok(AttemptOutcome::TransportFailed { kind, error })
            }
        }
    }
}

fn finish(outcome: AttemptOutcome) -> crate::Result<RawResponse> {
    match outcome {
        AttemptOutcome::Response(response) => Ok(response),
        AttemptOutcome::TransportFailed { error, .. } | AttemptOutcome::HookFailed(error) => {
            Err(error)
        }
    }
}

/// Writes the credentials for this attempt, then the caller's own headers so
/// an explicit `set_header` wins over the injected token.
fn authorize(context: &HookContext, request: &mut RequestDescriptor) -> crate::Result<()> {
    populate_security(request, context.security_source())?;
    apply_overrides(request.headers_mut(), context.header_overrides());
    Ok(())
}

fn transport_error(
    method: &Method,
    url: &str,
    source: crate::error::TransportError,
) -> Error {
    Error::Transport {
        kind: source.kind(),
        method: method.clone(),
        uri: redact_uri_for_logs(url),
        source: source.into_source(),
    }
}

/// Resolves the effective deadline: a per-call timeout wins over the
/// SDK-wide default.
pub(crate) fn effective_deadline(
    call_timeout: Option<Duration>,
    default_timeout: Option<Duration>,
) -> Option<Instant> {
    call_timeout
        .or(default_timeout)
        .map(|timeout| Instant::now() + timeout)
}
