//! Ordered extension points around each call.
//!
//! Hooks are registered on [`Hooks`] before the SDK is built and run
//! synchronously in registration order; each hook receives the previous
//! hook's output.

use std::sync::Arc;

use http::HeaderMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, Error};
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use crate::security::SecuritySource;
use crate::transport::Transport;

/// Per-call context shared read-only by every hook of that call.
#[derive(Clone)]
pub struct HookContext {
    base_url: String,
    operation_id: &'static str,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    security_source: Option<Arc<dyn SecuritySource>>,
    header_overrides: HeaderMap,
}

impl HookContext {
    pub fn new(
        base_url: impl Into<String>,
        operation_id: &'static str,
        cancellation: CancellationToken,
        deadline: Option<Instant>,
        security_source: Option<Arc<dyn SecuritySource>>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            operation_id,
            cancellation,
            deadline,
            security_source,
            header_overrides: HeaderMap::new(),
        }
    }

    /// Caller headers re-applied on every attempt after credentials.
    pub(crate) fn with_header_overrides(mut self, header_overrides: HeaderMap) -> Self {
        self.header_overrides = header_overrides;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn operation_id(&self) -> &'static str {
        self.operation_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn security_source(&self) -> Option<&Arc<dyn SecuritySource>> {
        self.security_source.as_ref()
    }

    pub fn header_overrides(&self) -> &HeaderMap {
        &self.header_overrides
    }
}

impl std::fmt::Debug for HookContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HookContext")
            .field("base_url", &self.base_url)
            .field("operation_id", &self.operation_id)
            .field("deadline", &self.deadline)
            .field("has_security_source", &self.security_source.is_some())
            .field("header_overrides", &self.header_overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BeforeRequestContext<'a> {
    pub hook: &'a HookContext,
    pub attempt: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct AfterSuccessContext<'a> {
    pub hook: &'a HookContext,
}

#[derive(Clone, Copy, Debug)]
pub struct AfterErrorContext<'a> {
    pub hook: &'a HookContext,
    pub attempt: usize,
}

/// Failure raised by a hook, classified by the hook itself.
#[derive(Debug)]
pub enum HookError {
    /// Stops the call immediately; no further attempts are made.
    Permanent(BoxError),
    /// Counts as a failed attempt and may be retried.
    Retryable(BoxError),
}

impl HookError {
    pub fn permanent(source: impl Into<BoxError>) -> Self {
        Self::Permanent(source.into())
    }

    pub fn retryable(source: impl Into<BoxError>) -> Self {
        Self::Retryable(source.into())
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub(crate) fn into_error(self, operation_id: &str) -> Error {
        let (permanent, source) = match self {
            Self::Permanent(source) => (true, source),
            Self::Retryable(source) => (false, source),
        };
        Error::Hook {
            operation_id: operation_id.to_owned(),
            permanent,
            source,
        }
    }
}

pub trait SdkInitHook: Send + Sync {
    fn sdk_init(
        &self,
        base_url: String,
        transport: Arc<dyn Transport>,
    ) -> (String, Arc<dyn Transport>);
}

pub trait BeforeRequestHook: Send + Sync {
    fn before_request(
        &self,
        context: &BeforeRequestContext<'_>,
        request: RequestDescriptor,
    ) -> Result<RequestDescriptor, HookError>;
}

pub trait AfterSuccessHook: Send + Sync {
    fn after_success(
        &self,
        context: &AfterSuccessContext<'_>,
        response: RawResponse,
    ) -> Result<RawResponse, HookError>;
}

/// Observes, and may rewrite, the error of an attempt that produced no usable
/// response. It cannot change whether the call retries.
pub trait AfterErrorHook: Send + Sync {
    fn after_error(
        &self,
        context: &AfterErrorContext<'_>,
        response: Option<&RawResponse>,
        error: Error,
    ) -> Error;
}

#[derive(Clone, Default)]
pub struct Hooks {
    sdk_init: Vec<Arc<dyn SdkInitHook>>,
    before_request: Vec<Arc<dyn BeforeRequestHook>>,
    after_success: Vec<Arc<dyn AfterSuccessHook>>,
    after_error: Vec<Arc<dyn AfterErrorHook>>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Hooks")
            .field("sdk_init", &self.sdk_init.len())
            .field("before_request", &self.before_request.len())
            .field("after_success", &self.after_success.len())
            .field("after_error", &self.after_error.len())
            .finish()
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sdk_init_hook(&mut self, hook: Arc<dyn SdkInitHook>) -> &mut Self {
        self.sdk_init.push(hook);
        self
    }

    pub fn register_before_request_hook(
        &mut self,
        hook: Arc<dyn BeforeRequestHook>,
    ) -> &mut Self {
        self.before_request.push(hook);
        self
    }

    pub fn register_after_success_hook(&mut self, hook: Arc<dyn AfterSuccessHook>) -> &mut Self {
        self.after_success.push(hook);
        self
    }

    pub fn register_after_error_hook(&mut self, hook: Arc<dyn AfterErrorHook>) -> &mut Self {
        self.after_error.push(hook);
        self
    }

    pub(crate) fn sdk_init(
        &self,
        base_url: String,
        transport: Arc<dyn Transport>,
    ) -> (String, Arc<dyn Transport>) {
        self.sdk_init
            .iter()
            .fold((base_url, transport), |(base_url, transport), hook| {
                hook.sdk_init(base_url, transport)
            })
    }

    pub(crate) fn before_request(
        &self,
        context: &BeforeRequestContext<'_>,
        mut request: RequestDescriptor,
    ) -> Result<RequestDescriptor, HookError> {
        for hook in &self.before_request {
            request = hook.before_request(context, request)?;
        }
        Ok(request)
    }

    pub(crate) fn after_success(
        &self,
        context: &AfterSuccessContext<'_>,
        mut response: RawResponse,
    ) -> Result<RawResponse, HookError> {
        for hook in &self.after_success {
            response = hook.after_success(context, response)?;
        }
        Ok(response)
    }

    pub(crate) fn after_error(
        &self,
        context: &AfterErrorContext<'_>,
        response: Option<&RawResponse>,
        mut error: Error,
    ) -> Error {
        for hook in &self.after_error {
            error = hook.after_error(context, response, error);
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::Method;
    use tokio_util::sync::CancellationToken;

    use super::{BeforeRequestContext, BeforeRequestHook, HookContext, HookError, Hooks};
    use crate::request::RequestDescriptor;

    struct AppendHeader {
        value: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl BeforeRequestHook for AppendHeader {
        fn before_request(
            &self,
            _context: &BeforeRequestContext<'_>,
            mut request: RequestDescriptor,
        ) -> Result<RequestDescriptor, HookError> {
            let previous = request
                .headers()
                .get("x-trace")
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            self.seen
                .lock()
                .map_err(|_| HookError::permanent("poisoned"))?
                .push(previous.clone());
            let next = format!("{previous}{}", self.value);
            request
                .try_set_header("x-trace", &next)
                .map_err(HookError::permanent)?;
            Ok(request)
        }
    }

    #[test]
    fn before_request_hooks_compose_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = Hooks::new();
        hooks
            .register_before_request_hook(Arc::new(AppendHeader {
                value: "a",
                seen: Arc::clone(&seen),
            }))
            .register_before_request_hook(Arc::new(AppendHeader {
                value: "b",
                seen: Arc::clone(&seen),
            }));
        let hook_context = HookContext::new(
            "https://plex.tv/api/v2",
            "get-home-users",
            CancellationToken::new(),
            None,
            None,
        );

        let request = hooks
            .before_request(
                &BeforeRequestContext {
                    hook: &hook_context,
                    attempt: 1,
                },
                RequestDescriptor::new(Method::GET, "https://plex.tv/api/v2/home/users"),
            )
            .expect("hooks succeed");

        assert_eq!(
            request
                .headers()
                .get("x-trace")
                .and_then(|value| value.to_str().ok()),
            Some("ab")
        );
        let seen = seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![String::new(), "a".to_owned()]);
    }
}
