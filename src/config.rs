use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::client::PlexApi;
use crate::error::Error;
use crate::executor::Executor;
use crate::headers::Globals;
use crate::hooks::Hooks;
use crate::retry::RetryPolicy;
use crate::security::{Security, SecuritySource};
use crate::transport::{HyperTransport, Transport};
use crate::util::{redact_uri_for_logs, replace_parameters, validate_base_url};

/// The hosted Plex account service.
pub const SERVER_PLEX_TV: usize = 0;
/// A Plex Media Server addressed through the `protocol`, `ip` and `port`
/// variables.
pub const SERVER_MEDIA_SERVER: usize = 1;

pub const SERVERS: &[&str] = &["https://plex.tv/api/v2", "{protocol}://{ip}:{port}"];

const DEFAULT_SERVER_VARIABLES: &[(usize, &str, &str)] = &[
    (SERVER_MEDIA_SERVER, "protocol", "https"),
    (SERVER_MEDIA_SERVER, "ip", "10.10.10.47"),
    (SERVER_MEDIA_SERVER, "port", "32400"),
];

pub const DEFAULT_USER_AGENT: &str = concat!("plexapi-rust/", env!("CARGO_PKG_VERSION"));

/// Read-only state shared by every call made through one [`PlexApi`].
#[derive(Clone)]
pub struct SdkConfiguration {
    pub(crate) server_url: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retry_policy: Option<RetryPolicy>,
    pub(crate) user_agent: String,
    pub(crate) globals: Globals,
    pub(crate) security_source: Option<Arc<dyn SecuritySource>>,
    pub(crate) executor: Executor,
}

impl SdkConfiguration {
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }
}

impl std::fmt::Debug for SdkConfiguration {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SdkConfiguration")
            .field("server_url", &redact_uri_for_logs(&self.server_url))
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("user_agent", &self.user_agent)
            .field("globals", &self.globals)
            .field("has_security_source", &self.security_source.is_some())
            .field("executor", &self.executor)
            .finish()
    }
}

pub struct PlexApiBuilder {
    server_url: Option<String>,
    server_index: usize,
    server_variables: BTreeMap<String, String>,
    timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    user_agent: String,
    globals: Globals,
    security_source: Option<Arc<dyn SecuritySource>>,
    transport: Option<Arc<dyn Transport>>,
    hooks: Hooks,
}

impl Default for PlexApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlexApiBuilder {
    pub fn new() -> Self {
        Self {
            server_url: None,
            server_index: SERVER_PLEX_TV,
            server_variables: BTreeMap::new(),
            timeout: None,
            retry_policy: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            globals: Globals::default(),
            security_source: None,
            transport: None,
            hooks: Hooks::new(),
        }
    }

    /// Uses `server_url` verbatim, ignoring the server list.
    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn server_index(mut self, server_index: usize) -> Self {
        self.server_index = server_index;
        self
    }

    /// Sets a `{name}` variable of the selected server template.
    pub fn server_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_variables.insert(name.into(), value.into());
        self
    }

    /// Default deadline for a whole call, retries and backoff included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.max(Duration::from_millis(1)));
        self
    }

    /// Default retry policy. Without one, calls make a single attempt unless
    /// the call supplies its own policy.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    pub fn accepts(mut self, accepts: impl Into<String>) -> Self {
        self.globals.accepts = Some(accepts.into());
        self
    }

    pub fn client_identifier(mut self, client_identifier: impl Into<String>) -> Self {
        self.globals.client_identifier = Some(client_identifier.into());
        self
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.globals.product = Some(product.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.globals.version = Some(version.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.globals.platform = Some(platform.into());
        self
    }

    pub fn platform_version(mut self, platform_version: impl Into<String>) -> Self {
        self.globals.platform_version = Some(platform_version.into());
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.globals.device = Some(device.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.globals.model = Some(model.into());
        self
    }

    pub fn device_vendor(mut self, device_vendor: impl Into<String>) -> Self {
        self.globals.device_vendor = Some(device_vendor.into());
        self
    }

    pub fn device_name(mut self, device_name: impl Into<String>) -> Self {
        self.globals.device_name = Some(device_name.into());
        self
    }

    pub fn marketplace(mut self, marketplace: impl Into<String>) -> Self {
        self.globals.marketplace = Some(marketplace.into());
        self
    }

    pub fn security(mut self, security: Security) -> Self {
        self.security_source = Some(Arc::new(security));
        self
    }

    /// Resolves credentials before every attempt instead of once.
    pub fn security_source(mut self, security_source: Arc<dyn SecuritySource>) -> Self {
        self.security_source = Some(security_source);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn resolve_server_url(&self) -> crate::Result<String> {
        if let Some(server_url) = &self.server_url {
            return Ok(server_url.clone());
        }
        let Some(template) = SERVERS.get(self.server_index) else {
            return Err(Error::ServerIndex {
                index: self.server_index,
                available: SERVERS.len(),
            });
        };

        let mut variables: BTreeMap<String, String> = DEFAULT_SERVER_VARIABLES
            .iter()
            .filter(|(index, _, _)| *index == self.server_index)
            .map(|(_, name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        variables.extend(self.server_variables.clone());
        Ok(replace_parameters(template, &variables))
    }

    pub fn try_build(self) -> crate::Result<PlexApi> {
        let server_url = self.resolve_server_url()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::try_new()?),
        };

        let (server_url, transport) = self.hooks.sdk_init(server_url, transport);
        validate_base_url(&server_url)?;
        debug!(server_url = %redact_uri_for_logs(&server_url), "plexapi client configured");

        Ok(PlexApi::from_configuration(SdkConfiguration {
            server_url,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
            user_agent: self.user_agent,
            globals: self.globals,
            security_source: self.security_source,
            executor: Executor::new(transport, Arc::new(self.hooks)),
        }))
    }

    #[track_caller]
    pub fn build(self) -> PlexApi {
        self.try_build().unwrap_or_else(|error| {
            panic!("failed to build plexapi client: {error}; use try_build() to handle configuration errors")
        })
    }
}
