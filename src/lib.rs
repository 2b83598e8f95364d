//! `plexapi` is a typed client for the Plex home users API.
//!
//! Every operation runs through one pipeline: build the URL, populate headers
//! and credentials, send with optional retries, then decode by status code.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use plexapi::prelude::{Options, PlexApi, RetryPolicy, Security, SwitchUserRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = PlexApi::builder()
//!         .security(Security::api_key("my-plex-token"))
//!         .client_identifier("3381b62b-9ab7-4e37-827b-203e9809eb58")
//!         .product("Plex for Rust")
//!         .timeout(Duration::from_secs(10))
//!         .retry_policy(
//!             RetryPolicy::backoff()
//!                 .max_attempts(4)
//!                 .initial_interval(Duration::from_millis(250)),
//!         )
//!         .try_build()?;
//!
//!     let home = api.home_users().get_home_users(Options::new()).await?;
//!     for user in home.object.map(|home| home.users).unwrap_or_default() {
//!         println!("{} ({})", user.title, user.id);
//!     }
//!
//!     let switched = api
//!         .home_users()
//!         .switch_user(SwitchUserRequest::new(1093707).pin("1234"), Options::new())
//!         .await?;
//!     println!("switched with status {}", switched.status_code);
//!     Ok(())
//! }
//! ```
//!
//! # Retries
//!
//! Without a retry policy a call makes exactly one attempt. With one, transport
//! failures and retryable statuses are retried with exponential backoff until
//! the attempt or elapsed-time budget runs out; the last response received is
//! then decoded as usual.

mod client;
pub mod codec;
mod config;
mod error;
mod executor;
mod headers;
mod home_users;
mod hooks;
pub mod models;
mod operation;
mod options;
mod request;
mod response;
mod retry;
mod security;
mod transport;
mod util;

pub use crate::client::PlexApi;
pub use crate::config::{
    DEFAULT_USER_AGENT, PlexApiBuilder, SERVER_MEDIA_SERVER, SERVER_PLEX_TV, SERVERS,
    SdkConfiguration,
};
pub use crate::error::{
    BoxError, CancelReason, Error, ErrorCode, SdkError, TransportError, TransportErrorKind,
};
pub use crate::executor::Executor;
pub use crate::headers::{DEFAULT_ACCEPTS, Globals, HeaderBinding, HeaderParam};
pub use crate::home_users::HomeUsers;
pub use crate::hooks::{
    AfterErrorContext, AfterErrorHook, AfterSuccessContext, AfterSuccessHook,
    BeforeRequestContext, BeforeRequestHook, HookContext, HookError, Hooks, SdkInitHook,
};
pub use crate::operation::OperationSpec;
pub use crate::options::{Options, SupportedOption};
pub use crate::request::{
    MediaType, OperationParams, ParamValue, QueryParam, QueryStyle, RequestBody,
    RequestDescriptor, append_query, generate_url, serialize_body,
};
pub use crate::response::{BodyFormat, OperationResponse, RawResponse, decode_response};
pub use crate::retry::RetryPolicy;
pub use crate::security::{PLEX_TOKEN_HEADER, Security, SecurityFn, SecuritySource};
pub use crate::transport::{BoxFuture, HyperTransport, Transport};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::models::{
        GetHomeUsersResponse, GetHomeUsersResponseBody, HomeUser, SwitchUserRequest,
        SwitchUserResponse, UserPlexAccount,
    };
    pub use crate::{
        CancelReason, Error, ErrorCode, Globals, HookError, Hooks, Options, PlexApi,
        PlexApiBuilder, RawResponse, RetryPolicy, SdkError, Security, SecuritySource, Transport,
        TransportErrorKind,
    };
}
