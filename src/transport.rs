use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::error::{Error, TransportError, TransportErrorKind};
use crate::response::RawResponse;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
const DEFAULT_MAX_RESPONSE_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Sends one fully built request and buffers the response.
///
/// Implementations must be safe to share across concurrent calls. An `Err`
/// means no usable response arrived; any status code, including errors, is an
/// `Ok`.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<RawResponse, TransportError>>;
}

type HyperClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP/1.1 + HTTP/2 client over rustls.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    max_response_body_bytes: usize,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HyperTransport")
            .field("max_response_body_bytes", &self.max_response_body_bytes)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    pub fn try_new() -> crate::Result<Self> {
        Self::with_pool(DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_POOL_MAX_IDLE_PER_HOST)
    }

    pub fn with_pool(
        pool_idle_timeout: Duration,
        pool_max_idle_per_host: usize,
    ) -> crate::Result<Self> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(|source| Error::TlsInit {
                message: source.to_string(),
            })?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http);
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(pool_idle_timeout.max(Duration::from_millis(1)))
            .pool_max_idle_per_host(pool_max_idle_per_host.max(1))
            .build(https);
        Ok(Self {
            client,
            max_response_body_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
        })
    }

    /// Largest response body buffered before the attempt fails with
    /// [`TransportErrorKind::BodyTooLarge`]. Defaults to 8 MiB.
    pub fn max_response_body_bytes(mut self, max_response_body_bytes: usize) -> Self {
        self.max_response_body_bytes = max_response_body_bytes.max(1);
        self
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Bytes>) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let request = Request::from_parts(parts, Full::new(body));
            let response: http::Response<Incoming> =
                self.client.request(request).await.map_err(|source| {
                    TransportError::new(classify_transport_error(&source), source)
                })?;

            let (parts, body) = response.into_parts();
            let body = Limited::new(body, self.max_response_body_bytes)
                .collect()
                .await
                .map_err(|source| {
                    let kind = if source.is::<LengthLimitError>() {
                        TransportErrorKind::BodyTooLarge
                    } else {
                        TransportErrorKind::Read
                    };
                    TransportError::new(kind, source)
                })?
                .to_bytes();
            Ok(RawResponse::new(parts.status, parts.headers, body))
        })
    }
}

pub(crate) fn classify_transport_error(
    error: &hyper_util::client::legacy::Error,
) -> TransportErrorKind {
    if error.is_connect() {
        let text = error.to_string().to_ascii_lowercase();
        if text.contains("dns")
            || text.contains("name or service not known")
            || text.contains("failed to lookup address")
        {
            return TransportErrorKind::Dns;
        }
        if text.contains("tls") || text.contains("certificate") || text.contains("handshake") {
            return TransportErrorKind::Tls;
        }
        return TransportErrorKind::Connect;
    }

    let text = error.to_string().to_ascii_lowercase();
    if text.contains("timed out") {
        return TransportErrorKind::Timeout;
    }
    if text.contains("read")
        || text.contains("connection reset")
        || text.contains("broken pipe")
        || text.contains("unexpected eof")
    {
        return TransportErrorKind::Read;
    }

    TransportErrorKind::Other
}
