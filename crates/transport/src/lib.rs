//! HTTP transport abstraction
//!
//! Defines the `Transport` trait that decouples request construction from the
//! HTTP client doing the I/O. `ReqwestTransport` is the production
//! implementation; the OAuth layer wraps any `Transport` to inject bearer
//! tokens, and tests substitute scripted doubles without touching the
//! resource client.
//!
//! A transport returns every response verbatim. Status codes are never
//! interpreted here: a 404 or 500 is a successful `send`.

pub mod request;
pub mod reqwest_transport;
pub mod response;

pub use request::HttpRequest;
pub use reqwest_transport::ReqwestTransport;
pub use response::HttpResponse;

pub use reqwest::header;
pub use reqwest::{Method, StatusCode};
pub use url::Url;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Errors from sending a request. HTTP error statuses are not errors at this
/// layer; they come back as an `HttpResponse`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS, timeout, or body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be built (bad header value, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No credential could be obtained; the request was not sent.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed future returned by `Transport::send`.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;

/// Something that can carry an `HttpRequest` to a server and bring back the
/// raw response.
///
/// Uses a `Pin<Box<dyn Future>>` return type for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> SendFuture<'_>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> SendFuture<'_> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: HttpRequest) -> SendFuture<'_> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replies 204 to everything and remembers the last URL.
    struct NoContent {
        last_url: std::sync::Mutex<Option<String>>,
    }

    impl Transport for NoContent {
        fn send(&self, request: HttpRequest) -> SendFuture<'_> {
            *self.last_url.lock().unwrap() = Some(request.url.to_string());
            Box::pin(async { Ok(HttpResponse::new(StatusCode::NO_CONTENT)) })
        }
    }

    #[tokio::test]
    async fn arc_dyn_transport_delegates() {
        let inner = Arc::new(NoContent {
            last_url: std::sync::Mutex::new(None),
        });
        let transport: Arc<dyn Transport> = inner.clone();

        let url = Url::parse("http://localhost:8080/api/v1/beer").unwrap();
        let response = transport.send(HttpRequest::get(url)).await.unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(
            inner.last_url.lock().unwrap().as_deref(),
            Some("http://localhost:8080/api/v1/beer")
        );
    }

    #[test]
    fn error_display_names_the_layer() {
        assert_eq!(
            Error::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
        assert!(Error::Auth("no token".into()).to_string().contains("no token"));
    }
}
