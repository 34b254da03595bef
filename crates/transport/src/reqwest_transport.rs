//! `reqwest`-backed transport
//!
//! Connection pooling, TLS and timeouts all live in `reqwest::Client`; this
//! type only converts between `HttpRequest`/`HttpResponse` and reqwest's own
//! request and response types. Upstream status codes pass through unchanged.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{Error, HttpRequest, HttpResponse, SendFuture, Transport};

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Bound every request (connect through body read) by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn execute(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.to_string();

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "request failed before a response arrived");
            if e.is_timeout() {
                Error::Network(format!("{method} {url} timed out: {e}"))
            } else {
                Error::Network(format!("{method} {url} failed: {e}"))
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("reading response body from {url}: {e}")))?;

        debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> SendFuture<'_> {
        Box::pin(self.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, StatusCode, Url};
    use axum::body::Body;
    use reqwest::header::{AUTHORIZATION, HeaderValue};
    use tokio::net::TcpListener;

    /// Start a mock server that echoes method, path, query, headers and body as JSON.
    async fn start_echo_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            let app =
                axum::Router::new().fallback(|request: axum::http::Request<Body>| async move {
                    let mut headers_map = serde_json::Map::new();
                    for (name, value) in request.headers() {
                        headers_map.insert(
                            name.to_string(),
                            serde_json::Value::String(value.to_str().unwrap_or("").to_string()),
                        );
                    }
                    let method = request.method().to_string();
                    let path = request.uri().path().to_string();
                    let query = request.uri().query().unwrap_or("").to_string();
                    let body_bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                        .await
                        .unwrap();
                    let body = serde_json::json!({
                        "echoed_headers": headers_map,
                        "method": method,
                        "path": path,
                        "query": query,
                        "body": String::from_utf8_lossy(&body_bytes),
                    });
                    (
                        axum::http::StatusCode::OK,
                        [("x-echo", "true")],
                        axum::Json(body),
                    )
                });
            axum::serve(listener, app).await.unwrap();
        });

        (url, handle)
    }

    #[tokio::test]
    async fn forwards_method_headers_query_and_body() {
        let (base, _server) = start_echo_server().await;
        let url = Url::parse(&format!("{base}/api/v1/beer?pageSize=1")).unwrap();

        let request = HttpRequest::new(Method::PUT, url)
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer test"))
            .with_json(&serde_json::json!({"upc": "12345"}))
            .unwrap();

        let response = ReqwestTransport::default().send(request).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("x-echo").unwrap(), "true");

        let echoed: serde_json::Value = response.json().unwrap();
        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["path"], "/api/v1/beer");
        assert_eq!(echoed["query"], "pageSize=1");
        assert_eq!(echoed["echoed_headers"]["authorization"], "Bearer test");
        assert_eq!(echoed["echoed_headers"]["content-type"], "application/json");
        assert_eq!(echoed["body"], r#"{"upc":"12345"}"#);
    }

    #[tokio::test]
    async fn non_2xx_status_is_returned_not_raised() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let app = axum::Router::new().fallback(|| async {
                (axum::http::StatusCode::NOT_FOUND, r#"{"status":404}"#)
            });
            axum::serve(listener, app).await.unwrap();
        });

        let url = Url::parse(&format!("http://{addr}/api/v1/beer/missing")).unwrap();
        let response = ReqwestTransport::default()
            .send(HttpRequest::get(url))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body_excerpt(), r#"{"status":404}"#);
    }

    #[tokio::test]
    async fn dead_server_is_a_network_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/api/v1/beer")).unwrap();
        let result = ReqwestTransport::default().send(HttpRequest::get(url)).await;

        assert!(
            matches!(result, Err(Error::Network(_))),
            "expected network error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn timeout_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let app = axum::Router::new().fallback(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "too late"
            });
            axum::serve(listener, app).await.unwrap();
        });

        let transport = ReqwestTransport::default().with_timeout(Duration::from_millis(100));
        let url = Url::parse(&format!("http://{addr}/slow")).unwrap();
        let result = transport.send(HttpRequest::get(url)).await;

        match result {
            Err(Error::Network(msg)) => assert!(msg.contains("timed out"), "got: {msg}"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
