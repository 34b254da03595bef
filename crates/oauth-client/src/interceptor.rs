//! Bearer token injection for any `Transport`
//!
//! Wraps an inner transport and, for every request, asks the `TokenProvider`
//! for the configured registration's token before delegating. If no token can
//! be obtained the request is never sent. Responses come back untouched: no
//! retries, no status interpretation.

use std::sync::Arc;

use tracing::warn;
use transport::header::{AUTHORIZATION, HeaderValue};
use transport::{HttpRequest, SendFuture, Transport};

use crate::provider::TokenProvider;

/// `Transport` that sets `Authorization: Bearer <token>` on every request.
pub struct AuthenticatingTransport<T> {
    inner: T,
    provider: Arc<TokenProvider>,
    registration_id: String,
}

impl<T: Transport> AuthenticatingTransport<T> {
    pub fn new(inner: T, provider: Arc<TokenProvider>, registration_id: impl Into<String>) -> Self {
        Self {
            inner,
            provider,
            registration_id: registration_id.into(),
        }
    }

    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for AuthenticatingTransport<T> {
    fn send(&self, mut request: HttpRequest) -> SendFuture<'_> {
        Box::pin(async move {
            let token = self
                .provider
                .authorize(&self.registration_id)
                .await
                .map_err(|e| {
                    warn!(
                        registration_id = %self.registration_id,
                        method = %request.method,
                        url = %request.url,
                        error = %e,
                        "no access token, request not sent"
                    );
                    transport::Error::Auth(e.to_string())
                })?;

            let mut value = HeaderValue::from_str(&token.authorization_value()).map_err(|e| {
                transport::Error::InvalidRequest(format!(
                    "access token is not a valid header value: {e}"
                ))
            })?;
            value.set_sensitive(true);

            // insert() drops every existing Authorization value
            request.headers.insert(AUTHORIZATION, value);

            self.inner.send(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{ClientRegistration, ClientRegistrationRepository};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use transport::{HttpResponse, StatusCode, Url};

    /// Token endpoint double issuing `at_<n>` for five minutes.
    #[derive(Default)]
    struct TokenEndpoint {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Transport for TokenEndpoint {
        fn send(&self, _request: HttpRequest) -> SendFuture<'_> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    return Err(transport::Error::Network("connection refused".into()));
                }
                Ok(HttpResponse::new(StatusCode::OK).with_json(&serde_json::json!({
                    "access_token": format!("at_{n}"),
                    "token_type": "Bearer",
                    "expires_in": 300,
                })))
            })
        }
    }

    /// Resource server double: records requests, answers with `status`.
    struct Recorder {
        status: StatusCode,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Recorder {
        fn new(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                status,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn authorization_headers(&self) -> Vec<Vec<String>> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| {
                    r.headers
                        .get_all(AUTHORIZATION)
                        .iter()
                        .map(|v| v.to_str().unwrap().to_string())
                        .collect()
                })
                .collect()
        }
    }

    impl Transport for Recorder {
        fn send(&self, request: HttpRequest) -> SendFuture<'_> {
            self.seen.lock().unwrap().push(request);
            let status = self.status;
            Box::pin(async move {
                Ok(HttpResponse::new(status)
                    .with_header(
                        transport::header::HeaderName::from_static("x-upstream"),
                        HeaderValue::from_static("yes"),
                    )
                    .with_json(&serde_json::json!({"status": status.as_u16()})))
            })
        }
    }

    fn provider(endpoint: Arc<TokenEndpoint>) -> Arc<TokenProvider> {
        let registration = ClientRegistration::client_credentials(
            "springauth",
            "messaging-client",
            Url::parse("http://localhost:9000/oauth2/token").unwrap(),
        )
        .with_secret("secret");
        Arc::new(TokenProvider::new(
            ClientRegistrationRepository::new([registration]).unwrap(),
            endpoint,
        ))
    }

    fn request() -> HttpRequest {
        HttpRequest::get(Url::parse("http://localhost:8080/api/v1/beer").unwrap())
    }

    #[tokio::test]
    async fn injects_bearer_token() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::OK);
        let transport = AuthenticatingTransport::new(upstream.clone(), provider(endpoint), "springauth");

        transport.send(request()).await.unwrap();

        assert_eq!(upstream.authorization_headers(), vec![vec!["Bearer at_1".to_string()]]);
    }

    #[tokio::test]
    async fn overwrites_existing_authorization() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::OK);
        let transport = AuthenticatingTransport::new(upstream.clone(), provider(endpoint), "springauth");

        let mut request = request();
        request
            .headers
            .append(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjE6cGFzc3dvcmQ="));
        request
            .headers
            .append(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));
        transport.send(request).await.unwrap();

        assert_eq!(upstream.authorization_headers(), vec![vec!["Bearer at_1".to_string()]]);
    }

    #[tokio::test]
    async fn one_token_request_across_many_sends() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::OK);
        let transport =
            AuthenticatingTransport::new(upstream.clone(), provider(endpoint.clone()), "springauth");

        for _ in 0..5 {
            transport.send(request()).await.unwrap();
        }

        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
        assert_eq!(upstream.seen.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn token_failure_aborts_without_sending() {
        let endpoint = Arc::new(TokenEndpoint {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let upstream = Recorder::new(StatusCode::OK);
        let transport = AuthenticatingTransport::new(upstream.clone(), provider(endpoint), "springauth");

        let result = transport.send(request()).await;

        assert!(
            matches!(result, Err(transport::Error::Auth(_))),
            "expected auth error, got {result:?}"
        );
        assert!(
            upstream.seen.lock().unwrap().is_empty(),
            "request must never be sent unauthenticated"
        );
    }

    #[tokio::test]
    async fn unknown_registration_is_an_auth_error() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::OK);
        let transport = AuthenticatingTransport::new(upstream.clone(), provider(endpoint), "other");

        let result = transport.send(request()).await;
        match result {
            Err(transport::Error::Auth(msg)) => assert!(msg.contains("other"), "got: {msg}"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_error_status_passes_through_verbatim() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::NOT_FOUND);
        let transport = AuthenticatingTransport::new(upstream, provider(endpoint), "springauth");

        let response = transport.send(request()).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.headers.get("x-upstream").unwrap(), "yes");
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn usable_as_dyn_transport() {
        let endpoint = Arc::new(TokenEndpoint::default());
        let upstream = Recorder::new(StatusCode::OK);
        let transport: Arc<dyn Transport> = Arc::new(AuthenticatingTransport::new(
            upstream.clone() as Arc<dyn Transport>,
            provider(endpoint),
            "springauth",
        ));

        transport.send(request()).await.unwrap();
        assert_eq!(upstream.authorization_headers().len(), 1);
    }
}
