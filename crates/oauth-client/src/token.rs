//! Access tokens and the client-credentials token request
//!
//! The token endpoint answers a `grant_type=client_credentials` form POST
//! with `{access_token, token_type, expires_in?, scope?}`. `expires_in` is a
//! delta in seconds from issue time; the caller records the issue instant
//! before sending so expiry errs on the early side.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;
use serde::Deserialize;
use tokio::time::Instant;
use transport::header::{AUTHORIZATION, HeaderValue};
use transport::{HttpRequest, Transport};
use tracing::debug;

use crate::error::{Error, Result};
use crate::registration::{ClientAuthMethod, ClientRegistration};

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Secret<String>,
    pub token_type: String,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Space-separated granted scopes, when the server narrows the request
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token type. Only bearer tokens are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Bearer,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Bearer => "Bearer",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        value.eq_ignore_ascii_case("bearer").then_some(TokenType::Bearer)
    }
}

/// An issued access token. Immutable; refresh replaces it wholesale.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: Secret<String>,
    token_type: TokenType,
    issued_at: Instant,
    expires_at: Option<Instant>,
    scopes: Vec<String>,
}

impl AccessToken {
    pub fn new(
        value: impl Into<Secret<String>>,
        issued_at: Instant,
        expires_at: Option<Instant>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            value: value.into(),
            token_type: TokenType::Bearer,
            issued_at,
            expires_at,
            scopes,
        }
    }

    /// Build a token from an endpoint response.
    ///
    /// `requested_scopes` apply when the server does not echo a `scope`.
    /// A missing `expires_in` means the token never expires.
    pub fn from_response(
        response: TokenResponse,
        issued_at: Instant,
        requested_scopes: &[String],
    ) -> Result<Self> {
        let token_type = TokenType::parse(&response.token_type).ok_or_else(|| {
            Error::TokenExchange(format!(
                "unsupported token type {:?}",
                response.token_type
            ))
        })?;
        if response.access_token.is_blank() {
            return Err(Error::TokenExchange("empty access_token".into()));
        }
        // A lifetime past the clock's range never expires in practice
        let expires_at = response
            .expires_in
            .and_then(|secs| issued_at.checked_add(Duration::from_secs(secs)));
        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(str::to_owned).collect(),
            None => requested_scopes.to_vec(),
        };
        Ok(Self {
            value: response.access_token,
            token_type,
            issued_at,
            expires_at,
            scopes,
        })
    }

    pub fn value(&self) -> &str {
        self.value.expose()
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// `None` means the token never expires.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Whether the token is expired at `now`, treating it as expired `skew`
    /// early so it is not presented in its last moments.
    pub fn is_expired_at(&self, now: Instant, skew: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now.checked_add(skew).is_none_or(|t| t >= expires_at),
            None => false,
        }
    }

    /// `Authorization` header value.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type.as_str(), self.value.expose())
    }
}

/// Request a token for `registration` with the client-credentials grant.
pub async fn request_client_credentials(
    transport: &dyn Transport,
    registration: &ClientRegistration,
) -> Result<TokenResponse> {
    let scope = registration.scopes.join(" ");
    let secret = registration
        .client_secret
        .as_ref()
        .map(|secret| secret.expose().as_str());

    let mut form: Vec<(&str, &str)> = vec![("grant_type", registration.grant_type.as_str())];
    if !scope.is_empty() {
        form.push(("scope", scope.as_str()));
    }
    match registration.auth_method {
        ClientAuthMethod::ClientSecretBasic => {}
        ClientAuthMethod::ClientSecretPost => {
            form.push(("client_id", registration.client_id.as_str()));
            if let Some(secret) = secret {
                form.push(("client_secret", secret));
            }
        }
        ClientAuthMethod::None => form.push(("client_id", registration.client_id.as_str())),
    }

    let mut request = HttpRequest::post(registration.token_endpoint.clone())
        .with_form(&form)
        .accept_json();
    if registration.auth_method == ClientAuthMethod::ClientSecretBasic {
        let header = basic_authorization(&registration.client_id, secret.unwrap_or_default())?;
        request = request.with_header(AUTHORIZATION, header);
    }

    debug!(
        registration_id = %registration.registration_id,
        token_endpoint = %registration.token_endpoint,
        "requesting client-credentials token"
    );

    let response = transport
        .send(request)
        .await
        .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

    let status = response.status;
    if !status.is_success() {
        let body = response.body_excerpt();

        // 400 invalid_client / 401 / 403: the credentials themselves are wrong
        if status.as_u16() == 401 || status.as_u16() == 403 || body.contains("invalid_client") {
            return Err(Error::InvalidCredentials(format!(
                "token endpoint rejected client ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))
}

/// `Basic base64(urlencode(id) ":" urlencode(secret))`, marked sensitive.
fn basic_authorization(client_id: &str, client_secret: &str) -> Result<HeaderValue> {
    let id: String = url::form_urlencoded::byte_serialize(client_id.as_bytes()).collect();
    let secret: String = url::form_urlencoded::byte_serialize(client_secret.as_bytes()).collect();
    let encoded = STANDARD.encode(format!("{id}:{secret}"));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| Error::InvalidRegistration(format!("client credentials not encodable: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}
