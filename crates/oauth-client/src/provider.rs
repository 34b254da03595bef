//! Token cache and lazy refresh
//!
//! `TokenProvider` holds one `AuthorizedClient` per registration. Reads take
//! the `RwLock` briefly and clone the token out, so concurrent requests never
//! block each other on a cache hit. Entries are replaced wholesale under the
//! write lock; a reader sees either the old token or the new one.
//!
//! Refreshes are serialised by a separate `Mutex`. A caller that misses the
//! cache takes the refresh lock and re-checks before calling the token
//! endpoint, so a burst of requests on a cold or expired cache produces a
//! single token request. There is no background refresh: an expired entry is
//! only replaced when the next request asks for it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use transport::Transport;

use crate::error::{Error, Result};
use crate::registration::{ClientRegistration, ClientRegistrationRepository};
use crate::token::{self, AccessToken};

/// Tokens are treated as expired this long before `expires_at`.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Identity the token is held for. Client-credentials tokens belong to the
/// client itself, so this carries nothing beyond the client id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPrincipal {
    name: String,
}

impl ClientPrincipal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A registration paired with the token currently issued to it.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    pub registration: Arc<ClientRegistration>,
    pub principal: ClientPrincipal,
    pub token: AccessToken,
}

/// Obtains, caches and lazily refreshes client-credentials tokens.
pub struct TokenProvider {
    registrations: ClientRegistrationRepository,
    transport: Arc<dyn Transport>,
    cache: RwLock<HashMap<String, AuthorizedClient>>,
    refresh_lock: Mutex<()>,
    clock_skew: Duration,
}

impl TokenProvider {
    /// `transport` carries token requests and must not itself be an
    /// authenticating transport.
    pub fn new(registrations: ClientRegistrationRepository, transport: Arc<dyn Transport>) -> Self {
        info!(registrations = registrations.len(), "token provider initialized");
        Self {
            registrations,
            transport,
            cache: RwLock::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }

    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn registrations(&self) -> &ClientRegistrationRepository {
        &self.registrations
    }

    /// Return a valid token for `registration_id`, fetching a new one only
    /// when none is cached or the cached one has expired.
    pub async fn authorize(&self, registration_id: &str) -> Result<AccessToken> {
        let registration = self
            .registrations
            .find_by_registration_id(registration_id)
            .ok_or_else(|| Error::UnknownRegistration(registration_id.to_string()))?;

        if let Some(token) = self.cached_token(registration_id).await {
            metrics::counter!("oauth_token_cache_hits_total", "registration" => registration_id.to_string())
                .increment(1);
            return Ok(token);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.cached_token(registration_id).await {
            debug!(registration_id, "token refreshed by concurrent caller");
            metrics::counter!("oauth_token_cache_hits_total", "registration" => registration_id.to_string())
                .increment(1);
            return Ok(token);
        }

        debug!(registration_id, "no valid cached token, requesting a new one");
        match self.fetch(registration).await {
            Ok(client) => {
                metrics::counter!(
                    "oauth_token_requests_total",
                    "registration" => registration_id.to_string(),
                    "outcome" => "success"
                )
                .increment(1);
                let token = client.token.clone();
                self.cache
                    .write()
                    .await
                    .insert(registration_id.to_string(), client);
                info!(
                    registration_id,
                    expires_in_secs = ?token
                        .expires_at()
                        .map(|at| at.saturating_duration_since(token.issued_at()).as_secs()),
                    "access token issued"
                );
                Ok(token)
            }
            Err(e) => {
                metrics::counter!(
                    "oauth_token_requests_total",
                    "registration" => registration_id.to_string(),
                    "outcome" => "error"
                )
                .increment(1);
                warn!(registration_id, error = %e, "token request failed");
                Err(e)
            }
        }
    }

    /// The cached pairing for `registration_id`, whether or not it has expired.
    pub async fn authorized_client(&self, registration_id: &str) -> Option<AuthorizedClient> {
        self.cache.read().await.get(registration_id).cloned()
    }

    /// Drop the cached token so the next `authorize` fetches a fresh one.
    ///
    /// Returns whether an entry was removed.
    pub async fn invalidate(&self, registration_id: &str) -> bool {
        let removed = self.cache.write().await.remove(registration_id).is_some();
        if removed {
            debug!(registration_id, "cached token invalidated");
        }
        removed
    }

    async fn cached_token(&self, registration_id: &str) -> Option<AccessToken> {
        let cache = self.cache.read().await;
        cache
            .get(registration_id)
            .filter(|client| !client.token.is_expired_at(Instant::now(), self.clock_skew))
            .map(|client| client.token.clone())
    }

    async fn fetch(&self, registration: Arc<ClientRegistration>) -> Result<AuthorizedClient> {
        let issued_at = Instant::now();
        let response = token::request_client_credentials(self.transport.as_ref(), &registration).await?;
        let token = AccessToken::from_response(response, issued_at, &registration.scopes)?;

        if token.is_expired_at(Instant::now(), Duration::ZERO) {
            return Err(Error::TokenExchange(
                "token endpoint issued an already-expired token".into(),
            ));
        }

        Ok(AuthorizedClient {
            principal: ClientPrincipal::new(registration.client_id.clone()),
            registration,
            token,
        })
    }
}
