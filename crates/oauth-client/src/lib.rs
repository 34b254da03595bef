//! OAuth2 client-credentials support for outbound HTTP calls
//!
//! Obtains bearer tokens for a fixed set of client registrations, caches them
//! until they expire, and injects them into requests passing through any
//! `transport::Transport`.
//!
//! Request flow:
//! 1. Caller sends a request through `AuthenticatingTransport`
//! 2. The transport asks `TokenProvider::authorize()` for the registration's token
//! 3. Cache hit: the cached token is returned with no network call
//! 4. Cache miss or expiry: one client-credentials request to the token endpoint,
//!    the resulting `AuthorizedClient` replaces the cache entry
//! 5. `Authorization: Bearer <token>` is set and the request is delegated

pub mod error;
pub mod interceptor;
pub mod provider;
pub mod registration;
pub mod token;

pub use error::{Error, Result};
pub use interceptor::AuthenticatingTransport;
pub use provider::{AuthorizedClient, ClientPrincipal, DEFAULT_CLOCK_SKEW, TokenProvider};
pub use registration::{ClientAuthMethod, ClientRegistration, ClientRegistrationRepository, GrantType};
pub use token::{AccessToken, TokenResponse, TokenType, request_client_credentials};
