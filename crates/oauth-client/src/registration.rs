//! Client registrations
//!
//! A registration describes who we are to one authorization server: client
//! id and secret, the token endpoint, requested scopes, and how the client
//! authenticates when asking for a token. Registrations are loaded once at
//! startup and never change afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use common::Secret;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// How the client proves its identity to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// HTTP Basic with the url-encoded client id and secret (RFC 6749 2.3.1).
    #[default]
    ClientSecretBasic,
    /// `client_id` and `client_secret` in the form body.
    ClientSecretPost,
    /// Public client: `client_id` in the form body, no secret.
    None,
}

/// OAuth2 grant used to obtain tokens. Only client credentials is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    #[default]
    ClientCredentials,
}

impl GrantType {
    /// Value of the `grant_type` form parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

/// One client registration with an authorization server.
#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub registration_id: String,
    pub client_id: String,
    pub client_secret: Option<Secret<String>>,
    pub token_endpoint: Url,
    pub grant_type: GrantType,
    pub scopes: Vec<String>,
    pub auth_method: ClientAuthMethod,
}

impl ClientRegistration {
    /// Client-credentials registration with no secret, no scopes and
    /// `client_secret_basic` authentication.
    pub fn client_credentials(
        registration_id: impl Into<String>,
        client_id: impl Into<String>,
        token_endpoint: Url,
    ) -> Self {
        Self {
            registration_id: registration_id.into(),
            client_id: client_id.into(),
            client_secret: None,
            token_endpoint,
            grant_type: GrantType::ClientCredentials,
            scopes: Vec::new(),
            auth_method: ClientAuthMethod::default(),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<Secret<String>>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Check the registration can actually be used against a token endpoint.
    pub fn validate(&self) -> Result<()> {
        if self.registration_id.trim().is_empty() {
            return Err(Error::InvalidRegistration(
                "registration_id must not be empty".into(),
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::InvalidRegistration(format!(
                "{}: client_id must not be empty",
                self.registration_id
            )));
        }
        if !matches!(self.token_endpoint.scheme(), "http" | "https") {
            return Err(Error::InvalidRegistration(format!(
                "{}: token endpoint must be http or https, got {}",
                self.registration_id, self.token_endpoint
            )));
        }
        let has_secret = self
            .client_secret
            .as_ref()
            .is_some_and(|secret| !secret.is_blank());
        if self.auth_method != ClientAuthMethod::None && !has_secret {
            return Err(Error::InvalidRegistration(format!(
                "{}: client secret required for {:?} authentication",
                self.registration_id, self.auth_method
            )));
        }
        Ok(())
    }
}

/// Immutable lookup of registrations by id.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistrationRepository {
    registrations: HashMap<String, Arc<ClientRegistration>>,
}

impl ClientRegistrationRepository {
    /// Validate and index `registrations`. Duplicate ids are rejected.
    pub fn new(registrations: impl IntoIterator<Item = ClientRegistration>) -> Result<Self> {
        let mut map = HashMap::new();
        for registration in registrations {
            registration.validate()?;
            let id = registration.registration_id.clone();
            if map.insert(id.clone(), Arc::new(registration)).is_some() {
                return Err(Error::InvalidRegistration(format!(
                    "duplicate registration id {id}"
                )));
            }
        }
        Ok(Self { registrations: map })
    }

    pub fn find_by_registration_id(&self, registration_id: &str) -> Option<Arc<ClientRegistration>> {
        self.registrations.get(registration_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("http://localhost:9000/oauth2/token").unwrap()
    }

    fn springauth() -> ClientRegistration {
        ClientRegistration::client_credentials("springauth", "messaging-client", endpoint())
            .with_secret("secret")
            .with_scopes(["message.read", "message.write"])
    }

    #[test]
    fn builder_defaults() {
        let registration = ClientRegistration::client_credentials("id", "client", endpoint());
        assert_eq!(registration.grant_type, GrantType::ClientCredentials);
        assert_eq!(registration.auth_method, ClientAuthMethod::ClientSecretBasic);
        assert!(registration.scopes.is_empty());
        assert!(registration.client_secret.is_none());
    }

    #[test]
    fn grant_type_form_value() {
        assert_eq!(GrantType::ClientCredentials.as_str(), "client_credentials");
    }

    #[test]
    fn auth_method_deserializes_snake_case() {
        let method: ClientAuthMethod = serde_json::from_str(r#""client_secret_post""#).unwrap();
        assert_eq!(method, ClientAuthMethod::ClientSecretPost);
        let method: ClientAuthMethod = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(method, ClientAuthMethod::None);
    }

    #[test]
    fn repository_finds_by_id() {
        let repo = ClientRegistrationRepository::new([springauth()]).unwrap();
        let found = repo.find_by_registration_id("springauth").unwrap();
        assert_eq!(found.client_id, "messaging-client");
        assert!(repo.find_by_registration_id("other").is_none());
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn repository_rejects_duplicates() {
        let result = ClientRegistrationRepository::new([springauth(), springauth()]);
        assert!(matches!(result, Err(Error::InvalidRegistration(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn secret_required_unless_public_client() {
        let missing = ClientRegistration::client_credentials("id", "client", endpoint());
        assert!(missing.validate().is_err());

        let blank = ClientRegistration::client_credentials("id", "client", endpoint())
            .with_secret("   ");
        assert!(blank.validate().is_err());

        let public = ClientRegistration::client_credentials("id", "client", endpoint())
            .with_auth_method(ClientAuthMethod::None);
        assert!(public.validate().is_ok());
    }

    #[test]
    fn non_http_token_endpoint_rejected() {
        let registration = ClientRegistration::client_credentials(
            "id",
            "client",
            Url::parse("ftp://auth.example.com/token").unwrap(),
        )
        .with_secret("secret");
        let err = registration.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let debug = format!("{:?}", springauth());
        assert!(!debug.contains("\"secret\""), "got: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }
}
