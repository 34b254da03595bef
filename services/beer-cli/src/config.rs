//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from OAUTH_CLIENT_SECRET or client_secret_file,
//! never stored in the TOML directly to avoid leaking secrets.

use beer_client::BeerServiceConfig;
use common::Secret;
use oauth_client::{ClientAuthMethod, ClientRegistration, DEFAULT_CLOCK_SKEW};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub oauth: RegistrationConfig,
}

/// Beer service location and HTTP settings
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub beer: BeerServiceConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Client registration with the authorization server
#[derive(Debug, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_registration_id")]
    pub registration_id: String,
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to OAUTH_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    pub token_endpoint: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub auth_method: ClientAuthMethod,
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,
}

/// Refreshing more than an hour early defeats the token cache.
const MAX_CLOCK_SKEW_SECS: u64 = 3600;

fn default_timeout() -> u64 {
    30
}

fn default_registration_id() -> String {
    "springauth".into()
}

fn default_clock_skew() -> u64 {
    DEFAULT_CLOCK_SKEW.as_secs()
}

impl RegistrationConfig {
    /// Build the validated client registration this config describes.
    pub fn to_registration(&self) -> common::Result<ClientRegistration> {
        let token_endpoint = Url::parse(&self.token_endpoint)?;
        let mut registration = ClientRegistration::client_credentials(
            self.registration_id.clone(),
            self.client_id.clone(),
            token_endpoint,
        )
        .with_scopes(self.scopes.iter().cloned())
        .with_auth_method(self.auth_method);
        if let Some(secret) = &self.client_secret {
            registration = registration.with_secret(secret.clone());
        }
        registration
            .validate()
            .map_err(|e| common::Error::Config(e.to_string()))?;
        Ok(registration)
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. OAUTH_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Base URL scheme and item path template
        config
            .service
            .beer
            .validate()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        if config.service.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.oauth.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
            return Err(common::Error::Config(format!(
                "clock_skew_secs must be at most {MAX_CLOCK_SKEW_SECS}, got: {}",
                config.oauth.clock_skew_secs
            )));
        }

        let token_endpoint = Url::parse(&config.oauth.token_endpoint)?;
        if !matches!(token_endpoint.scheme(), "http" | "https") {
            return Err(common::Error::Config(format!(
                "token_endpoint must start with http:// or https://, got: {}",
                config.oauth.token_endpoint
            )));
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("OAUTH_CLIENT_SECRET") {
            config.oauth.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.oauth.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.oauth.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("beer-client.toml")
    }
}
