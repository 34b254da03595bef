//! Beer service CLI
//!
//! Single-binary client that:
//! 1. Loads the service location and OAuth registration from TOML
//! 2. Obtains a client-credentials token (cached for the process lifetime)
//! 3. Runs one beer operation with the token attached
//! 4. Prints the result as JSON on stdout; logs go to stderr

mod cli;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use beer_client::BeerClient;
use clap::Parser;
use oauth_client::{ClientRegistrationRepository, TokenProvider};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::ReqwestTransport;

use crate::cli::{Cli, Command};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support.
    // stdout carries the command output, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.service.beer.base_url,
        registration_id = %config.oauth.registration_id,
        token_endpoint = %config.oauth.token_endpoint,
        timeout_secs = config.service.timeout_secs,
        "configuration loaded"
    );

    let client = build_client(&config)?;
    let output = run(&client, cli.command).await?;
    println!("{output}");
    Ok(())
}

/// Wire the production stack: one reqwest client shared by the token
/// provider and the resource calls.
fn build_client(config: &Config) -> Result<BeerClient> {
    let http = ReqwestTransport::new(reqwest_client()?)
        .with_timeout(Duration::from_secs(config.service.timeout_secs));

    let registration = config
        .oauth
        .to_registration()
        .context("invalid OAuth client registration")?;
    let registration_id = registration.registration_id.clone();
    let registrations = ClientRegistrationRepository::new([registration])
        .context("invalid OAuth client registration")?;

    let provider = Arc::new(
        TokenProvider::new(registrations, Arc::new(http.clone()))
            .with_clock_skew(Duration::from_secs(config.oauth.clock_skew_secs)),
    );

    BeerClient::with_oauth(&config.service.beer, provider, registration_id, http)
        .context("invalid beer service configuration")
}

fn reqwest_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("beer-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Run one command and render its result as pretty JSON.
async fn run(client: &BeerClient, command: Command) -> Result<String> {
    let rendered = match command {
        Command::List(args) => serde_json::to_string_pretty(&client.list(&args.params()).await?)?,
        Command::Get { id } => serde_json::to_string_pretty(&client.get_by_id(id).await?)?,
        Command::Create(args) => {
            serde_json::to_string_pretty(&client.create(&args.into_beer()).await?)?
        }
        Command::Update { id, changes } => {
            let mut beer = client.get_by_id(id).await?;
            changes.apply(&mut beer);
            serde_json::to_string_pretty(&client.update(&beer).await?)?
        }
        Command::Delete { id } => {
            client.delete(id).await?;
            serde_json::to_string_pretty(&serde_json::json!({ "deleted": id }))?
        }
    };
    Ok(rendered)
}
