//! FlerteChat web server binary.

use std::sync::Arc;

use billing::{StripeClient, StripeConfig};
use database::Database;
use flerte::WebhookHandler;
use llm_client::OpenAiClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use web::{app, AppState, Config, SessionKeys};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting FlerteChat server");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let provider = OpenAiClient::from_env()?;
    // Generation gives up on a call when the HTTP client would.
    let call_timeout = provider.config().timeout;

    let stripe_config = StripeConfig::from_env()?;
    if stripe_config.webhook_secret.is_empty() {
        warn!("STRIPE_WEBHOOK_SECRET not set; every webhook will be rejected");
    }
    let webhooks = WebhookHandler::from_config(db.clone(), &stripe_config);
    let processor = StripeClient::new(stripe_config)?;

    let sessions = SessionKeys::new(&config.session_secret)
        .map_err(|e| format!("invalid SESSION_SECRET: {e}"))?
        .with_secure_cookies(config.public_url.starts_with("https://"));

    let state = AppState::new(db, sessions, Arc::new(provider), Arc::new(processor), webhooks)
        .with_public_url(config.public_url.clone())
        .with_owner(config.owner_open_id.clone())
        .with_call_timeout(call_timeout);

    let static_dir = config.static_dir.is_dir().then(|| config.static_dir.clone());
    if static_dir.is_none() {
        warn!(dir = %config.static_dir.display(), "Static directory missing; serving API only");
    }

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "FlerteChat server listening");
    axum::serve(listener, app(state, static_dir)).await?;

    Ok(())
}
