/// Adsight account service
///
/// Issues and validates access credentials, manages the password lifecycle,
/// and enforces admin authorization for the Adsight platform.

mod account;
mod api;
mod auth;
mod config;
mod context;
mod crypto;
mod db;
mod error;
mod mailer;
mod server;
mod validation;

use config::AppConfig;
use context::AppContext;
use error::AuthResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AuthResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adsight_accounts=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
