//! share-server: token-gated file sharing API
//!
//! Usage:
//! - `share-server` runs the HTTP server
//! - `share-server token` prints the token valid for the current minute

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use share_core::config::SECRET_ENV_VAR;
use share_core::{Config, TokenAuthority};
use share_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "share_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    // A missing secret is fatal
    let secret = config
        .server
        .shared_secret(std::env::var(SECRET_ENV_VAR).ok())
        .context("cannot start without a shared secret")?;

    if std::env::args().nth(1).as_deref() == Some("token") {
        println!("{}", TokenAuthority::new(secret).issue());
        return Ok(());
    }

    config
        .server
        .ensure_roots()
        .context("failed to create serving directories")?;
    tracing::info!("Images directory: {}", config.server.images_dir().display());
    tracing::info!("Text directory: {}", config.server.text_dir().display());

    let state = Arc::new(AppState::from_config(secret, &config.server));
    let app = share_server::router(state);

    // Start server
    let addr = SocketAddr::from((
        config.server.listen_addr.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!("share-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
