//! `portal-api` — HTTP service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP export).
//! 3. Build the [`FieldCipher`] from `ENCRYPTION_KEY`; refuse to start without it.
//! 4. Connect the profile store (PostgreSQL, or in-memory when unset).
//! 5. Build the Axum router and start the server.

mod config;
mod server;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use vault::{FieldCipher, MemoryProfileStore, PgProfileStore, ProfileStore};

use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        http_port = cfg.http_port,
        "portal-api starting"
    );

    // -----------------------------------------------------------------------
    // 3. Field cipher (after telemetry so its counter binds the real meter)
    // -----------------------------------------------------------------------
    let cipher = Arc::new(
        FieldCipher::new(&cfg.encryption_key).context("failed to initialise field cipher")?,
    );

    // -----------------------------------------------------------------------
    // 4. Profile store
    // -----------------------------------------------------------------------
    let store: Arc<dyn ProfileStore> = match &cfg.database_url {
        Some(url) => Arc::new(
            PgProfileStore::connect(url, cfg.database_max_connections)
                .await
                .context("failed to connect to profile database")?,
        ),
        None => {
            warn!("DATABASE_URL not set; profiles are kept in memory and lost on exit");
            Arc::new(MemoryProfileStore::new())
        }
    };

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(cipher, store);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.http_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
