//! `portal-backfill` — one-time migration entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`config::Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Build the field cipher and connect to the profile database.
//! 4. Run the backfill; exit non-zero if any record failed.
//!
//! Safe to re-run: already-encrypted values are left untouched.

mod config;
mod migrate;
mod telemetry;

use anyhow::{Context, Result};
use tracing::error;
use vault::{FieldCipher, PgProfileStore};

/// A single sequential job needs no more than one connection.
const MAX_CONNECTIONS: u32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        eprintln!("ERROR: backfill configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Cipher and store
    // -----------------------------------------------------------------------
    let cipher =
        FieldCipher::new(&cfg.encryption_key).context("failed to initialise field cipher")?;
    let store = PgProfileStore::connect(&cfg.database_url, MAX_CONNECTIONS)
        .await
        .context("failed to connect to profile database")?;

    // -----------------------------------------------------------------------
    // 4. Backfill
    // -----------------------------------------------------------------------
    let report = migrate::run(&store, &cipher)
        .await
        .context("failed to list profiles")?;

    if report.has_failures() {
        error!(failed = report.failed, "backfill finished with failures");
        anyhow::bail!("{} of {} profiles failed to migrate", report.failed, report.scanned);
    }
    Ok(())
}
