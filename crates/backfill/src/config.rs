//! Configuration loading and validation for the backfill job.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated backfill configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Passphrase the field-cipher key is derived from. **Required.** Must be
    /// the same passphrase the API runs with.
    #[serde(default)]
    pub encryption_key: String,

    /// PostgreSQL connection string. **Required.**
    #[serde(default)]
    pub database_url: String,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &"[REDACTED]")
            .field("database_url", &"[REDACTED]")
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build backfill configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise backfill configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Key length is checked by the cipher itself; presence is checked here.
    fn validate(&self) -> Result<()> {
        if self.encryption_key.is_empty() {
            anyhow::bail!("ENCRYPTION_KEY is required and must not be empty");
        }
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is required and must not be empty");
        }
        Ok(())
    }
}
