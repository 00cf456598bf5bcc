//! Configuration loading and validation for the API service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;
use vault::crypto::cipher::MIN_PASSPHRASE_CHARS;

/// Validated API service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Passphrase the field-cipher key is derived from. **Required**, at least
    /// 32 characters.
    #[serde(default)]
    pub encryption_key: String,

    /// PostgreSQL connection string. Profiles are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Port the HTTP server listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// OTLP collector endpoint. Traces and metrics are only exported when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_max_connections() -> u32 {
    5
}
fn default_http_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &"[REDACTED]")
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("database_max_connections", &self.database_max_connections)
            .field("http_port", &self.http_port)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.encryption_key.is_empty() {
            anyhow::bail!("ENCRYPTION_KEY is required and must not be empty");
        }
        if self.encryption_key.chars().count() < MIN_PASSPHRASE_CHARS {
            anyhow::bail!("ENCRYPTION_KEY must be at least {MIN_PASSPHRASE_CHARS} characters");
        }
        if let Some(url) = &self.database_url {
            if url.trim().is_empty() {
                anyhow::bail!("DATABASE_URL must not be empty when set");
            }
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }
        Ok(())
    }
}
