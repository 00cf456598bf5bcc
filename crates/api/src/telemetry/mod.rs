//! OpenTelemetry setup: structured logs, plus traces and metrics when an OTLP
//! collector is configured.
//!
//! # Telemetry invariants
//!
//! - **No PII or key material** must appear in any span attribute, metric label,
//!   or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence.

pub mod init;

pub use init::init_telemetry;
