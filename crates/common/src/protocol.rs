//! Request and response types exchanged over the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::SensitiveFields;

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Response body for `GET /profiles/{id}`: every stored field, decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: SensitiveFields,
    pub updated_at: DateTime<Utc>,
}

/// Masked view of a profile for list and summary screens.
///
/// Only the last four characters of SSN and bank numbers survive masking.
/// Credential values are never included; only whether they are on file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskedProfileResponse {
    pub id: Uuid,
    pub ssn: Option<String>,
    pub bank_routing_number: Option<String>,
    pub bank_account_number: Option<String>,
    pub portal_email: Option<String>,
    pub has_address: bool,
    pub has_portal_credentials: bool,
    pub has_irs_credentials: bool,
    pub has_state_credentials: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Credential reveal
// ---------------------------------------------------------------------------

/// Response body for `POST /profiles/{id}/credentials/{kind}/reveal`.
///
/// A `null` value means the stored field is absent or could not be decrypted;
/// the raw stored text is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRevealResponse {
    /// Which credential pair was revealed (`portal`, `irs`, `state`).
    pub kind: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `true` only when both halves decrypted successfully.
    pub available: bool,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the profile store answered a ping.
    pub database_ready: bool,
}
