//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{CredentialRevealResponse, ErrorResponse, HealthResponse, ProfileResponse},
    SensitiveFields, ServiceError,
};
use tracing::{info, warn};
use uuid::Uuid;
use vault::StoreError;

use super::state::AppState;

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the profile store answers a ping.
/// Returns `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let database_ready = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "profile store ping failed");
            false
        }
    };

    let (status_code, status_str) = if database_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        database_ready,
    };
    (status_code, Json(body)).into_response()
}

/// `PUT /profiles/{id}` — encrypt the supplied sensitive fields and store them.
///
/// Fields absent from the body keep their stored value. Responds with the
/// masked summary of the saved profile.
pub async fn put_profile(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<SensitiveFields>, JsonRejection>,
) -> Response {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    let Json(fields) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(ServiceError::BadRequest(format!(
                "invalid request body: {}",
                rejection.body_text()
            )))
        }
    };
    if fields.is_empty() {
        return error_response(ServiceError::BadRequest(
            "request contains no sensitive fields".into(),
        ));
    }

    let encrypted = match state.cipher.encrypt_profile_data(&fields) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, profile_id = %id, "encryption failed");
            return error_response(ServiceError::EncryptionFailure("encryption failed".into()));
        }
    };

    match state.store.save(id, &encrypted).await {
        Ok(saved) => {
            info!(profile_id = %id, "profile saved");
            (StatusCode::OK, Json(state.cipher.masked_summary(&saved))).into_response()
        }
        Err(e) => error_response(store_error(e)),
    }
}

/// `GET /profiles/{id}` — every stored field, decrypted.
///
/// Undecryptable fields are returned as stored (fail-open).
pub async fn get_profile(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let profile = match load(&state, &raw_id).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };
    let body = ProfileResponse {
        id: profile.id,
        fields: state.cipher.decrypt_profile_data(&profile.fields),
        updated_at: profile.updated_at,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /profiles/{id}/summary` — masked view for list and summary screens.
pub async fn get_profile_summary(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    match load(&state, &raw_id).await {
        Ok(profile) => (StatusCode::OK, Json(state.cipher.masked_summary(&profile))).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /profiles/{id}/credentials/{kind}/reveal` — one-time credential reveal.
///
/// Uses safe decryption: a value that cannot be decrypted is reported as
/// `null`, never echoed back in its stored form.
pub async fn reveal_credential(
    State(state): State<AppState>,
    Path((raw_id, raw_kind)): Path<(String, String)>,
) -> Response {
    let kind = match CredentialKind::parse(&raw_kind) {
        Some(k) => k,
        None => {
            return error_response(ServiceError::BadRequest(format!(
                "unknown credential kind: {raw_kind}"
            )))
        }
    };
    let profile = match load(&state, &raw_id).await {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    let (username_field, password_field) = kind.field_names();
    let (username, password) = kind.select(&profile.fields);
    let username = username.and_then(|v| state.cipher.safe_decrypt(v, username_field));
    let password = password.and_then(|v| state.cipher.safe_decrypt(v, password_field));
    let available = username.is_some() && password.is_some();

    info!(
        profile_id = %profile.id,
        kind = kind.as_str(),
        available,
        "credential revealed"
    );

    let body = CredentialRevealResponse {
        kind: kind.as_str().into(),
        username,
        password,
        available,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Credential pairs that can be revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialKind {
    /// Third-party tax-filing portal (email + password).
    Portal,
    Irs,
    State,
}

impl CredentialKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "portal" => Some(Self::Portal),
            "irs" => Some(Self::Irs),
            "state" => Some(Self::State),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Portal => "portal",
            Self::Irs => "irs",
            Self::State => "state",
        }
    }

    fn field_names(self) -> (&'static str, &'static str) {
        match self {
            Self::Portal => ("portal_email", "portal_password"),
            Self::Irs => ("irs_username", "irs_password"),
            Self::State => ("state_username", "state_password"),
        }
    }

    fn select(self, fields: &SensitiveFields) -> (Option<&str>, Option<&str>) {
        let (user, pass) = match self {
            Self::Portal => (&fields.portal_email, &fields.portal_password),
            Self::Irs => (&fields.irs_username, &fields.irs_password),
            Self::State => (&fields.state_username, &fields.state_password),
        };
        (user.as_deref(), pass.as_deref())
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::BadRequest(format!("invalid profile id: {raw}")))
}

async fn load(state: &AppState, raw_id: &str) -> Result<vault::StoredProfile, ServiceError> {
    let id = parse_id(raw_id)?;
    state
        .store
        .get(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("profile {id}")))
}

fn store_error(e: StoreError) -> ServiceError {
    warn!(error = %e, "profile store error");
    ServiceError::Unavailable("profile store unavailable".into())
}

fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(&err))).into_response()
}
