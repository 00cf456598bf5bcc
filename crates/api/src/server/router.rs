//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/profiles/:id",
            get(handlers::get_profile).put(handlers::put_profile),
        )
        .route("/profiles/:id/summary", get(handlers::get_profile_summary))
        .route(
            "/profiles/:id/credentials/:kind/reveal",
            post(handlers::reveal_credential),
        )
        .fallback(handlers::not_found)
        .layer(middleware::no_store())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use axum_test::TestServer;
    use common::{
        protocol::{CredentialRevealResponse, ErrorResponse, MaskedProfileResponse, ProfileResponse},
        SensitiveFields,
    };
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;
    use vault::{crypto::EncodedValue, FieldCipher, MemoryProfileStore, ProfileStore};

    const PASSPHRASE: &str = "router-tests-passphrase-0123456789ab";

    fn cipher() -> Arc<FieldCipher> {
        Arc::new(FieldCipher::new(PASSPHRASE).unwrap())
    }

    /// Test server plus a handle on its store for inspecting stored columns.
    fn server() -> (TestServer, MemoryProfileStore, Arc<FieldCipher>) {
        let store = MemoryProfileStore::new();
        let cipher = cipher();
        let state = AppState::new(cipher.clone(), Arc::new(store.clone()));
        (TestServer::new(build(state)).unwrap(), store, cipher)
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::in_memory(cipher()));
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.headers()["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn health_route_exists() {
        let (server, _, _) = server();
        let resp = server.get("/health").await;
        resp.assert_status_ok();
        resp.assert_json(&json!({"status": "ok", "database_ready": true}));
    }

    #[tokio::test]
    async fn put_encrypts_at_rest_and_returns_masked_summary() {
        let (server, store, _) = server();
        let id = Uuid::new_v4();

        let resp = server
            .put(&format!("/profiles/{id}"))
            .json(&json!({
                "ssn": "123-45-6789",
                "bank_account_number": "000123456789",
                "portal_email": "john.doe@example.com"
            }))
            .await;
        resp.assert_status_ok();
        let summary: MaskedProfileResponse = resp.json();
        assert_eq!(summary.ssn.as_deref(), Some("***-**-6789"));
        assert_eq!(summary.bank_account_number.as_deref(), Some("****6789"));
        assert_eq!(summary.portal_email.as_deref(), Some("jo****@example.com"));
        assert!(summary.bank_routing_number.is_none());

        let stored = store.get(id).await.unwrap().unwrap();
        let ssn = stored.fields.ssn.unwrap();
        assert_ne!(ssn, "123-45-6789");
        assert!(vault::crypto::looks_encoded(&ssn));
        assert!(stored.fields.address.is_none());
    }

    #[tokio::test]
    async fn get_returns_decrypted_profile() {
        let (server, _, _) = server();
        let id = Uuid::new_v4();
        server
            .put(&format!("/profiles/{id}"))
            .json(&json!({"address": "742 Evergreen Terrace", "irs_username": "jdoe"}))
            .await
            .assert_status_ok();

        let profile: ProfileResponse = server.get(&format!("/profiles/{id}")).await.json();
        assert_eq!(profile.id, id);
        assert_eq!(
            profile.fields,
            SensitiveFields {
                address: Some("742 Evergreen Terrace".into()),
                irs_username: Some("jdoe".into()),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let (server, _, _) = server();
        let id = Uuid::new_v4();
        server
            .put(&format!("/profiles/{id}"))
            .json(&json!({"ssn": "123-45-6789", "address": "old"}))
            .await
            .assert_status_ok();
        server
            .put(&format!("/profiles/{id}"))
            .json(&json!({"address": "new"}))
            .await
            .assert_status_ok();

        let profile: ProfileResponse = server.get(&format!("/profiles/{id}")).await.json();
        assert_eq!(profile.fields.ssn.as_deref(), Some("123-45-6789"));
        assert_eq!(profile.fields.address.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn summary_of_legacy_plaintext_row() {
        let (server, store, _) = server();
        let id = Uuid::new_v4();
        store
            .save(
                id,
                &SensitiveFields {
                    bank_routing_number: Some("021000021".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let summary: MaskedProfileResponse =
            server.get(&format!("/profiles/{id}/summary")).await.json();
        assert_eq!(summary.bank_routing_number.as_deref(), Some("****0021"));
    }

    #[tokio::test]
    async fn reveal_decrypts_credentials() {
        let (server, _, _) = server();
        let id = Uuid::new_v4();
        server
            .put(&format!("/profiles/{id}"))
            .json(&json!({"state_username": "jdoe-ny", "state_password": "s3cret"}))
            .await
            .assert_status_ok();

        let resp = server
            .post(&format!("/profiles/{id}/credentials/state/reveal"))
            .await;
        resp.assert_status_ok();
        let body: CredentialRevealResponse = resp.json();
        assert_eq!(body.username.as_deref(), Some("jdoe-ny"));
        assert_eq!(body.password.as_deref(), Some("s3cret"));
        assert!(body.available);
    }

    #[tokio::test]
    async fn reveal_of_corrupted_credential_returns_null() {
        let (server, store, cipher) = server();
        let id = Uuid::new_v4();
        let good_user = cipher.encrypt("jdoe").unwrap();
        let mut value = EncodedValue::parse(&cipher.encrypt("irs-pass").unwrap()).unwrap();
        value.ciphertext[0] ^= 0xFF;
        let corrupted = value.to_string();
        store
            .save(
                id,
                &SensitiveFields {
                    irs_username: Some(good_user),
                    irs_password: Some(corrupted.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let body: CredentialRevealResponse = server
            .post(&format!("/profiles/{id}/credentials/irs/reveal"))
            .await
            .json();
        assert_eq!(body.username.as_deref(), Some("jdoe"));
        assert_eq!(body.password, None);
        assert!(!body.available);

        // The fail-open read path still echoes the stored text.
        let profile: ProfileResponse = server.get(&format!("/profiles/{id}")).await.json();
        assert_eq!(profile.fields.irs_password.as_deref(), Some(corrupted.as_str()));
    }

    #[tokio::test]
    async fn reveal_rejects_unknown_kind() {
        let (server, _, _) = server();
        let resp = server
            .post(&format!("/profiles/{}/credentials/bank/reveal", Uuid::new_v4()))
            .await;
        resp.assert_status_bad_request();
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn unknown_profile_returns_404() {
        let (server, _, _) = server();
        let resp = server.get(&format!("/profiles/{}", Uuid::new_v4())).await;
        resp.assert_status_not_found();
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "not_found");
    }

    #[tokio::test]
    async fn invalid_id_returns_400() {
        let (server, _, _) = server();
        server
            .get("/profiles/not-a-uuid/summary")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn empty_put_is_rejected() {
        let (server, store, _) = server();
        server
            .put(&format!("/profiles/{}", Uuid::new_v4()))
            .json(&json!({}))
            .await
            .assert_status_bad_request();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn malformed_json_body_returns_error_envelope() {
        let store = MemoryProfileStore::new();
        let app = build(AppState::new(cipher(), Arc::new(store.clone())));
        let req = Request::builder()
            .method("PUT")
            .uri(format!("/profiles/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 400);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let err: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err.code, "bad_request");
        assert!(store.is_empty().await);
    }
}
