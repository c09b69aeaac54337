//! Vault routes.
//!
//! The capability token travels in the `x-vault-key` header; product and
//! secret names in `x-product-name` / `x-secret-name`. Vault creation is
//! gated by the `x-api-key` admin credential, compared in constant time.
//! Handlers stay thin — every invariant lives in `cove-core`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use cove_core::engine::{parse_payload, DecryptedSecret, DecryptedVault, VaultPayload};

use crate::error::AppError;
use crate::state::AppState;

/// Build the application router with tracing and response-header layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/create_vault", post(create_vault))
        .route("/decrypt_vault", get(decrypt_vault))
        .route("/decrypt_secret", get(decrypt_secret))
        .route("/update_vault", post(update_vault))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateVaultResponse {
    message: &'static str,
    #[serde(rename = "x-vault-key")]
    x_vault_key: String,
}

#[derive(Debug, Serialize)]
struct UpdateVaultResponse {
    message: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Liveness check.
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a new vault, admin-gated. The returned `x-vault-key` is shown
/// once — the salt inside it is never persisted server-side.
async fn create_vault(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateVaultResponse>), AppError> {
    check_admin_key(&state, &headers)?;

    let payload = if body.is_empty() {
        None
    } else {
        Some(parse_payload(&body)?)
    };

    let (token, _record) = state.engine.create_vault(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateVaultResponse {
            message: "vault created successfully",
            x_vault_key: token.full_key(),
        }),
    ))
}

/// Decrypt a whole vault, or one product when `x-product-name` is set.
async fn decrypt_vault(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DecryptedVault>, AppError> {
    let vault_key = require_header(&headers, "x-vault-key")?;
    let product = optional_header(&headers, "x-product-name");

    let decrypted = state.engine.decrypt_vault(vault_key, product).await?;
    Ok(Json(decrypted))
}

/// Decrypt a single secret.
async fn decrypt_secret(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DecryptedSecret>, AppError> {
    let vault_key = require_header(&headers, "x-vault-key")?;
    let product = require_header(&headers, "x-product-name")?;
    let secret = require_header(&headers, "x-secret-name")?;

    let decrypted = state.engine.decrypt_secret(vault_key, product, secret).await?;
    Ok(Json(decrypted))
}

/// Apply a partial update. An empty body is a valid empty payload — it
/// still advances the vault version.
async fn update_vault(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UpdateVaultResponse>, AppError> {
    let vault_key = require_header(&headers, "x-vault-key")?;

    let payload = if body.is_empty() {
        VaultPayload::new()
    } else {
        parse_payload(&body)?
    };

    state.engine.update_vault(vault_key, payload).await?;

    Ok(Json(UpdateVaultResponse {
        message: "vault updated successfully",
    }))
}

// ── Helpers ──────────────────────────────────────────────────────────

fn require_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("missing or invalid {name} header")))
}

fn optional_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Constant-time admin credential check. With no key configured, creation
/// is refused outright rather than left open.
fn check_admin_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.admin_api_key.as_deref() else {
        return Err(AppError::Forbidden(
            "vault creation is disabled: no admin API key configured".to_owned(),
        ));
    };

    let supplied = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if bool::from(supplied.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Forbidden("invalid API key".to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use cove_core::engine::VaultEngine;
    use cove_storage::MemoryBackend;
    use tower::ServiceExt;

    const TEST_API_KEY: &str = "test-admin-key";

    fn test_app() -> Router {
        let engine = Arc::new(
            VaultEngine::new(Arc::new(MemoryBackend::new())).with_kdf_iterations(1_000),
        );
        router(Arc::new(AppState {
            engine,
            admin_api_key: Some(TEST_API_KEY.to_owned()),
        }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_reports_ok() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn create_without_api_key_is_forbidden() {
        let response = test_app()
            .oneshot(Request::post("/create_vault").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_with_wrong_api_key_is_forbidden() {
        let response = test_app()
            .oneshot(
                Request::post("/create_vault")
                    .header("x-api-key", "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_update_decrypt_over_http() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/create_vault")
                    .header("x-api-key", TEST_API_KEY)
                    .body(Body::from(r#"{"app": {"db_password": "hunter2"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let vault_key = created["x-vault-key"].as_str().unwrap().to_owned();

        let response = app
            .clone()
            .oneshot(
                Request::post("/update_vault")
                    .header("x-vault-key", &vault_key)
                    .body(Body::from(r#"{"app": {"api_key": "k-1"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::get("/decrypt_vault")
                    .header("x-vault-key", &vault_key)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["app"]["db_password"], "hunter2");
        assert_eq!(json["data"]["app"]["api_key"], "k-1");
        assert_eq!(json["vault_metadata"]["version"], 2);

        let response = app
            .oneshot(
                Request::get("/decrypt_secret")
                    .header("x-vault-key", &vault_key)
                    .header("x-product-name", "app")
                    .header("x-secret-name", "db_password")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"], "hunter2");
    }

    #[tokio::test]
    async fn decrypt_without_token_header_is_bad_request() {
        let response = test_app()
            .oneshot(Request::get("/decrypt_vault").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_update_payload_is_bad_request() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/create_vault")
                    .header("x-api-key", TEST_API_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let created = body_json(response).await;
        let vault_key = created["x-vault-key"].as_str().unwrap().to_owned();

        let response = app
            .oneshot(
                Request::post("/update_vault")
                    .header("x-vault-key", &vault_key)
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_vault_is_not_found() {
        let token = cove_core::token::VaultKeyToken::generate();
        let response = test_app()
            .oneshot(
                Request::get("/decrypt_vault")
                    .header("x-vault-key", token.full_key())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
