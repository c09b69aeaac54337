//! HTTP error types for the Cove server.
//!
//! Maps domain errors from `cove-core` into HTTP responses. Every error
//! produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`. Authentication failures stay opaque — the
//! message never distinguishes a wrong salt from tampered data.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use cove_core::error::{CryptoError, VaultError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Client sent invalid input (malformed token, payload, or headers).
    BadRequest(String),
    /// Field authentication failed — the presented salt cannot decrypt.
    Unauthorized(String),
    /// Admin credential missing or invalid.
    Forbidden(String),
    /// Vault, product, or secret not found.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Token(_) | VaultError::PayloadFormat { .. } => {
                Self::BadRequest(err.to_string())
            }

            VaultError::VaultNotFound
            | VaultError::ProductNotFound { .. }
            | VaultError::SecretNotFound { .. } => Self::NotFound(err.to_string()),

            VaultError::Crypto(CryptoError::Authentication) => {
                Self::Unauthorized(err.to_string())
            }

            VaultError::Crypto(_) | VaultError::Serialization { .. } | VaultError::Store(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cove_core::error::TokenError;
    use cove_storage::StoreError;

    #[test]
    fn token_errors_map_to_bad_request() {
        let err = VaultError::Token(TokenError::Format {
            reason: "expected 3 segments".to_owned(),
        });
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[test]
    fn not_found_family_maps_to_not_found() {
        assert!(matches!(
            AppError::from(VaultError::VaultNotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(VaultError::ProductNotFound {
                name: "app".to_owned()
            }),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn authentication_maps_to_unauthorized_without_detail() {
        let err = VaultError::Crypto(CryptoError::Authentication);
        let mapped = AppError::from(err);
        assert!(
            matches!(&mapped, AppError::Unauthorized(msg) if msg == "field authentication failed"),
            "unexpected mapping: {mapped:?}"
        );
    }

    #[test]
    fn store_errors_map_to_internal() {
        let err = VaultError::Store(StoreError::Write {
            reason: "connection reset".to_owned(),
        });
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }
}
