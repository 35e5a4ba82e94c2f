//! API error type.
//!
//! Every API failure becomes a JSON body `{"error": code, "message": text}`.
//! Messages of 500-class errors are logged and replaced before they reach
//! the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bob_alias::AliasError;
use bob_bundle::BundleError;
use bob_resolve::ResolveError;
use bob_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Alias(#[from] AliasError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload exceeds the request size limit")]
    PayloadTooLarge,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ServerError {
    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        const BAD: StatusCode = StatusCode::BAD_REQUEST;
        const INTERNAL: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
        match self {
            Self::Bundle(e) => match e {
                BundleError::Integrity(_) => (BAD, "integrity_mismatch"),
                BundleError::MissingEntrypoint => (BAD, "missing_entrypoint"),
                BundleError::InvalidArchive(_) => (BAD, "invalid_archive"),
                BundleError::UnsafePath { .. } => (BAD, "unsafe_path"),
                BundleError::TooLarge(_) => (BAD, "bundle_too_large"),
            },
            Self::Store(StoreError::StorageWrite { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_write_failed")
            }
            Self::Store(_) => INTERNAL,
            Self::Alias(e) => match e {
                AliasError::Conflict { .. } => (BAD, "alias_conflict"),
                AliasError::UnknownArtifact(_) => (BAD, "unknown_artifact"),
                AliasError::InvalidAlias { .. } => (BAD, "invalid_alias"),
                AliasError::Backend(_) => INTERNAL,
            },
            Self::ArtifactNotFound(_) => (StatusCode::NOT_FOUND, "artifact_not_found"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest(_) => (BAD, "bad_request"),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "bundle_too_large"),
            Self::Resolve(_)
            | Self::Config(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Internal(_) => INTERNAL,
        }
    }

    /// Client-facing message.
    fn public_message(&self, status: StatusCode) -> String {
        if !status.is_server_error() {
            return self.to_string();
        }
        match self {
            Self::Store(StoreError::StorageWrite { .. }) => {
                "failed to store the artifact; the upload can be retried".to_string()
            }
            _ => "an internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        let body = ErrorBody {
            error: code,
            message: self.public_message(status),
        };
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
