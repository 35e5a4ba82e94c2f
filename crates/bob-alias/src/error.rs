//! Error types for alias operations.

use bob_store::StoreError;
use thiserror::Error;

/// Errors that can occur during alias operations.
#[derive(Debug, Error)]
pub enum AliasError {
    /// The principal already owns a deployment under this alias.
    #[error("a deployment named {alias} already exists")]
    Conflict { principal: String, alias: String },

    /// The referenced artifact has not been ingested.
    #[error("artifact not found: {0}")]
    UnknownArtifact(String),

    /// The requested name normalizes to nothing usable.
    #[error("invalid alias {raw:?}: {reason}")]
    InvalidAlias { raw: String, reason: String },

    /// The deployment store or artifact store failed.
    #[error("alias backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AliasError {
    fn from(err: StoreError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<sqlx::Error> for AliasError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Convenience type alias for alias operations.
pub type Result<T> = std::result::Result<T, AliasError>;
