/// Errors from blob backends.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A blob is already stored under this key. Callers writing
    /// content-addressed data treat this as success.
    #[error("blob already exists: {key}")]
    AlreadyExists { key: String },

    /// The key cannot be mapped onto the backend.
    #[error("invalid blob key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("blob backend error: {0}")]
    Backend(String),
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors from artifact storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing an artifact failed part-way. Blobs already written stay in
    /// place and are reused by the next identical ingestion.
    #[error("failed to store {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    /// The metadata index failed.
    #[error("artifact index error: {0}")]
    Metadata(String),

    /// A stored row could not be decoded.
    #[error("corrupt artifact record {hash}: {reason}")]
    CorruptRecord { hash: String, reason: String },

    /// Reading a blob failed.
    #[error(transparent)]
    Blob(#[from] BlobError),
}

impl StoreError {
    pub(crate) fn write_failed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageWrite {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(hash: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptRecord {
            hash: hash.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Metadata(err.to_string())
    }
}

/// Result alias for artifact storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
