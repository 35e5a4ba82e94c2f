use bob_crypto::HashError;

/// Errors from bundle normalization.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The declared hash does not describe the uploaded bytes.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] HashError),

    /// No root-level `index.html` after wrapper stripping.
    #[error("bundle must contain an index.html at its root")]
    MissingEntrypoint,

    /// The archive could not be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An entry path would escape the artifact namespace.
    #[error("unsafe entry path {path:?}: {reason}")]
    UnsafePath { path: String, reason: String },

    /// The archive exceeds the configured unpack limits.
    #[error("bundle too large: {0}")]
    TooLarge(String),
}

impl From<zip::result::ZipError> for BundleError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::InvalidArchive(err.to_string())
    }
}

/// Result alias for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;
