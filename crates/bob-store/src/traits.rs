use async_trait::async_trait;
use bob_types::ArtifactHash;
use bytes::Bytes;

use crate::error::{BlobResult, StoreResult};
use crate::record::{ArtifactRecord, InsertOutcome};

/// Flat key-value storage for artifact files.
///
/// Keys are `/`-separated relative paths of the form `{hash}/{path}`.
/// Blobs are write-once: implementations must refuse to overwrite and
/// report [`BlobError::AlreadyExists`](crate::BlobError::AlreadyExists)
/// instead, which content-addressed callers treat as success.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key` unless something is already there.
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<()>;

    /// Fetch a blob. Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> BlobResult<Option<Bytes>>;

    /// Keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> BlobResult<Vec<String>>;

    /// Whether a blob exists under `key`.
    async fn contains(&self, key: &str) -> BlobResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Metadata index keyed by artifact hash.
#[async_trait]
pub trait ArtifactIndex: Send + Sync {
    async fn get(&self, hash: &ArtifactHash) -> StoreResult<Option<ArtifactRecord>>;

    /// Insert a record. A record already present for the same hash is
    /// left untouched and returned as [`InsertOutcome::Existing`].
    async fn insert(&self, record: &ArtifactRecord) -> StoreResult<InsertOutcome>;
}
