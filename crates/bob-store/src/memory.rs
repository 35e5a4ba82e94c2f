use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bob_types::ArtifactHash;
use bytes::Bytes;

use crate::error::{BlobError, BlobResult, StoreResult};
use crate::record::{ArtifactRecord, InsertOutcome};
use crate::traits::{ArtifactIndex, BlobStore};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Counts successful writes so callers
/// can observe deduplication.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
    writes: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Number of `put` calls that stored new data.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> Vec<String> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop a blob, simulating a partially written artifact.
    pub fn remove(&self, key: &str) -> bool {
        self.blobs.write().expect("lock poisoned").remove(key).is_some()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        if map.contains_key(key) {
            return Err(BlobError::AlreadyExists {
                key: key.to_string(),
            });
        }
        map.insert(key.to_string(), data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Option<Bytes>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<String> = map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn contains(&self, key: &str) -> BlobResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("writes", &self.write_count())
            .finish()
    }
}

/// In-memory artifact metadata index.
#[derive(Default)]
pub struct InMemoryArtifactIndex {
    records: RwLock<HashMap<ArtifactHash, ArtifactRecord>>,
}

impl InMemoryArtifactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactIndex for InMemoryArtifactIndex {
    async fn get(&self, hash: &ArtifactHash) -> StoreResult<Option<ArtifactRecord>> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(hash).cloned())
    }

    async fn insert(&self, record: &ArtifactRecord) -> StoreResult<InsertOutcome> {
        let mut map = self.records.write().expect("lock poisoned");
        if let Some(existing) = map.get(&record.hash) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        map.insert(record.hash, record.clone());
        Ok(InsertOutcome::Inserted)
    }
}

impl std::fmt::Debug for InMemoryArtifactIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryArtifactIndex")
            .field("record_count", &self.len())
            .finish()
    }
}
