use std::sync::Arc;

use bob_bundle::NormalizedBundle;
use bob_types::ArtifactHash;
use bytes::Bytes;

use crate::error::{BlobError, StoreError, StoreResult};
use crate::record::{ArtifactRecord, CreateOutcome, InsertOutcome};
use crate::traits::{ArtifactIndex, BlobStore};

/// Immutable, content-addressed artifact storage.
///
/// Files live in the blob store at `{hash}/{path}`; one metadata record
/// per artifact lives in the index. Blobs are written before the record,
/// so a record only ever describes a complete artifact. An interrupted
/// ingestion leaves orphan blobs that the next identical ingestion
/// completes.
#[derive(Clone)]
pub struct ArtifactStore {
    blobs: Arc<dyn BlobStore>,
    index: Arc<dyn ArtifactIndex>,
}

impl ArtifactStore {
    pub fn new(blobs: Arc<dyn BlobStore>, index: Arc<dyn ArtifactIndex>) -> Self {
        Self { blobs, index }
    }

    pub async fn exists(&self, hash: &ArtifactHash) -> StoreResult<bool> {
        Ok(self.index.get(hash).await?.is_some())
    }

    pub async fn get(&self, hash: &ArtifactHash) -> StoreResult<Option<ArtifactRecord>> {
        self.index.get(hash).await
    }

    /// Store a normalized bundle.
    ///
    /// Storing a bundle whose hash is already recorded writes nothing and
    /// returns the existing record.
    pub async fn create(
        &self,
        bundle: &NormalizedBundle,
    ) -> StoreResult<(ArtifactRecord, CreateOutcome)> {
        let hash = bundle.hash;
        if let Some(existing) = self.index.get(&hash).await? {
            tracing::debug!(hash = %hash.short_hex(), "artifact already stored");
            return Ok((existing, CreateOutcome::Existing));
        }

        for entry in &bundle.entries {
            let key = hash.blob_key(&entry.path);
            match self.blobs.put(&key, entry.data.clone()).await {
                Ok(()) => tracing::debug!(key = %key, bytes = entry.data.len(), "blob written"),
                Err(BlobError::AlreadyExists { .. }) => {
                    tracing::debug!(key = %key, "blob already present")
                }
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "blob write failed");
                    return Err(StoreError::write_failed(key, e));
                }
            }
        }

        let file_count = u32::try_from(bundle.file_count())
            .map_err(|_| StoreError::write_failed(hash.blob_prefix(), "too many files"))?;
        let record = ArtifactRecord::new(hash, bundle.size, file_count);

        match self.index.insert(&record).await {
            Ok(InsertOutcome::Inserted) => {
                tracing::info!(
                    hash = %hash,
                    size = record.size,
                    files = record.file_count,
                    "artifact created"
                );
                Ok((record, CreateOutcome::Created))
            }
            Ok(InsertOutcome::Existing(existing)) => Ok((existing, CreateOutcome::Existing)),
            Err(e) => {
                tracing::error!(hash = %hash, error = %e, "artifact record insert failed");
                Err(StoreError::write_failed(format!("artifacts/{hash}"), e))
            }
        }
    }

    /// Read one file of an artifact. `Ok(None)` when the file is absent.
    pub async fn read_file(&self, hash: &ArtifactHash, path: &str) -> StoreResult<Option<Bytes>> {
        match self.blobs.get(&hash.blob_key(path)).await {
            Ok(data) => Ok(data),
            Err(BlobError::InvalidKey { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Relative paths of every stored file of an artifact, sorted.
    pub async fn list_files(&self, hash: &ArtifactHash) -> StoreResult<Vec<String>> {
        let prefix = hash.blob_prefix();
        let keys = self.blobs.list(&prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryArtifactIndex, InMemoryBlobStore};
    use async_trait::async_trait;
    use bob_bundle::Normalizer;
    use bob_crypto::BundleHasher;
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn bundle(files: &[(&str, &str)]) -> NormalizedBundle {
        let raw = zip(files);
        let hash = BundleHasher::digest(&raw).to_hex();
        Normalizer::default().normalize(&raw, &hash).unwrap()
    }

    fn site() -> NormalizedBundle {
        bundle(&[
            ("index.html", "<html><head></head><body>hi</body></html>"),
            ("style.css", "body{color:red}"),
        ])
    }

    fn memory_store() -> (Arc<InMemoryBlobStore>, Arc<InMemoryArtifactIndex>, ArtifactStore) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let index = Arc::new(InMemoryArtifactIndex::new());
        let store = ArtifactStore::new(blobs.clone(), index.clone());
        (blobs, index, store)
    }

    #[tokio::test]
    async fn create_writes_blobs_and_record() {
        let (blobs, _index, store) = memory_store();
        let bundle = site();

        let (record, outcome) = store.create(&bundle).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(record.hash, bundle.hash);
        assert_eq!(record.size, bundle.size);
        assert_eq!(record.file_count, 2);
        assert!(store.exists(&bundle.hash).await.unwrap());

        assert_eq!(
            blobs.keys(),
            vec![bundle.hash.blob_key("index.html"), bundle.hash.blob_key("style.css")]
        );
        let css = store.read_file(&bundle.hash, "style.css").await.unwrap().unwrap();
        assert_eq!(&css[..], b"body{color:red}");
    }

    #[tokio::test]
    async fn list_files_returns_relative_paths() {
        let (_blobs, _index, store) = memory_store();
        let bundle = site();
        store.create(&bundle).await.unwrap();

        let files = store.list_files(&bundle.hash).await.unwrap();
        assert_eq!(files, vec!["index.html".to_string(), "style.css".to_string()]);
        let other = ArtifactHash::from_digest([3u8; 32]);
        assert!(store.list_files(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identical_bundle_writes_nothing_the_second_time() {
        let (blobs, _index, store) = memory_store();
        let (first, _) = store.create(&site()).await.unwrap();
        let writes = blobs.write_count();

        let (second, outcome) = store.create(&site()).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Existing);
        assert_eq!(second, first);
        assert_eq!(blobs.write_count(), writes);
    }

    #[tokio::test]
    async fn one_byte_difference_is_a_distinct_artifact() {
        let (_blobs, index, store) = memory_store();
        let a = bundle(&[("index.html", "<p>a</p>")]);
        let b = bundle(&[("index.html", "<p>b</p>")]);
        assert_ne!(a.hash, b.hash);

        store.create(&a).await.unwrap();
        let (_, outcome) = store.create(&b).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_duplicates_converge_on_one_record() {
        let (_blobs, index, store) = memory_store();
        let bundle = site();

        let (a, b) = tokio::join!(store.create(&bundle), store.create(&bundle));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.0.hash, b.0.hash);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn partial_artifact_is_completed_by_retry() {
        let blobs = Arc::new(FlakyBlobStore::failing_after(1));
        let index = Arc::new(InMemoryArtifactIndex::new());
        let store = ArtifactStore::new(blobs.clone(), index.clone());
        let bundle = site();

        let err = store.create(&bundle).await.unwrap_err();
        assert!(matches!(err, StoreError::StorageWrite { .. }));
        assert!(!store.exists(&bundle.hash).await.unwrap());
        assert_eq!(blobs.inner.len(), 1);

        blobs.heal();
        let (_, outcome) = store.create(&bundle).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(blobs.inner.len(), 2);
    }

    #[tokio::test]
    async fn orphan_blobs_do_not_block_creation() {
        let (blobs, _index, store) = memory_store();
        let bundle = site();
        blobs
            .put(&bundle.hash.blob_key("index.html"), Bytes::from_static(b"stale"))
            .await
            .unwrap();

        let (_, outcome) = store.create(&bundle).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(blobs.len(), 2);
    }

    #[tokio::test]
    async fn read_file_misses_are_none() {
        let (_blobs, _index, store) = memory_store();
        let bundle = site();
        store.create(&bundle).await.unwrap();
        assert!(store.read_file(&bundle.hash, "nope.js").await.unwrap().is_none());
    }

    /// Blob store that fails every write after the first `n`.
    struct FlakyBlobStore {
        inner: InMemoryBlobStore,
        remaining: AtomicUsize,
    }

    impl FlakyBlobStore {
        fn failing_after(n: usize) -> Self {
            Self {
                inner: InMemoryBlobStore::new(),
                remaining: AtomicUsize::new(n),
            }
        }

        fn heal(&self) {
            self.remaining.store(usize::MAX, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BlobStore for FlakyBlobStore {
        async fn put(&self, key: &str, data: Bytes) -> crate::BlobResult<()> {
            let left = self.remaining.load(Ordering::SeqCst);
            if left == 0 {
                return Err(BlobError::Backend("disk full".into()));
            }
            self.remaining.store(left - 1, Ordering::SeqCst);
            self.inner.put(key, data).await
        }

        async fn get(&self, key: &str) -> crate::BlobResult<Option<Bytes>> {
            self.inner.get(key).await
        }

        async fn list(&self, prefix: &str) -> crate::BlobResult<Vec<String>> {
            self.inner.list(prefix).await
        }
    }
}
