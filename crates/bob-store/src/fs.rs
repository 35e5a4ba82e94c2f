//! Filesystem blob store.
//!
//! Layout:
//! ```text
//! {root}/
//! └── {hash}/
//!     ├── index.html
//!     └── css/
//!         └── site.css
//! ```
//!
//! Each blob is written to a temporary file in its target directory and
//! then persisted without clobbering, so readers never observe a partial
//! file and a concurrent writer of the same key sees `AlreadyExists`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Prefix of in-flight temporary files.
const PARTIAL_PREFIX: &str = ".bob-partial-";

/// Blob store rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path under the root.
    fn blob_path(&self, key: &str) -> BlobResult<PathBuf> {
        let invalid = |reason: &str| BlobError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        if key.contains('\\') || key.contains('\0') {
            return Err(invalid("forbidden character"));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            match segment {
                "" => return Err(invalid("empty segment")),
                "." | ".." => return Err(invalid("relative segment")),
                s if s.starts_with(PARTIAL_PREFIX) => return Err(invalid("reserved name")),
                s => path.push(s),
            }
        }
        Ok(path)
    }

    /// A key naming a directory, or walking through a file
    /// (`index.html/x`), is a miss rather than a backend failure.
    fn is_structural_miss(&self, path: &Path) -> bool {
        path.is_dir()
            || path
                .ancestors()
                .skip(1)
                .take_while(|p| *p != self.root.as_path())
                .any(Path::is_file)
    }
}

/// Walk the directory holding `prefix` and collect matching keys.
fn list_keys(root: &Path, dir: &Path, prefix: &str) -> BlobResult<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut keys = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| BlobError::Backend(format!("failed to walk {}: {e}", dir.display())))?;
        if !entry.file_type().is_file()
            || entry.file_name().to_string_lossy().starts_with(PARTIAL_PREFIX)
        {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.starts_with(prefix) {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

fn write_new(path: &Path, key: &str, data: &[u8]) -> BlobResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| BlobError::Backend(format!("no parent directory for {key}")))?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(BlobError::AlreadyExists {
            key: key.to_string(),
        }),
        Err(e) => Err(BlobError::Io(e.error)),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<()> {
        let path = self.blob_path(key)?;
        let key = key.to_string();
        tokio::task::spawn_blocking(move || write_new(&path, &key, &data))
            .await
            .map_err(|e| BlobError::Backend(format!("write task failed: {e}")))?
    }

    async fn get(&self, key: &str) -> BlobResult<Option<Bytes>> {
        let path = self.blob_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if self.is_structural_miss(&path) => {
                tracing::debug!(key, error = %e, "blob key does not name a file");
                Ok(None)
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn list(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let dir = match prefix.rfind('/') {
            Some(end) => self.blob_path(&prefix[..end])?,
            None => self.root.clone(),
        };
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_keys(&root, &dir, &prefix))
            .await
            .map_err(|e| BlobError::Backend(format!("list task failed: {e}")))?
    }

    async fn contains(&self, key: &str) -> BlobResult<bool> {
        let path = self.blob_path(key)?;
        Ok(tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("blobs")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn writes_under_hash_directory() {
        let (_dir, store) = store();
        store
            .put("abc123/css/site.css", Bytes::from_static(b"body{}"))
            .await
            .unwrap();
        let on_disk = std::fs::read(store.root().join("abc123/css/site.css")).unwrap();
        assert_eq!(on_disk, b"body{}");
        let read = store.get("abc123/css/site.css").await.unwrap().unwrap();
        assert_eq!(&read[..], b"body{}");
    }

    #[tokio::test]
    async fn existing_blob_is_not_overwritten() {
        let (_dir, store) = store();
        store.put("h/index.html", Bytes::from_static(b"first")).await.unwrap();
        let err = store
            .put("h/index.html", Bytes::from_static(b"second"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists { .. }));
        let read = store.get("h/index.html").await.unwrap().unwrap();
        assert_eq!(&read[..], b"first");
    }

    #[tokio::test]
    async fn no_partial_files_are_left_behind() {
        let (_dir, store) = store();
        store.put("h/a.txt", Bytes::from_static(b"a")).await.unwrap();
        let names: Vec<String> = std::fs::read_dir(store.root().join("h"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn missing_and_directory_keys_are_none() {
        let (_dir, store) = store();
        store.put("h/dir/a.txt", Bytes::from_static(b"a")).await.unwrap();
        assert!(store.get("h/nope.txt").await.unwrap().is_none());
        assert!(store.get("h/dir").await.unwrap().is_none());
        assert!(store.get("h/dir/a.txt/x").await.unwrap().is_none());
        assert!(!store.contains("h/dir").await.unwrap());
        assert!(store.contains("h/dir/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn list_walks_nested_directories() {
        let (_dir, store) = store();
        for key in ["h/index.html", "h/css/site.css", "h2/index.html"] {
            store.put(key, Bytes::from_static(b"x")).await.unwrap();
        }
        assert_eq!(
            store.list("h/").await.unwrap(),
            vec!["h/css/site.css".to_string(), "h/index.html".to_string()]
        );
        assert_eq!(store.list("h").await.unwrap().len(), 3);
        assert!(store.list("missing/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn escaping_keys_are_rejected() {
        let (_dir, store) = store();
        for key in ["", "../x", "h/../../x", "/abs", "h//x", "h\\x", "h/.bob-partial-1"] {
            let err = store.put(key, Bytes::from_static(b"x")).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidKey { .. }), "{key}");
        }
    }
}
