use bob_crypto::BundleHasher;
use bob_types::ArtifactHash;
use bytes::Bytes;

use crate::archive::{read_entries, ArchiveLimits, RawEntry};
use crate::error::{BundleError, BundleResult};
use crate::html;
use crate::media;

/// Name of the document every bundle must carry at its root.
pub const ENTRYPOINT: &str = "index.html";

/// A file ready to be written into an artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleEntry {
    /// Relative path inside the normalized tree.
    pub path: String,
    /// File contents (HTML entries carry the placeholder base).
    pub data: Bytes,
    /// Media type inferred from the path.
    pub media_type: &'static str,
}

/// The verified, normalized contents of one uploaded bundle.
#[derive(Clone, Debug)]
pub struct NormalizedBundle {
    /// Verified SHA-256 of the raw upload.
    pub hash: ArtifactHash,
    /// Size of the raw upload in bytes.
    pub size: u64,
    /// Files in archive order.
    pub entries: Vec<BundleEntry>,
    /// Whether a root `index.html` was found (always `true` on success).
    pub has_entrypoint: bool,
    /// The wrapper directory that was stripped, if any.
    pub wrapper: Option<String>,
}

impl NormalizedBundle {
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// The root index document.
    pub fn entrypoint(&self) -> Option<&BundleEntry> {
        self.entries
            .iter()
            .find(|e| e.path.eq_ignore_ascii_case(ENTRYPOINT))
    }

    /// Total bytes across all normalized entries.
    pub fn unpacked_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.data.len() as u64).sum()
    }
}

/// Turns raw archive bytes plus a declared hash into a [`NormalizedBundle`].
///
/// Normalization is a pure transformation: verify the declared hash, unpack
/// in memory, strip a shared wrapper directory, require a root
/// `index.html`, and give every HTML entry a placeholder base.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    limits: ArchiveLimits,
}

impl Normalizer {
    pub fn new(limits: ArchiveLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ArchiveLimits {
        &self.limits
    }

    /// Normalize an uploaded bundle.
    pub fn normalize(&self, raw: &[u8], declared_hash: &str) -> BundleResult<NormalizedBundle> {
        let hash = BundleHasher::verify_declared(raw, declared_hash)?;
        let mut entries = read_entries(raw, &self.limits)?;

        let wrapper = detect_wrapper(&entries);
        if let Some(root) = &wrapper {
            tracing::debug!(hash = %hash.short_hex(), wrapper = %root, "stripping wrapper directory");
            let prefix_len = root.len() + 1;
            for entry in &mut entries {
                entry.path = entry.path[prefix_len..].to_string();
            }
        }

        let has_entrypoint = entries
            .iter()
            .any(|e| e.path.eq_ignore_ascii_case(ENTRYPOINT));
        if !has_entrypoint {
            return Err(BundleError::MissingEntrypoint);
        }

        let entries: Vec<BundleEntry> = entries.into_iter().map(finish_entry).collect();
        tracing::debug!(
            hash = %hash.short_hex(),
            files = entries.len(),
            "bundle normalized"
        );

        Ok(NormalizedBundle {
            hash,
            size: raw.len() as u64,
            entries,
            has_entrypoint,
            wrapper,
        })
    }
}

/// Find a single top-level directory that every entry lives under.
///
/// A wrapper exists only when every entry is strictly inside the same
/// first segment; a lone root file, or two different top-level names,
/// means the archive was made from the site's contents directly.
pub fn detect_wrapper(entries: &[RawEntry]) -> Option<String> {
    let first = entries.first()?;
    let (root, _) = first.path.split_once('/')?;
    let prefix = format!("{root}/");
    entries
        .iter()
        .all(|e| e.path.starts_with(&prefix))
        .then(|| root.to_string())
}

fn finish_entry(entry: RawEntry) -> BundleEntry {
    let media_type = media::media_type_for(&entry.path);
    let mut data = entry.data;

    if media::is_html(&entry.path) {
        if let Ok(text) = std::str::from_utf8(&data) {
            if let Some(rewritten) = html::inject_placeholder(text) {
                tracing::debug!(path = %entry.path, "added placeholder base");
                data = rewritten.into_bytes();
            }
        }
    }

    BundleEntry {
        path: entry.path,
        data: Bytes::from(data),
        media_type,
    }
}
