//! In-memory ZIP reading.

use std::io::{Cursor, Read};

use crate::error::{BundleError, BundleResult};

/// Limits applied while unpacking an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveLimits {
    /// Maximum number of file entries (directories are not counted).
    pub max_entries: usize,
    /// Maximum total uncompressed size of all file entries.
    pub max_unpacked_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_unpacked_bytes: 512 * 1024 * 1024,
        }
    }
}

/// A file entry as found in the archive, path already sanitized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// Read every file entry of a ZIP archive, in archive order.
///
/// Directory entries are skipped. The uncompressed byte budget is enforced
/// on the bytes actually inflated, not on the sizes the archive declares.
pub fn read_entries(bytes: &[u8], limits: &ArchiveLimits) -> BundleResult<Vec<RawEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::new();
    let mut unpacked: u64 = 0;

    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        if entries.len() >= limits.max_entries {
            return Err(BundleError::TooLarge(format!(
                "more than {} entries",
                limits.max_entries
            )));
        }

        let path = sanitize_path(file.name())?;
        let budget = limits.max_unpacked_bytes - unpacked;
        let mut data = Vec::new();
        file.take(budget.saturating_add(1)).read_to_end(&mut data).map_err(|e| {
            BundleError::InvalidArchive(format!("failed to inflate {path}: {e}"))
        })?;
        if data.len() as u64 > budget {
            return Err(BundleError::TooLarge(format!(
                "more than {} unpacked bytes",
                limits.max_unpacked_bytes
            )));
        }
        unpacked += data.len() as u64;

        entries.push(RawEntry { path, data });
    }

    Ok(entries)
}

/// Normalize an entry name into a relative `/`-separated path.
///
/// Backslashes become `/`; empty and `.` segments are dropped. Absolute
/// paths and `..` segments are rejected since the result becomes a blob key.
pub fn sanitize_path(name: &str) -> BundleResult<String> {
    let unified = name.replace('\\', "/");
    let unsafe_path = |reason: &str| BundleError::UnsafePath {
        path: name.to_string(),
        reason: reason.to_string(),
    };

    if unified.starts_with('/') {
        return Err(unsafe_path("absolute path"));
    }
    if unified.contains('\0') {
        return Err(unsafe_path("NUL byte in path"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(unsafe_path("parent directory segment")),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(unsafe_path("empty path"));
    }
    Ok(segments.join("/"))
}
