use bob_types::{ArtifactHash, ArtifactId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata row for one stored artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub hash: ArtifactHash,
    /// Size of the raw uploaded bundle in bytes.
    pub size: u64,
    /// Number of files extracted into the blob namespace.
    pub file_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn new(hash: ArtifactHash, size: u64, file_count: u32) -> Self {
        Self {
            hash,
            size,
            file_count,
            created_at: Utc::now(),
        }
    }

    /// The identifier handed to clients.
    pub fn id(&self) -> ArtifactId {
        self.hash
    }
}

/// Result of inserting into an [`ArtifactIndex`](crate::ArtifactIndex).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record for the hash was already present; it is returned unchanged.
    Existing(ArtifactRecord),
}

/// Whether [`ArtifactStore::create`](crate::ArtifactStore::create) stored
/// a new artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Existing,
}

impl CreateOutcome {
    pub fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}
