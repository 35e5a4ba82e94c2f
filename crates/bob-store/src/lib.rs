//! Content-addressed artifact storage for Bob.
//!
//! An artifact is the normalized file tree of one uploaded bundle, keyed by
//! the SHA-256 of the raw upload. Storage is split in two:
//!
//! - a [`BlobStore`] holding every file at `{hash}/{relative-path}`
//! - an [`ArtifactIndex`] holding one [`ArtifactRecord`] per hash
//!
//! [`ArtifactStore`] combines the two and implements idempotent ingestion:
//! identical bundles are stored once, and "already exists" from either
//! layer counts as success.
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`], [`InMemoryArtifactIndex`]: tests and embedding
//! - [`FsBlobStore`]: local directory tree
//! - [`PgArtifactIndex`]: Postgres `artifacts` table

pub mod artifact;
pub mod error;
pub mod fs;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod traits;

pub use artifact::ArtifactStore;
pub use error::{BlobError, BlobResult, StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::{InMemoryArtifactIndex, InMemoryBlobStore};
pub use postgres::PgArtifactIndex;
pub use record::{ArtifactRecord, CreateOutcome, InsertOutcome};
pub use traits::{ArtifactIndex, BlobStore};
