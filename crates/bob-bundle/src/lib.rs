//! # bob-bundle
//!
//! Bundle normalization for Bob: turn an uploaded ZIP and its declared
//! SHA-256 into a verified, flattened file tree ready for storage.
//!
//! - [`Normalizer`]: hash verification, unpacking, wrapper stripping and
//!   the `index.html` entrypoint check.
//! - [`html`]: `<base>` tag placement, shared by ingestion (placeholder)
//!   and serving (alias-scoped rewrite).
//! - [`media`]: extension-based content type inference.

pub mod archive;
pub mod error;
pub mod html;
pub mod media;
pub mod normalize;

pub use archive::{ArchiveLimits, RawEntry};
pub use error::{BundleError, BundleResult};
pub use html::{BasePlacement, BaseRewrite};
pub use normalize::{BundleEntry, NormalizedBundle, Normalizer, ENTRYPOINT};
