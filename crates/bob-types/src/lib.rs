//! Foundation types for Bob.
//!
//! Bob publishes static site bundles as immutable, content-addressed
//! artifacts and serves them under human-chosen aliases. Every other Bob
//! crate depends on `bob-types`.
//!
//! # Key Types
//!
//! - [`ArtifactHash`] — SHA-256 digest of a raw bundle; the artifact's identity
//! - [`DeploymentId`] — UUID v7 identifier for an alias binding
//! - [`PrincipalId`] — Opaque owner of deployments
//! - [`DeploymentStatus`] — Lifecycle state of a deployment (only `READY` today)

pub mod deployment;
pub mod error;
pub mod hash;
pub mod principal;

pub use deployment::{DeploymentId, DeploymentStatus};
pub use error::TypeError;
pub use hash::{ArtifactHash, ArtifactId};
pub use principal::PrincipalId;
