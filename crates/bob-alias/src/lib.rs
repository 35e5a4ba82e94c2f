//! Alias registry for Bob.
//!
//! Deployments bind a human-chosen `.bob` alias to exactly one artifact.
//! Aliases are normalized at registration ([`names::normalize`]) and
//! unique per principal. At request time [`AliasRegistry::resolve`]
//! accepts an alias with or without its suffix.
//!
//! # Backends
//!
//! All backends implement [`DeploymentStore`]:
//!
//! - [`InMemoryDeploymentStore`] for tests and embedding
//! - [`PgDeploymentStore`] for the Postgres `deployments` table

pub mod error;
pub mod memory;
pub mod names;
pub mod postgres;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{AliasError, Result};
pub use memory::InMemoryDeploymentStore;
pub use names::ALIAS_SUFFIX;
pub use postgres::PgDeploymentStore;
pub use registry::AliasRegistry;
pub use traits::DeploymentStore;
pub use types::{Deployment, DeploymentListing};
