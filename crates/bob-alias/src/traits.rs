//! The [`DeploymentStore`] trait defining deployment persistence.

use async_trait::async_trait;
use bob_types::PrincipalId;

use crate::error::Result;
use crate::types::Deployment;

/// Storage backend for deployment records.
///
/// Implementations must be thread-safe and enforce uniqueness of
/// `(principal, alias)` atomically on insert.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Insert a deployment.
    ///
    /// Fails with [`AliasError::Conflict`](crate::AliasError::Conflict) if
    /// the principal already has a deployment with the same alias.
    async fn insert(&self, deployment: &Deployment) -> Result<()>;

    /// The principal's deployment under `alias`, if any.
    async fn get(&self, principal: &PrincipalId, alias: &str) -> Result<Option<Deployment>>;

    /// Every deployment stored under exactly `alias`, oldest first.
    async fn find_by_alias(&self, alias: &str) -> Result<Vec<Deployment>>;

    /// The principal's deployments, newest first.
    async fn list_for(&self, principal: &PrincipalId) -> Result<Vec<Deployment>>;
}
