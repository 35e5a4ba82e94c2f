use std::sync::Arc;

use bob_store::ArtifactStore;
use bob_types::{ArtifactId, PrincipalId};

use crate::error::{AliasError, Result};
use crate::names;
use crate::traits::DeploymentStore;
use crate::types::{Deployment, DeploymentListing};

/// Maps `.bob` aliases onto artifacts.
#[derive(Clone)]
pub struct AliasRegistry {
    deployments: Arc<dyn DeploymentStore>,
    artifacts: ArtifactStore,
}

impl AliasRegistry {
    pub fn new(deployments: Arc<dyn DeploymentStore>, artifacts: ArtifactStore) -> Self {
        Self {
            deployments,
            artifacts,
        }
    }

    /// Normalize a user-supplied name into a stored alias.
    pub fn normalize(&self, raw: &str) -> Result<String> {
        names::normalize(raw)
    }

    /// Bind a normalized alias to an existing artifact for `principal`.
    pub async fn register(
        &self,
        principal: &PrincipalId,
        raw_alias: &str,
        artifact_id: &ArtifactId,
    ) -> Result<Deployment> {
        let alias = names::normalize(raw_alias)?;

        if self.deployments.get(principal, &alias).await?.is_some() {
            return Err(AliasError::Conflict {
                principal: principal.to_string(),
                alias,
            });
        }
        if !self.artifacts.exists(artifact_id).await? {
            return Err(AliasError::UnknownArtifact(artifact_id.to_hex()));
        }

        let deployment = Deployment::new(alias, principal.clone(), *artifact_id);
        self.deployments.insert(&deployment).await?;
        tracing::info!(
            alias = %deployment.alias,
            principal = %principal,
            artifact = %artifact_id.short_hex(),
            id = %deployment.id,
            "deployment created"
        );
        Ok(deployment)
    }

    /// Find the deployment a request segment refers to.
    ///
    /// Forms are tried in [`names::query_forms`] order; when several
    /// principals share an alias, the earliest deployment wins.
    pub async fn resolve(&self, candidate: &str) -> Result<Option<Deployment>> {
        for form in names::query_forms(candidate) {
            if let Some(found) = self.deployments.find_by_alias(&form).await?.into_iter().next() {
                tracing::debug!(candidate, alias = %found.alias, "alias resolved");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// The principal's deployments, newest first, with artifact details.
    pub async fn list(&self, principal: &PrincipalId) -> Result<Vec<DeploymentListing>> {
        let deployments = self.deployments.list_for(principal).await?;
        let mut listings = Vec::with_capacity(deployments.len());
        for deployment in deployments {
            match self.artifacts.get(&deployment.artifact_id).await? {
                Some(artifact) => listings.push(DeploymentListing::new(deployment, &artifact)),
                None => tracing::error!(
                    alias = %deployment.alias,
                    artifact = %deployment.artifact_id,
                    "skipping deployment whose artifact record is missing"
                ),
            }
        }
        Ok(listings)
    }

    /// The artifact store deployments point into.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }
}

impl std::fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasRegistry").finish_non_exhaustive()
    }
}
