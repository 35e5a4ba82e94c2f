//! Deployment records.

use bob_store::ArtifactRecord;
use bob_types::{ArtifactId, DeploymentId, DeploymentStatus, PrincipalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::names::strip_suffix;

/// A named binding from an alias to one artifact, owned by a principal.
///
/// Deployments are never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: DeploymentId,
    /// Normalized alias, always ending in `.bob`.
    pub alias: String,
    pub principal: PrincipalId,
    pub artifact_id: ArtifactId,
    pub status: DeploymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Deployment {
    /// A new `READY` deployment.
    pub fn new(alias: String, principal: PrincipalId, artifact_id: ArtifactId) -> Self {
        Self {
            id: DeploymentId::new(),
            alias,
            principal,
            artifact_id,
            status: DeploymentStatus::Ready,
            created_at: Utc::now(),
        }
    }

    /// The alias without its `.bob` suffix.
    pub fn short_alias(&self) -> &str {
        strip_suffix(&self.alias)
    }

    /// The `<base href>` HTML documents are served with.
    pub fn base_href(&self) -> String {
        format!("/{}/", self.short_alias())
    }

    pub fn is_servable(&self) -> bool {
        self.status.is_servable()
    }
}

/// A deployment joined with the artifact it serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentListing {
    pub id: DeploymentId,
    pub alias: String,
    pub status: DeploymentStatus,
    pub created_at: DateTime<Utc>,
    pub artifact_id: ArtifactId,
    pub size: u64,
    pub file_count: u32,
}

impl DeploymentListing {
    pub fn new(deployment: Deployment, artifact: &ArtifactRecord) -> Self {
        Self {
            id: deployment.id,
            alias: deployment.alias,
            status: deployment.status,
            created_at: deployment.created_at,
            artifact_id: artifact.hash,
            size: artifact.size,
            file_count: artifact.file_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bob_types::ArtifactHash;

    fn deployment(alias: &str) -> Deployment {
        Deployment::new(
            alias.to_string(),
            PrincipalId::new("user-1").unwrap(),
            ArtifactHash::from_digest([1u8; 32]),
        )
    }

    #[test]
    fn new_deployments_are_ready() {
        let d = deployment("demo.bob");
        assert_eq!(d.status, DeploymentStatus::Ready);
        assert!(d.is_servable());
    }

    #[test]
    fn base_href_drops_suffix() {
        assert_eq!(deployment("demo.bob").short_alias(), "demo");
        assert_eq!(deployment("demo.bob").base_href(), "/demo/");
    }

    #[test]
    fn serializes_camel_case() {
        let d = deployment("demo.bob");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["alias"], "demo.bob");
        assert_eq!(json["status"], "READY");
        assert_eq!(json["artifactId"], d.artifact_id.to_hex());
        assert!(json.get("createdAt").is_some());
    }
}
