//! In-memory deployment store for testing and ephemeral use.

use std::sync::RwLock;

use async_trait::async_trait;
use bob_types::PrincipalId;

use crate::error::{AliasError, Result};
use crate::traits::DeploymentStore;
use crate::types::Deployment;

/// An in-memory implementation of [`DeploymentStore`].
///
/// Deployments are kept in insertion order, which is also creation order.
#[derive(Debug, Default)]
pub struct InMemoryDeploymentStore {
    deployments: RwLock<Vec<Deployment>>,
}

impl InMemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.deployments.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeploymentStore for InMemoryDeploymentStore {
    async fn insert(&self, deployment: &Deployment) -> Result<()> {
        let mut all = self.deployments.write().expect("lock poisoned");
        let taken = all
            .iter()
            .any(|d| d.principal == deployment.principal && d.alias == deployment.alias);
        if taken {
            return Err(AliasError::Conflict {
                principal: deployment.principal.to_string(),
                alias: deployment.alias.clone(),
            });
        }
        all.push(deployment.clone());
        Ok(())
    }

    async fn get(&self, principal: &PrincipalId, alias: &str) -> Result<Option<Deployment>> {
        let all = self.deployments.read().expect("lock poisoned");
        Ok(all
            .iter()
            .find(|d| &d.principal == principal && d.alias == alias)
            .cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Vec<Deployment>> {
        let all = self.deployments.read().expect("lock poisoned");
        Ok(all.iter().filter(|d| d.alias == alias).cloned().collect())
    }

    async fn list_for(&self, principal: &PrincipalId) -> Result<Vec<Deployment>> {
        let all = self.deployments.read().expect("lock poisoned");
        Ok(all
            .iter()
            .rev()
            .filter(|d| &d.principal == principal)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bob_types::ArtifactHash;

    fn principal(id: &str) -> PrincipalId {
        PrincipalId::new(id).unwrap()
    }

    fn deployment(owner: &str, alias: &str) -> Deployment {
        Deployment::new(
            alias.to_string(),
            principal(owner),
            ArtifactHash::from_digest([3u8; 32]),
        )
    }

    #[tokio::test]
    async fn same_alias_same_principal_conflicts() {
        let store = InMemoryDeploymentStore::new();
        store.insert(&deployment("alice", "demo.bob")).await.unwrap();
        let err = store.insert(&deployment("alice", "demo.bob")).await.unwrap_err();
        assert!(matches!(err, AliasError::Conflict { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn same_alias_different_principals_coexist() {
        let store = InMemoryDeploymentStore::new();
        let first = deployment("alice", "demo.bob");
        store.insert(&first).await.unwrap();
        store.insert(&deployment("bob", "demo.bob")).await.unwrap();

        let found = store.find_by_alias("demo.bob").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], first);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped() {
        let store = InMemoryDeploymentStore::new();
        store.insert(&deployment("alice", "one.bob")).await.unwrap();
        store.insert(&deployment("bob", "other.bob")).await.unwrap();
        store.insert(&deployment("alice", "two.bob")).await.unwrap();

        let aliases: Vec<String> = store
            .list_for(&principal("alice"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.alias)
            .collect();
        assert_eq!(aliases, vec!["two.bob", "one.bob"]);
    }

    #[tokio::test]
    async fn get_is_scoped_to_principal() {
        let store = InMemoryDeploymentStore::new();
        store.insert(&deployment("alice", "demo.bob")).await.unwrap();
        assert!(store.get(&principal("alice"), "demo.bob").await.unwrap().is_some());
        assert!(store.get(&principal("bob"), "demo.bob").await.unwrap().is_none());
    }
}
