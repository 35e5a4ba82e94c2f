use std::sync::Arc;

use bob_alias::{AliasRegistry, DeploymentStore, InMemoryDeploymentStore, PgDeploymentStore};
use bob_bundle::Normalizer;
use bob_resolve::Resolver;
use bob_store::{
    ArtifactIndex, ArtifactStore, BlobStore, FsBlobStore, InMemoryArtifactIndex,
    InMemoryBlobStore, PgArtifactIndex,
};

use crate::auth::{AuthProvider, TokenTableAuth, TrustedBearerAuth};
use crate::config::{BlobBackend, ServerConfig};
use crate::db;
use crate::error::{ServerError, ServerResult};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: ServerConfig,
    normalizer: Normalizer,
    artifacts: ArtifactStore,
    registry: AliasRegistry,
    resolver: Resolver,
    auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Assemble the state from already constructed backends.
    pub fn new(
        config: ServerConfig,
        blobs: Arc<dyn BlobStore>,
        index: Arc<dyn ArtifactIndex>,
        deployments: Arc<dyn DeploymentStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let normalizer = Normalizer::new(config.archive_limits());
        let artifacts = ArtifactStore::new(blobs, index);
        let registry = AliasRegistry::new(deployments, artifacts.clone());
        let resolver = Resolver::new(registry.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                normalizer,
                artifacts,
                registry,
                resolver,
                auth,
            }),
        }
    }

    /// Connect the backends `config` names.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let blobs: Arc<dyn BlobStore> = match config.blob_backend {
            BlobBackend::Memory => {
                tracing::warn!("memory blob backend: artifacts will not survive restarts");
                Arc::new(InMemoryBlobStore::new())
            }
            BlobBackend::Filesystem => {
                let store = FsBlobStore::open(&config.data_dir).map_err(|e| {
                    ServerError::Config(format!("data_dir {}: {e}", config.data_dir.display()))
                })?;
                tracing::info!(root = %config.data_dir.display(), "filesystem blob store");
                Arc::new(store)
            }
        };

        let (index, deployments): (Arc<dyn ArtifactIndex>, Arc<dyn DeploymentStore>) =
            match db::init_pool(config.database_url.as_deref()).await? {
                Some(pool) => (
                    Arc::new(PgArtifactIndex::new(pool.clone())),
                    Arc::new(PgDeploymentStore::new(pool)),
                ),
                None => (
                    Arc::new(InMemoryArtifactIndex::new()),
                    Arc::new(InMemoryDeploymentStore::new()),
                ),
            };

        let auth: Arc<dyn AuthProvider> = match &config.tokens {
            Some(tokens) => Arc::new(TokenTableAuth::new(tokens)?),
            None => Arc::new(TrustedBearerAuth),
        };

        Ok(Self::new(config, blobs, index, deployments, auth))
    }

    /// Everything in memory, bearer tokens trusted as principals.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryArtifactIndex::new()),
            Arc::new(InMemoryDeploymentStore::new()),
            Arc::new(TrustedBearerAuth),
        )
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.inner.normalizer
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.inner.artifacts
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.inner.registry
    }

    pub fn resolver(&self) -> &Resolver {
        &self.inner.resolver
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_config_needs_no_external_services() {
        let config = ServerConfig {
            blob_backend: BlobBackend::Memory,
            ..ServerConfig::default()
        };
        let state = AppState::from_config(config).await.unwrap();
        assert_eq!(state.normalizer().limits().max_entries, 10_000);
    }

    #[tokio::test]
    async fn filesystem_backend_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("blobs");
        let config = ServerConfig {
            data_dir: data_dir.clone(),
            ..ServerConfig::default()
        };
        AppState::from_config(config).await.unwrap();
        assert!(data_dir.is_dir());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = ServerConfig {
            static_prefix: "/api".into(),
            blob_backend: BlobBackend::Memory,
            ..ServerConfig::default()
        };
        assert!(matches!(
            AppState::from_config(config).await,
            Err(ServerError::Config(_))
        ));
    }
}
