//! Postgres deployment store.
//!
//! Operates on the `deployments` table. Uniqueness of `(principal, alias)`
//! and the reference to `artifacts(hash)` are enforced by the schema.

use async_trait::async_trait;
use bob_types::{ArtifactHash, DeploymentId, DeploymentStatus, PrincipalId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AliasError, Result};
use crate::traits::DeploymentStore;
use crate::types::Deployment;

const COLUMNS: &str = "id, alias, principal, artifact_hash, status, created_at";

/// [`DeploymentStore`] backed by a Postgres pool.
#[derive(Clone, Debug)]
pub struct PgDeploymentStore {
    pool: PgPool,
}

impl PgDeploymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentStore for PgDeploymentStore {
    async fn insert(&self, deployment: &Deployment) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO deployments (id, alias, principal, artifact_hash, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*deployment.id.as_uuid())
        .bind(&deployment.alias)
        .bind(deployment.principal.as_str())
        .bind(deployment.artifact_id.to_hex())
        .bind(deployment.status.as_str())
        .bind(deployment.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AliasError::Conflict {
                    principal: deployment.principal.to_string(),
                    alias: deployment.alias.clone(),
                })
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(AliasError::UnknownArtifact(deployment.artifact_id.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, principal: &PrincipalId, alias: &str) -> Result<Option<Deployment>> {
        let row = sqlx::query_as::<_, DeploymentRow>(&format!(
            "SELECT {COLUMNS} FROM deployments WHERE principal = $1 AND alias = $2"
        ))
        .bind(principal.as_str())
        .bind(alias)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeploymentRow::into_deployment).transpose()
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Vec<Deployment>> {
        let rows = sqlx::query_as::<_, DeploymentRow>(&format!(
            "SELECT {COLUMNS} FROM deployments WHERE alias = $1 ORDER BY created_at, id"
        ))
        .bind(alias)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeploymentRow::into_deployment).collect()
    }

    async fn list_for(&self, principal: &PrincipalId) -> Result<Vec<Deployment>> {
        let rows = sqlx::query_as::<_, DeploymentRow>(&format!(
            "SELECT {COLUMNS} FROM deployments WHERE principal = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(principal.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeploymentRow::into_deployment).collect()
    }
}

/// Raw row from the `deployments` table.
#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: Uuid,
    alias: String,
    principal: String,
    artifact_hash: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl DeploymentRow {
    fn into_deployment(self) -> Result<Deployment> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            AliasError::Backend(format!("corrupt deployment {}: {what}: {e}", self.id))
        };
        let principal = PrincipalId::new(&self.principal).map_err(|e| corrupt("principal", &e))?;
        let artifact_id =
            ArtifactHash::from_hex(&self.artifact_hash).map_err(|e| corrupt("artifact", &e))?;
        let status: DeploymentStatus = self.status.parse().map_err(|e| corrupt("status", &e))?;

        Ok(Deployment {
            id: DeploymentId::from_uuid(self.id),
            alias: self.alias,
            principal,
            artifact_id,
            status,
            created_at: self.created_at,
        })
    }
}
