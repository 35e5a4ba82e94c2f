//! Postgres artifact index.
//!
//! Operates on the `artifacts` table created by the server's migrations.

use async_trait::async_trait;
use bob_types::ArtifactHash;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};
use crate::record::{ArtifactRecord, InsertOutcome};
use crate::traits::ArtifactIndex;

/// [`ArtifactIndex`] backed by a Postgres pool.
#[derive(Clone, Debug)]
pub struct PgArtifactIndex {
    pool: PgPool,
}

impl PgArtifactIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtifactIndex for PgArtifactIndex {
    async fn get(&self, hash: &ArtifactHash) -> StoreResult<Option<ArtifactRecord>> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            "SELECT hash, size, file_count, created_at FROM artifacts WHERE hash = $1",
        )
        .bind(hash.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ArtifactRow::into_record).transpose()
    }

    async fn insert(&self, record: &ArtifactRecord) -> StoreResult<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO artifacts (hash, size, file_count, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (hash) DO NOTHING",
        )
        .bind(record.hash.to_hex())
        .bind(to_i64(record.size, "size")?)
        .bind(i32::try_from(record.file_count).map_err(|_| {
            StoreError::Metadata(format!("file_count {} out of range", record.file_count))
        })?)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(InsertOutcome::Inserted);
        }

        match self.get(&record.hash).await? {
            Some(existing) => Ok(InsertOutcome::Existing(existing)),
            None => Err(StoreError::Metadata(format!(
                "insert of {} conflicted but no row was found",
                record.hash
            ))),
        }
    }
}

fn to_i64(value: u64, field: &str) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::Metadata(format!("{field} {value} out of range")))
}

/// Raw row from the `artifacts` table.
#[derive(sqlx::FromRow)]
struct ArtifactRow {
    hash: String,
    size: i64,
    file_count: i32,
    created_at: DateTime<Utc>,
}

impl ArtifactRow {
    fn into_record(self) -> StoreResult<ArtifactRecord> {
        let hash = ArtifactHash::from_hex(&self.hash)
            .map_err(|e| StoreError::corrupt(self.hash.as_str(), e))?;
        let size = u64::try_from(self.size)
            .map_err(|_| StoreError::corrupt(self.hash.as_str(), "negative size"))?;
        let file_count = u32::try_from(self.file_count)
            .map_err(|_| StoreError::corrupt(self.hash.as_str(), "negative file_count"))?;
        Ok(ArtifactRecord {
            hash,
            size,
            file_count,
            created_at: self.created_at,
        })
    }
}
