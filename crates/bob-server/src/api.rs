//! Authenticated API: ingestion, deploys and listings.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bob_alias::{AliasError, Deployment, DeploymentListing};
use bob_store::ArtifactRecord;
use bob_types::{ArtifactHash, ArtifactId};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// An ingested artifact.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactResponse {
    pub artifact_id: ArtifactId,
    pub hash: ArtifactHash,
    pub size: u64,
    pub file_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl From<ArtifactRecord> for ArtifactResponse {
    fn from(record: ArtifactRecord) -> Self {
        Self {
            artifact_id: record.id(),
            hash: record.hash,
            size: record.size,
            file_count: record.file_count,
            created_at: record.created_at,
            files: None,
        }
    }
}

/// Body of `POST /api/deploy`. The alias may arrive under any of its
/// historical names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub alias: Option<String>,
    pub site_name: Option<String>,
    pub url: Option<String>,
    pub artifact_id: Option<String>,
}

impl DeployRequest {
    /// The first non-blank of `alias`, `siteName`, `url`.
    fn requested_alias(&self) -> Option<&str> {
        [&self.alias, &self.site_name, &self.url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<DeploymentListing>,
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

/// `POST /api/artifacts`: multipart fields `zip` and `hash`.
///
/// 201 when the artifact was created, 200 when it already existed.
pub async fn upload_artifact(
    State(state): State<AppState>,
    identity: Identity,
    mut multipart: Multipart,
) -> ServerResult<(StatusCode, Json<ArtifactResponse>)> {
    let mut zip: Option<Bytes> = None;
    let mut hash: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("zip") => zip = Some(field.bytes().await.map_err(multipart_error)?),
            Some("hash") => hash = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }
    let (Some(zip), Some(hash)) = (zip, hash) else {
        return Err(ServerError::BadRequest(
            "multipart fields `zip` and `hash` are required".into(),
        ));
    };

    let normalizer = state.normalizer().clone();
    let bundle = tokio::task::spawn_blocking(move || normalizer.normalize(&zip, &hash))
        .await
        .map_err(|e| ServerError::Internal(format!("normalize task failed: {e}")))??;
    tracing::debug!(
        hash = %bundle.hash.short_hex(),
        files = bundle.file_count(),
        wrapper = bundle.wrapper.as_deref().unwrap_or(""),
        "bundle normalized"
    );

    let (record, outcome) = state.artifacts().create(&bundle).await?;
    tracing::info!(
        principal = %identity.principal,
        hash = %record.hash.short_hex(),
        created = outcome.is_created(),
        "artifact upload"
    );

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(record.into())))
}

/// `GET /api/artifacts/:id`: the record plus its stored file paths.
pub async fn get_artifact(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ServerResult<Json<ArtifactResponse>> {
    let hash = ArtifactHash::from_hex(id.trim()).map_err(|_| ServerError::ArtifactNotFound(id.clone()))?;
    let record = state
        .artifacts()
        .get(&hash)
        .await?
        .ok_or(ServerError::ArtifactNotFound(id))?;
    let files = state.artifacts().list_files(&hash).await?;

    let mut response = ArtifactResponse::from(record);
    response.files = Some(files);
    Ok(Json(response))
}

/// `POST /api/deploy`: bind an alias to an ingested artifact.
pub async fn deploy(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<Deployment>)> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let (Some(alias), Some(artifact)) = (request.requested_alias(), request.artifact_id.as_deref())
    else {
        return Err(ServerError::BadRequest(
            "`alias` (or `siteName`/`url`) and `artifactId` are required".into(),
        ));
    };
    let artifact_id = ArtifactHash::from_hex(artifact.trim())
        .map_err(|_| AliasError::UnknownArtifact(artifact.to_string()))?;

    let deployment = state
        .registry()
        .register(&identity.principal, alias, &artifact_id)
        .await?;
    Ok((StatusCode::CREATED, Json(deployment)))
}

/// `GET /api/deployments`: the caller's deployments, newest first.
pub async fn list_deployments(
    State(state): State<AppState>,
    identity: Identity,
) -> ServerResult<Json<DeploymentsResponse>> {
    let deployments = state.registry().list(&identity.principal).await?;
    Ok(Json(DeploymentsResponse { deployments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_falls_back_through_legacy_names() {
        let request = DeployRequest {
            alias: Some("  ".into()),
            site_name: Some("My Site".into()),
            url: Some("ignored".into()),
            artifact_id: None,
        };
        assert_eq!(request.requested_alias(), Some("My Site"));

        let request = DeployRequest {
            url: Some("from-url".into()),
            ..DeployRequest::default()
        };
        assert_eq!(request.requested_alias(), Some("from-url"));
        assert_eq!(DeployRequest::default().requested_alias(), None);
    }

    #[test]
    fn artifact_response_uses_hash_as_id() {
        let record = ArtifactRecord::new(ArtifactHash::from_digest([5u8; 32]), 10, 2);
        let json = serde_json::to_value(ArtifactResponse::from(record.clone())).unwrap();
        assert_eq!(json["artifactId"], record.hash.to_hex());
        assert_eq!(json["hash"], record.hash.to_hex());
        assert_eq!(json["fileCount"], 2);
        assert!(json.get("files").is_none());
    }
}
