//! Reconciliation routes

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use ce_domain::Error;
use ce_domain::auth::Scope;

use crate::http::auth::{Authed, require_scope};
use crate::http::response::{ApiResult, success};
use crate::state::AppState;

/// `GET /organizations/{orgId}/reconciliation/status`
pub async fn status(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let counts = state
        .context
        .components
        .count_by_embedding_status(org_id)
        .await?;
    Ok(success(serde_json::json!({
        "pending": counts.pending,
        "processing": counts.processing,
        "indexed": counts.indexed,
        "failed": counts.failed,
        "total": counts.total(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessPendingBody {
    batch_size: usize,
}

impl Default for ProcessPendingBody {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

/// `POST /organizations/{orgId}/reconciliation/process-pending`
pub async fn process_pending(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let body: ProcessPendingBody = parse_optional_body(&body)?;
    let batch_size = body.batch_size.clamp(1, 100);
    let report = state
        .context
        .reconciler
        .process_pending(org_id, batch_size)
        .await?;
    Ok(success(report))
}

/// `POST /organizations/{orgId}/reconciliation/retry-failed`
pub async fn retry_failed(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let reset = state.context.reconciler.retry_failed(org_id).await?;
    Ok(success(serde_json::json!({"reset": reset})))
}

/// `POST /organizations/{orgId}/reconciliation/force-reindex/{componentId}`
pub async fn force_reindex(
    State(state): State<AppState>,
    Path((org_id, component_id)): Path<(Uuid, Uuid)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let chunks_created = state
        .context
        .reconciler
        .force_reindex(org_id, component_id)
        .await?;
    Ok(success(serde_json::json!({
        "componentId": component_id,
        "chunksCreated": chunks_created,
        "embeddingStatus": "indexed",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MigrateBody {
    batch_size: usize,
}

impl Default for MigrateBody {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// `POST /organizations/{orgId}/reconciliation/migrate-embeddings`
pub async fn migrate_embeddings(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let body: MigrateBody = parse_optional_body(&body)?;
    let batch_size = body.batch_size.clamp(1, 100);
    let report = state
        .context
        .reconciler
        .migrate_embeddings(org_id, batch_size)
        .await?;
    Ok(success(serde_json::json!({
        "queued": report.queued,
        "currentModel": report.current_model,
        "outdatedComponents": report.outdated_components,
    })))
}

/// An absent or empty body falls back to the defaults
fn parse_optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, crate::http::response::ApiError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("invalid request body: {e}")).into())
}
