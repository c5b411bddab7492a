//! Pipeline routes: extract, generate, build

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use ce_application::services::ExtractInput;
use ce_domain::auth::Scope;
use ce_domain::entities::Framework;

use crate::http::auth::{Authed, require_scope};
use crate::http::response::{ApiResult, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractBody {
    source_code: String,
    name: String,
    #[serde(default)]
    framework: Framework,
    file_path: Option<String>,
    version: Option<String>,
    existing_id: Option<Uuid>,
    stories_code: Option<String>,
    stories_file_path: Option<String>,
}

/// `POST /organizations/{orgId}/processing/extract`
pub async fn extract(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<ExtractBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentWrite)?;

    let result = state
        .context
        .processing
        .extract(
            org_id,
            ExtractInput {
                source_code: body.source_code,
                name: body.name,
                framework: body.framework,
                file_path: body.file_path,
                version: body.version,
                existing_id: body.existing_id,
                stories_code: body.stories_code,
                stories_file_path: body.stories_file_path,
            },
        )
        .await?;

    Ok(success(serde_json::json!({
        "componentId": result.component_id,
        "slug": result.slug,
        "name": result.name,
        "framework": result.framework,
        "sourceHash": result.source_hash,
        "extraction": result.extraction,
        "metadata": result.metadata,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    component_id: Uuid,
    hints: Option<String>,
}

/// `POST /organizations/{orgId}/processing/generate` — 400 without extraction
pub async fn generate(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<GenerateBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentWrite)?;

    let result = state
        .context
        .processing
        .generate(org_id, body.component_id, body.hints.as_deref())
        .await?;

    Ok(success(serde_json::json!({
        "componentId": result.component_id,
        "generation": result.generation,
        "provider": result.provider,
        "model": result.model,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildBody {
    component_id: Uuid,
}

/// `POST /organizations/{orgId}/processing/build` — 400 without extraction
/// or generation
pub async fn build(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<BuildBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentWrite)?;

    let result = state
        .context
        .processing
        .build(org_id, body.component_id)
        .await?;

    Ok(success(serde_json::json!({
        "componentId": result.component_id,
        "name": result.name,
        "manifest": result.manifest,
        "sourceHash": result.source_hash,
        "builtAt": result.built_at,
    })))
}
