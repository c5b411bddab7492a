//! Component CRUD and index routes

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use ce_application::ports::{ComponentQuery, OrderBy, OrderDir};
use ce_application::services::ExtractInput;
use ce_domain::Error;
use ce_domain::auth::Scope;
use ce_domain::entities::{Component, EmbeddingStatus, Framework, Visibility};

use crate::http::auth::{Authed, require_scope};
use crate::http::response::{ApiResult, success, success_with_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    framework: Option<Framework>,
    visibility: Option<Visibility>,
    embedding_status: Option<EmbeddingStatus>,
    limit: usize,
    offset: usize,
    order_by: OrderBy,
    order: OrderDir,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            framework: None,
            visibility: None,
            embedding_status: None,
            limit: 50,
            offset: 0,
            order_by: OrderBy::Name,
            order: OrderDir::Asc,
        }
    }
}

/// `GET /organizations/{orgId}/components`
pub async fn list(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentRead)?;

    let page = state
        .context
        .components
        .find_many(
            org_id,
            ComponentQuery {
                framework: params.framework,
                visibility: params.visibility,
                embedding_status: params.embedding_status,
                limit: params.limit.clamp(1, 100),
                offset: params.offset,
                order_by: params.order_by,
                order: params.order,
            },
        )
        .await?;

    let components: Vec<serde_json::Value> = page.items.iter().map(summary).collect();
    Ok(success(serde_json::json!({
        "components": components,
        "total": page.total,
        "limit": params.limit.clamp(1, 100),
        "offset": params.offset,
    })))
}

/// `GET /organizations/{orgId}/components/{id}`
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentRead)?;
    let component = state
        .context
        .components
        .find_component_by_id(org_id, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("component {id}")))?;
    Ok(success(component))
}

/// `GET /organizations/{orgId}/components/slug/{slug}`
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path((org_id, slug)): Path<(Uuid, String)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentRead)?;
    let component = state
        .context
        .components
        .find_component_by_slug(org_id, &slug)
        .await?
        .ok_or_else(|| Error::not_found(format!("component {slug}")))?;
    Ok(success(component))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    name: String,
    source_code: String,
    #[serde(default)]
    framework: Framework,
    version: Option<String>,
    visibility: Option<Visibility>,
    file_path: Option<String>,
}

/// `POST /organizations/{orgId}/components` — create or upsert by slug.
///
/// Runs extraction on the submitted source; 201 when the row is created,
/// 200 when an existing slug is updated.
pub async fn create(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<CreateBody>,
) -> ApiResult<Response> {
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
                existing_id: None,
                stories_code: None,
                stories_file_path: None,
            },
        )
        .await?;

    if let Some(visibility) = body.visibility {
        state
            .context
            .components
            .update_component(org_id, result.component_id, None, None, Some(visibility))
            .await?;
    }

    let component = state
        .context
        .components
        .find_component_by_id(org_id, result.component_id)
        .await?
        .ok_or_else(|| Error::internal("component vanished after upsert"))?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(success_with_status(status, component))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBody {
    name: Option<String>,
    version: Option<String>,
    visibility: Option<Visibility>,
}

/// `PATCH /organizations/{orgId}/components/{id}`
pub async fn patch(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    authed: Authed,
    Json(body): Json<PatchBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentWrite)?;
    let component = state
        .context
        .components
        .update_component(org_id, id, body.name, body.version, body.visibility)
        .await?;
    Ok(success(component))
}

/// `DELETE /organizations/{orgId}/components/{id}` — cascades chunks
pub async fn delete(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentDelete)?;
    state.context.components.delete_component(org_id, id).await?;
    Ok(success(serde_json::json!({"componentId": id, "deleted": true})))
}

/// `POST /organizations/{orgId}/components/{id}/index` — synchronous index
pub async fn index_now(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(Uuid, Uuid)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::EmbeddingManage)?;
    let chunks_created = state.context.reconciler.force_reindex(org_id, id).await?;
    Ok(success(serde_json::json!({
        "componentId": id,
        "chunksCreated": chunks_created,
        "embeddingStatus": "indexed",
    })))
}

/// Listing projection: identity and status without the heavy payloads
fn summary(component: &Component) -> serde_json::Value {
    serde_json::json!({
        "id": component.id,
        "slug": component.slug,
        "name": component.name,
        "framework": component.framework,
        "version": component.version,
        "visibility": component.visibility,
        "sourceHash": component.source_hash,
        "description": component.description(),
        "embeddingStatus": component.embedding_status,
        "embeddingError": component.embedding_error,
        "hasExtraction": component.extraction.is_some(),
        "hasGeneration": component.generation.is_some(),
        "hasManifest": component.manifest.is_some(),
        "createdAt": component.created_at,
        "updatedAt": component.updated_at,
    })
}
