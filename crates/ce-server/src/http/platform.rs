//! Platform administration routes
//!
//! Organizations and API keys are created by platform administrators; every
//! route here requires the `cep_` platform token. Raw API keys appear in
//! exactly one response: the creation call.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use ce_domain::Error;
use ce_domain::entities::ApiKey;

use crate::http::auth::{Authed, require_platform};
use crate::http::response::{ApiResult, success, success_with_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrgBody {
    name: String,
}

/// `POST /platform/organizations`
pub async fn create_org(
    State(state): State<AppState>,
    authed: Authed,
    Json(body): Json<CreateOrgBody>,
) -> ApiResult<Response> {
    require_platform(&authed)?;
    if body.name.trim().is_empty() {
        return Err(Error::validation("organization name must not be empty").into());
    }
    let org = state.context.orgs.create_org(body.name.trim()).await?;
    Ok(success_with_status(StatusCode::CREATED, org))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListOrgsParams {
    limit: usize,
    offset: usize,
}

impl Default for ListOrgsParams {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// `GET /platform/organizations`
pub async fn list_orgs(
    State(state): State<AppState>,
    authed: Authed,
    Query(params): Query<ListOrgsParams>,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    let (organizations, total) = state
        .context
        .orgs
        .list_orgs(params.limit.clamp(1, 100), params.offset)
        .await?;
    Ok(success(serde_json::json!({
        "organizations": organizations,
        "total": total,
    })))
}

/// `GET /platform/organizations/{orgId}`
pub async fn get_org(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    let org = state
        .context
        .orgs
        .find_org_by_id(org_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("organization {org_id}")))?;
    Ok(success(org))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrgBody {
    name: String,
}

/// `PATCH /platform/organizations/{orgId}`
pub async fn update_org(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<UpdateOrgBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    let org = state.context.orgs.update_org(org_id, body.name.trim()).await?;
    Ok(success(org))
}

/// `DELETE /platform/organizations/{orgId}` — 409 while components exist
pub async fn delete_org(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    state.context.orgs.delete_org(org_id).await?;
    Ok(success(serde_json::json!({"organizationId": org_id, "deleted": true})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyBody {
    scopes: Vec<String>,
    expires_at: Option<DateTime<Utc>>,
}

/// `POST /platform/organizations/{orgId}/api-keys`
///
/// The raw key is in this response and nowhere else.
pub async fn create_api_key(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<CreateKeyBody>,
) -> ApiResult<Response> {
    require_platform(&authed)?;
    state
        .context
        .orgs
        .find_org_by_id(org_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("organization {org_id}")))?;

    let issued = state
        .context
        .auth
        .issue_key(org_id, &body.scopes, body.expires_at)
        .await?;

    Ok(success_with_status(
        StatusCode::CREATED,
        serde_json::json!({
            "apiKey": key_view(&issued.record),
            "rawKey": issued.raw_key,
        }),
    ))
}

/// `GET /platform/organizations/{orgId}/api-keys`
pub async fn list_api_keys(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    let keys = state.context.api_keys.list_api_keys(org_id).await?;
    let views: Vec<serde_json::Value> = keys.iter().map(key_view).collect();
    Ok(success(serde_json::json!({"apiKeys": views})))
}

/// `DELETE /platform/organizations/{orgId}/api-keys/{keyId}` — revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    Path((org_id, key_id)): Path<(Uuid, Uuid)>,
    authed: Authed,
) -> ApiResult<Json<serde_json::Value>> {
    require_platform(&authed)?;
    state.context.api_keys.revoke_api_key(org_id, key_id).await?;
    Ok(success(serde_json::json!({"apiKeyId": key_id, "revoked": true})))
}

/// Key projection without the digest
fn key_view(key: &ApiKey) -> serde_json::Value {
    serde_json::json!({
        "id": key.id,
        "orgId": key.org_id,
        "keyPrefix": key.key_prefix,
        "scopes": key.scopes,
        "active": key.active,
        "expiresAt": key.expires_at,
        "createdAt": key.created_at,
    })
}
