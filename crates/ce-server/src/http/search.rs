//! Search route

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use ce_application::services::SearchRequest;
use ce_domain::Error;
use ce_domain::auth::Scope;
use ce_domain::entities::Framework;
use ce_domain::value_objects::SearchMode;

use crate::http::auth::{Authed, require_scope};
use crate::http::response::{ApiResult, success};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    #[validate(length(max = 500))]
    query: String,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_limit")]
    limit: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    min_score: Option<f64>,
    framework: Option<Framework>,
    #[serde(default)]
    mode: SearchMode,
}

fn default_limit() -> usize {
    10
}

/// `POST /organizations/{orgId}/search`
pub async fn search(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    authed: Authed,
    Json(body): Json<SearchBody>,
) -> ApiResult<Json<serde_json::Value>> {
    require_scope(&authed, org_id, Scope::ComponentRead)?;
    body.validate().map_err(|e| {
        Error::validation_with_details(
            "invalid search request",
            serde_json::to_value(&e).unwrap_or_default(),
        )
    })?;

    let outcome = state
        .context
        .search
        .search(
            org_id,
            SearchRequest {
                query: body.query,
                mode: body.mode,
                limit: body.limit,
                framework: body.framework,
                min_score: body.min_score,
            },
        )
        .await?;
    Ok(success(outcome))
}
