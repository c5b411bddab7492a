//! HTTP API
//!
//! Route groups under `/api/v1`: tenant-scoped component CRUD, pipeline
//! processing, reconciliation and search, plus the platform administration
//! surface and a health probe. CORS applies globally; the MCP endpoint is
//! mounted alongside with its own CORS handling.

pub mod auth;
pub mod components;
pub mod platform;
pub mod processing;
pub mod reconciliation;
pub mod response;
pub mod search;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let organizations = Router::new()
        .route(
            "/{orgId}/components",
            get(components::list).post(components::create),
        )
        .route(
            "/{orgId}/components/slug/{slug}",
            get(components::get_by_slug),
        )
        .route(
            "/{orgId}/components/{id}",
            get(components::get_by_id)
                .patch(components::patch)
                .delete(components::delete),
        )
        .route("/{orgId}/components/{id}/index", post(components::index_now))
        .route("/{orgId}/processing/extract", post(processing::extract))
        .route("/{orgId}/processing/generate", post(processing::generate))
        .route("/{orgId}/processing/build", post(processing::build))
        .route("/{orgId}/reconciliation/status", get(reconciliation::status))
        .route(
            "/{orgId}/reconciliation/process-pending",
            post(reconciliation::process_pending),
        )
        .route(
            "/{orgId}/reconciliation/retry-failed",
            post(reconciliation::retry_failed),
        )
        .route(
            "/{orgId}/reconciliation/force-reindex/{componentId}",
            post(reconciliation::force_reindex),
        )
        .route(
            "/{orgId}/reconciliation/migrate-embeddings",
            post(reconciliation::migrate_embeddings),
        )
        .route("/{orgId}/search", post(search::search));

    let platform = Router::new()
        .route(
            "/organizations",
            get(platform::list_orgs).post(platform::create_org),
        )
        .route(
            "/organizations/{orgId}",
            get(platform::get_org)
                .patch(platform::update_org)
                .delete(platform::delete_org),
        )
        .route(
            "/organizations/{orgId}/api-keys",
            get(platform::list_api_keys).post(platform::create_api_key),
        )
        .route(
            "/organizations/{orgId}/api-keys/{keyId}",
            delete(platform::revoke_api_key),
        );

    let api = Router::new()
        .nest("/organizations", organizations)
        .nest("/platform", platform);

    // The MCP gateway writes its CORS headers directly to the response (the
    // streamable transport bypasses the framework response path), so the
    // global layer covers only the REST surface.
    let rest = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(cors_layer(&state));

    Router::new()
        .merge(rest)
        .merge(crate::mcp::routes())
        .fallback(not_found)
        .with_state(state)
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "environment": state.context.config.environment,
        "embedding": {
            "provider": state.context.embeddings.provider_name(),
            "available": state.context.embeddings.is_available(),
        },
    }))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": {"code": "NOT_FOUND", "message": "route not found"},
        })),
    )
}

/// Global CORS from configuration; an empty origin list allows any origin
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.context.config.cors.allowed_origins;
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
