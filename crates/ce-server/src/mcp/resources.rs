//! MCP resource surface
//!
//! Read-only resources addressed by URI: the org's component inventory and
//! index statistics under `context://`, and per-component manifest sections
//! under `component://{view}/{slug}`.

use uuid::Uuid;

use ce_application::ports::ManifestFilter;
use ce_domain::{Error, Result};

use crate::state::AppState;

const JSON_MIME: &str = "application/json";

/// Resource descriptors for `resources/list`
pub fn list_resources() -> serde_json::Value {
    serde_json::json!([
        {
            "uri": "context://components",
            "name": "Component inventory",
            "description": "Every component with a manifest: name, slug, description",
            "mimeType": JSON_MIME,
        },
        {
            "uri": "context://stats",
            "name": "Index statistics",
            "description": "Component and chunk counts of the search index",
            "mimeType": JSON_MIME,
        },
        {
            "uri": "component://detail/{slug}",
            "name": "Component manifest",
            "description": "The full manifest of one component",
            "mimeType": JSON_MIME,
        },
        {
            "uri": "component://props/{slug}",
            "name": "Component props",
            "description": "Categorized props of one component",
            "mimeType": JSON_MIME,
        },
        {
            "uri": "component://examples/{slug}",
            "name": "Component examples",
            "description": "Usage examples of one component",
            "mimeType": JSON_MIME,
        },
        {
            "uri": "component://guidance/{slug}",
            "name": "Component guidance",
            "description": "Usage guidance of one component",
            "mimeType": JSON_MIME,
        },
    ])
}

/// Resolve a `resources/read` request
pub async fn read_resource(
    state: &AppState,
    org_id: Uuid,
    uri: &str,
) -> Result<serde_json::Value> {
    let payload = match uri {
        "context://components" => component_inventory(state, org_id).await?,
        "context://stats" => {
            serde_json::to_value(state.context.search.index_stats(org_id).await?)?
        }
        _ => component_view(state, org_id, uri).await?,
    };

    Ok(serde_json::json!({
        "contents": [{
            "uri": uri,
            "mimeType": JSON_MIME,
            "text": serde_json::to_string_pretty(&payload)?,
        }],
    }))
}

async fn component_inventory(state: &AppState, org_id: Uuid) -> Result<serde_json::Value> {
    let components = state
        .context
        .components
        .find_all_manifests(org_id, ManifestFilter::default())
        .await?;
    let inventory: Vec<serde_json::Value> = components
        .iter()
        .map(|component| {
            serde_json::json!({
                "name": component.name,
                "slug": component.slug,
                "framework": component.framework,
                "description": component.description(),
            })
        })
        .collect();
    Ok(serde_json::json!({"components": inventory}))
}

async fn component_view(state: &AppState, org_id: Uuid, uri: &str) -> Result<serde_json::Value> {
    let rest = uri
        .strip_prefix("component://")
        .ok_or_else(|| Error::validation(format!("unknown resource uri: {uri}")))?;
    let (view, slug) = rest
        .split_once('/')
        .ok_or_else(|| Error::validation(format!("unknown resource uri: {uri}")))?;

    let component = state
        .context
        .components
        .find_component_by_slug(org_id, slug)
        .await?
        .ok_or_else(|| Error::not_found(format!("component {slug}")))?;
    let manifest = component
        .manifest
        .as_ref()
        .ok_or_else(|| Error::not_found(format!("component {slug} has no manifest")))?;

    let payload = match view {
        "detail" => serde_json::to_value(manifest)?,
        "props" => serde_json::to_value(&manifest.props)?,
        "examples" => serde_json::to_value(&manifest.examples)?,
        "guidance" => serde_json::to_value(&manifest.guidance)?,
        other => {
            return Err(Error::validation(format!(
                "unknown component view: {other}"
            )));
        }
    };
    Ok(payload)
}
