//! MCP tool surface
//!
//! Four read-only tools over the retrieval engine. Definitions are generated
//! from the argument schemas; calls are validated, routed to the services and
//! answered as text content.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use ce_application::services::SearchRequest;
use ce_domain::entities::Framework;
use ce_domain::value_objects::SearchMode;
use ce_domain::{Error, Result};

use crate::state::AppState;

/// Arguments of `search_components`
#[derive(Debug, Deserialize, schemars::JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchComponentsArgs {
    /// Natural-language or keyword query; empty queries yield zero results
    #[validate(length(max = 500))]
    pub query: String,
    /// Search mode; hybrid unless stated
    #[serde(default)]
    pub mode: SearchMode,
    /// Result limit, at most 50
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
    /// Restrict results to a framework
    pub framework: Option<Framework>,
}

/// Arguments of `find_similar_components`
#[derive(Debug, Deserialize, schemars::JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindSimilarArgs {
    /// Component slug or name to compare against
    #[validate(length(min = 1))]
    pub identifier: String,
    /// Result limit, at most 20
    #[validate(range(min = 1, max = 20))]
    pub limit: Option<usize>,
    /// Minimum similarity in [0, 1]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_score: Option<f64>,
    /// Restrict results to a framework
    pub framework: Option<Framework>,
}

/// Arguments of `get_component`
#[derive(Debug, Deserialize, schemars::JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetComponentArgs {
    /// Component slug or name
    #[validate(length(min = 1))]
    pub identifier: String,
}

/// Arguments of `get_index_stats`
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GetIndexStatsArgs {}

/// Tool definitions for the MCP protocol
pub struct ToolDefinitions;

impl ToolDefinitions {
    fn search_components() -> Tool {
        Self::create_tool(
            "search_components",
            "Search the component library with keyword, semantic or hybrid retrieval",
            schemars::schema_for!(SearchComponentsArgs),
        )
    }

    fn find_similar_components() -> Tool {
        Self::create_tool(
            "find_similar_components",
            "Find components semantically similar to a given one",
            schemars::schema_for!(FindSimilarArgs),
        )
    }

    fn get_component() -> Tool {
        Self::create_tool(
            "get_component",
            "Fetch the full manifest of one component by slug or name",
            schemars::schema_for!(GetComponentArgs),
        )
    }

    fn get_index_stats() -> Tool {
        Self::create_tool(
            "get_index_stats",
            "Report component and chunk counts of the search index",
            schemars::schema_for!(GetIndexStatsArgs),
        )
    }

    fn create_tool(name: &'static str, description: &'static str, schema: schemars::Schema) -> Tool {
        let input_schema = serde_json::to_value(schema)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();

        Tool {
            name: Cow::Borrowed(name),
            title: None,
            description: Some(Cow::Borrowed(description)),
            input_schema: Arc::new(input_schema),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: Default::default(),
        }
    }
}

/// The complete tool list for `tools/list`
pub fn create_tool_list() -> Vec<Tool> {
    vec![
        ToolDefinitions::search_components(),
        ToolDefinitions::find_similar_components(),
        ToolDefinitions::get_component(),
        ToolDefinitions::get_index_stats(),
    ]
}

/// Route a `tools/call` to its handler, scoped to the session's org
pub async fn route_tool_call(
    state: &AppState,
    org_id: Uuid,
    name: &str,
    arguments: serde_json::Value,
) -> Result<CallToolResult> {
    match name {
        "search_components" => search_components(state, org_id, parse_args(arguments)?).await,
        "find_similar_components" => {
            find_similar_components(state, org_id, parse_args(arguments)?).await
        }
        "get_component" => get_component(state, org_id, parse_args(arguments)?).await,
        "get_index_stats" => get_index_stats(state, org_id).await,
        other => Err(Error::validation(format!("unknown tool: {other}"))),
    }
}

fn parse_args<T>(arguments: serde_json::Value) -> Result<T>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let args: T = serde_json::from_value(arguments)
        .map_err(|e| Error::validation(format!("invalid tool arguments: {e}")))?;
    args.validate()
        .map_err(|e| Error::validation(format!("invalid tool arguments: {e}")))?;
    Ok(args)
}

async fn search_components(
    state: &AppState,
    org_id: Uuid,
    args: SearchComponentsArgs,
) -> Result<CallToolResult> {
    let outcome = state
        .context
        .search
        .search(
            org_id,
            SearchRequest {
                query: args.query,
                mode: args.mode,
                limit: args.limit.unwrap_or(10),
                framework: args.framework,
                min_score: None,
            },
        )
        .await?;
    json_result(&outcome)
}

async fn find_similar_components(
    state: &AppState,
    org_id: Uuid,
    args: FindSimilarArgs,
) -> Result<CallToolResult> {
    let hits = state
        .context
        .search
        .find_similar(
            org_id,
            &args.identifier,
            args.limit.unwrap_or(5),
            args.min_score,
            args.framework,
        )
        .await?;
    json_result(&serde_json::json!({
        "identifier": args.identifier,
        "similar": hits,
    }))
}

async fn get_component(
    state: &AppState,
    org_id: Uuid,
    args: GetComponentArgs,
) -> Result<CallToolResult> {
    let components = &state.context.components;
    let component = match components
        .find_component_by_slug(org_id, &args.identifier)
        .await?
    {
        Some(component) => component,
        None => components
            .find_component_by_name(org_id, &args.identifier)
            .await?
            .ok_or_else(|| Error::not_found(format!("component {}", args.identifier)))?,
    };

    match &component.manifest {
        Some(manifest) => json_result(manifest),
        None => json_result(&serde_json::json!({
            "id": component.id,
            "slug": component.slug,
            "name": component.name,
            "framework": component.framework,
            "embeddingStatus": component.embedding_status,
            "manifest": null,
            "note": "component has no manifest yet; run the pipeline",
        })),
    }
}

async fn get_index_stats(state: &AppState, org_id: Uuid) -> Result<CallToolResult> {
    let stats = state.context.search.index_stats(org_id).await?;
    json_result(&stats)
}

fn json_result<T: serde::Serialize>(payload: &T) -> Result<CallToolResult> {
    let text = serde_json::to_string_pretty(payload)?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}
