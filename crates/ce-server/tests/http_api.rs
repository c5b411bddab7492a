//! HTTP API and MCP gateway tests
//!
//! Exercise the router end to end with the in-memory backend and null
//! LLM/embedding providers: platform administration, the pipeline surface,
//! degraded search modes and the MCP session machine.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ce_infrastructure::bootstrap::build_context;
use ce_infrastructure::config::AppConfig;
use ce_server::http::router;
use ce_server::mcp::session::McpSessionStore;
use ce_server::state::AppState;

const PLATFORM_TOKEN: &str = "cep_test-platform-token";

fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.platform_token = Some(PLATFORM_TOKEN.to_string());
    let context = Arc::new(build_context(config).unwrap());
    let sessions = Arc::new(McpSessionStore::new(1800));
    router(AppState { context, sessions })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value, axum::http::HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json, headers)
}

/// Provision an org and an API key with the given scopes
async fn provision(app: &Router, scopes: &[&str]) -> (String, String) {
    let (status, body, _) = send(
        app,
        "POST",
        "/api/v1/platform/organizations",
        Some(PLATFORM_TOKEN),
        Some(serde_json::json!({"name": "Acme"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let org_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = send(
        app,
        "POST",
        &format!("/api/v1/platform/organizations/{org_id}/api-keys"),
        Some(PLATFORM_TOKEN),
        Some(serde_json::json!({"scopes": scopes})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let raw_key = body["data"]["rawKey"].as_str().unwrap().to_string();
    assert!(raw_key.starts_with("ce_"));

    (org_id, raw_key)
}

const BUTTON_SOURCE: &str = r#"
export interface ButtonProps {
  variant?: "default" | "ghost"
  label: string
}
export function Button({ variant = "default", label }: ButtonProps) {
  return <button data-variant={variant}>{label}</button>
}
"#;

#[tokio::test]
async fn health_is_open() {
    let app = app();
    let (status, body, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["embedding"]["available"], false);
}

#[tokio::test]
async fn platform_surface_requires_the_platform_token() {
    let app = app();
    let (status, body, _) = send(
        &app,
        "POST",
        "/api/v1/platform/organizations",
        None,
        Some(serde_json::json!({"name": "Acme"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    // A tenant key is not a platform token
    let (_, raw_key) = provision(&app, &["admin"]).await;
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/v1/platform/organizations",
        Some(&raw_key),
        Some(serde_json::json!({"name": "Evil"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn extract_and_read_back_by_slug() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/processing/extract"),
        Some(&key),
        Some(serde_json::json!({
            "sourceCode": BUTTON_SOURCE,
            "name": "Button",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["name"], "Button");
    assert_eq!(data["framework"], "react");
    assert_eq!(data["metadata"]["fallbackTriggered"], false);
    let slug = data["slug"].as_str().unwrap();
    assert!(slug.starts_with("button-react-"));

    let variant = data["extraction"]["props"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "variant")
        .cloned()
        .unwrap();
    assert_eq!(variant["type"], "string");
    assert_eq!(variant["defaultValue"], "default");

    let (status, body, _) = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org_id}/components/slug/{slug}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], slug);
    assert_eq!(body["data"]["embeddingStatus"], "pending");
}

#[tokio::test]
async fn scopes_guard_the_pipeline_routes() {
    let app = app();
    let (org_id, read_key) = provision(&app, &["component:read"]).await;

    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/processing/extract"),
        Some(&read_key),
        Some(serde_json::json!({"sourceCode": "x", "name": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // The key cannot cross into another org either
    let (other_org, _) = provision(&app, &["admin"]).await;
    let (status, _, _) = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{other_org}/components"),
        Some(&read_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn generate_degrades_to_503_without_a_provider() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    let (_, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/processing/extract"),
        Some(&key),
        Some(serde_json::json!({"sourceCode": BUTTON_SOURCE, "name": "Button"})),
    )
    .await;
    let component_id = body["data"]["componentId"].as_str().unwrap().to_string();

    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/processing/generate"),
        Some(&key),
        Some(serde_json::json!({"componentId": component_id})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn search_modes_degrade_by_embedding_availability() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    // Keyword works without embeddings (no indexed rows yet: empty)
    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/search"),
        Some(&key),
        Some(serde_json::json!({"query": "button", "mode": "keyword"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    // Hybrid and semantic need the embedding provider
    for mode in ["hybrid", "semantic"] {
        let (status, body, _) = send(
            &app,
            "POST",
            &format!("/api/v1/organizations/{org_id}/search"),
            Some(&key),
            Some(serde_json::json!({"query": "button", "mode": mode})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "mode {mode}");
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }
}

#[tokio::test]
async fn empty_query_yields_zero_results_not_an_error() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    for mode in ["keyword", "hybrid", "semantic"] {
        let (status, body, _) = send(
            &app,
            "POST",
            &format!("/api/v1/organizations/{org_id}/search"),
            Some(&key),
            Some(serde_json::json!({"query": "", "mode": mode})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "mode {mode}");
        assert_eq!(body["data"]["total"], 0);
        assert!(body["data"]["results"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn search_rejects_oversized_queries() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/search"),
        Some(&key),
        Some(serde_json::json!({"query": "x".repeat(501)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn reconciliation_status_counts_components() {
    let app = app();
    let (org_id, key) = provision(&app, &["admin"]).await;

    send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org_id}/processing/extract"),
        Some(&key),
        Some(serde_json::json!({"sourceCode": BUTTON_SOURCE, "name": "Button"})),
    )
    .await;

    let (status, body, _) = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org_id}/reconciliation/status"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn mcp_session_machine() {
    let app = app();
    let (_, key) = provision(&app, &["admin"]).await;

    // Without a token the gateway answers with the auth error code
    let (status, body, _) = send(
        &app,
        "POST",
        "/mcp",
        None,
        Some(serde_json::json!({"jsonrpc": "2.0", "method": "initialize", "id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);

    // Initialize creates a session; the id comes back in the header
    let (status, body, headers) = send(
        &app,
        "POST",
        "/mcp",
        Some(&key),
        Some(serde_json::json!({"jsonrpc": "2.0", "method": "initialize", "id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["serverInfo"]["name"], "Context Engine");
    assert!(headers.get("mcp-protocol-version").is_some());
    let session_id = headers
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Non-initialize without a session is a session error
    let (status, body, _) = send(
        &app,
        "POST",
        "/mcp",
        Some(&key),
        Some(serde_json::json!({"jsonrpc": "2.0", "method": "tools/list", "id": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32000);

    // tools/list on the session reports the four read-only tools
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {key}"))
        .header(header::CONTENT_TYPE, "application/json");
    builder = builder.header("mcp-session-id", &session_id);
    let request = builder
        .body(Body::from(
            serde_json::json!({"jsonrpc": "2.0", "method": "tools/list", "id": 3}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "search_components",
            "find_similar_components",
            "get_component",
            "get_index_stats"
        ]
    );

    // DELETE terminates; a second DELETE is a session error
    let request = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {key}"))
        .header("mcp-session-id", &session_id)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {key}"))
        .header("mcp-session-id", &session_id)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], -32000);
}

#[tokio::test]
async fn mcp_sessions_are_org_owned() {
    let app = app();
    let (_, key_a) = provision(&app, &["admin"]).await;
    let (_, key_b) = provision(&app, &["admin"]).await;

    let (_, _, headers) = send(
        &app,
        "POST",
        "/mcp",
        Some(&key_a),
        Some(serde_json::json!({"jsonrpc": "2.0", "method": "initialize", "id": 1})),
    )
    .await;
    let session_id = headers
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Another org's key cannot use the session
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::AUTHORIZATION, format!("Bearer {key_b}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("mcp-session-id", &session_id)
        .body(Body::from(
            serde_json::json!({"jsonrpc": "2.0", "method": "ping", "id": 2}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], -32001);
}
