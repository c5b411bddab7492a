//! MCP request handling
//!
//! One axum handler fronts `/mcp` for every method. The order is fixed:
//! CORS headers are computed first and written directly onto whatever
//! response leaves the handler, then the caller is authenticated (tenant key
//! with `component:read`), then GET/DELETE resolve and check ownership of
//! the session named by the `mcp-session-id` header.
//!
//! POST without a session id may only carry `initialize`; the new session id
//! is echoed in the response headers. POST with a valid id dispatches on the
//! stored session. GET opens the SSE notification stream. DELETE closes the
//! session.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::Stream;
use tokio::sync::broadcast;
use uuid::Uuid;

use ce_domain::auth::{AuthContext, Scope};
use ce_domain::{Error, Result};

use super::session::SessionHandle;
use super::types::{McpRequest, McpResponse};
use super::{
    JSONRPC_AUTH_ERROR, JSONRPC_INTERNAL_ERROR, JSONRPC_INVALID_PARAMS,
    JSONRPC_METHOD_NOT_FOUND, JSONRPC_PARSE_ERROR, JSONRPC_SESSION_ERROR, PROTOCOL_VERSION,
    PROTOCOL_VERSION_HEADER, SESSION_ID_HEADER, cors, resources, tools,
};
use crate::state::AppState;

/// Entry point for every `/mcp` request
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // CORS first: headers are written directly to the response
    let mut response_headers = HeaderMap::new();
    cors::write_cors_headers(&mut response_headers, &headers, &state.context.config.cors);
    response_headers.insert(
        PROTOCOL_VERSION_HEADER,
        HeaderValue::from_static(PROTOCOL_VERSION),
    );

    if method == Method::OPTIONS {
        return with_headers(StatusCode::NO_CONTENT.into_response(), response_headers);
    }

    // Auth second: a tenant key with component:read
    let org_id = match authenticate(&state, &headers).await {
        Ok(org_id) => org_id,
        Err(error) => {
            let status = match &error {
                Error::Forbidden { .. } => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            };
            return rpc_error(
                status,
                response_headers,
                None,
                JSONRPC_AUTH_ERROR,
                error.to_string(),
            );
        }
    };

    if method == Method::POST {
        handle_post(&state, org_id, &headers, body, response_headers).await
    } else if method == Method::GET {
        handle_get(&state, org_id, &headers, response_headers)
    } else if method == Method::DELETE {
        handle_delete(&state, org_id, &headers, response_headers)
    } else {
        with_headers(StatusCode::METHOD_NOT_ALLOWED.into_response(), response_headers)
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;

    let context = state.context.auth.validate_token(token).await?;
    let AuthContext::Tenant(tenant) = &context else {
        return Err(Error::forbidden("the MCP gateway requires a tenant API key"));
    };
    if !context.has_scope(Scope::ComponentRead) {
        return Err(Error::forbidden("missing required scope: component:read"));
    }
    Ok(tenant.org_id)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Resolve the session named in the headers and check its ownership
fn resolve_session(
    state: &AppState,
    org_id: Uuid,
    headers: &HeaderMap,
) -> std::result::Result<SessionHandle, (StatusCode, i32, String)> {
    let Some(id) = session_id(headers) else {
        return Err((
            StatusCode::BAD_REQUEST,
            JSONRPC_SESSION_ERROR,
            "missing mcp-session-id header".to_string(),
        ));
    };
    let Some(session) = state.sessions.get(&id) else {
        return Err((
            StatusCode::NOT_FOUND,
            JSONRPC_SESSION_ERROR,
            format!("session not found: {id}"),
        ));
    };
    if session.org_id != org_id {
        return Err((
            StatusCode::FORBIDDEN,
            JSONRPC_AUTH_ERROR,
            "session belongs to another organization".to_string(),
        ));
    }
    Ok(session)
}

async fn handle_post(
    state: &AppState,
    org_id: Uuid,
    headers: &HeaderMap,
    body: Bytes,
    mut response_headers: HeaderMap,
) -> Response {
    let request: McpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(error) => {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                response_headers,
                None,
                JSONRPC_PARSE_ERROR,
                format!("parse error: {error}"),
            );
        }
    };

    let session = if session_id(headers).is_some() {
        match resolve_session(state, org_id, headers) {
            Ok(session) => session,
            Err((status, code, message)) => {
                return rpc_error(status, response_headers, request.id, code, message);
            }
        }
    } else {
        // A fresh connection may only initialize; the transport assigns the
        // id and echoes it back
        if request.method != "initialize" {
            return rpc_error(
                StatusCode::BAD_REQUEST,
                response_headers,
                request.id,
                JSONRPC_SESSION_ERROR,
                "initialize first: no session established",
            );
        }
        let session = state.sessions.create(org_id);
        tracing::debug!(session_id = %session.session_id, %org_id, "MCP session created");
        session
    };

    if let Ok(value) = HeaderValue::from_str(&session.session_id) {
        response_headers.insert(SESSION_ID_HEADER, value);
    }

    // Notifications get acknowledged without a body
    if request.id.is_none() && request.method.starts_with("notifications/") {
        return with_headers(StatusCode::ACCEPTED.into_response(), response_headers);
    }

    let (status, response) = dispatch(state, &session, request).await;
    rpc_response(status, response_headers, response)
}

fn handle_get(
    state: &AppState,
    org_id: Uuid,
    headers: &HeaderMap,
    response_headers: HeaderMap,
) -> Response {
    let session = match resolve_session(state, org_id, headers) {
        Ok(session) => session,
        Err((status, code, message)) => {
            return rpc_error(status, response_headers, None, code, message);
        }
    };

    let receiver = session.notifications.subscribe();
    let stream = notification_stream(receiver);
    let sse = Sse::new(stream).keep_alive(KeepAlive::default());
    with_headers(sse.into_response(), response_headers)
}

fn notification_stream(
    mut receiver: broadcast::Receiver<String>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(message) => yield Ok(Event::default().data(message)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "MCP notification stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

fn handle_delete(
    state: &AppState,
    org_id: Uuid,
    headers: &HeaderMap,
    response_headers: HeaderMap,
) -> Response {
    let session = match resolve_session(state, org_id, headers) {
        Ok(session) => session,
        Err((status, code, message)) => {
            return rpc_error(status, response_headers, None, code, message);
        }
    };

    state.sessions.remove(&session.session_id);
    tracing::debug!(session_id = %session.session_id, "MCP session terminated");
    rpc_response(
        StatusCode::OK,
        response_headers,
        McpResponse::success(None, serde_json::json!({"terminated": true})),
    )
}

/// Route one JSON-RPC request on an established session
async fn dispatch(
    state: &AppState,
    session: &SessionHandle,
    request: McpRequest,
) -> (StatusCode, McpResponse) {
    let id = request.id.clone();
    match request.method.as_str() {
        "initialize" => (StatusCode::OK, handle_initialize(id)),
        "ping" => (
            StatusCode::OK,
            McpResponse::success(id, serde_json::json!({})),
        ),
        "tools/list" => (StatusCode::OK, handle_tools_list(id)),
        "tools/call" => handle_tools_call(state, session, id, request.params).await,
        "resources/list" => (
            StatusCode::OK,
            McpResponse::success(id, serde_json::json!({"resources": resources::list_resources()})),
        ),
        "resources/read" => handle_resources_read(state, session, id, request.params).await,
        other => (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_METHOD_NOT_FOUND, format!("unknown method: {other}")),
        ),
    }
}

fn handle_initialize(id: Option<serde_json::Value>) -> McpResponse {
    McpResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
            },
            "serverInfo": {
                "name": "Context Engine",
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": "Context Engine - Component Knowledge Base\n\n\
                Search a UI component library and read canonical manifests.\n\n\
                Tools:\n\
                - search_components: keyword, semantic or hybrid search\n\
                - find_similar_components: neighbors of a known component\n\
                - get_component: the full manifest of one component\n\
                - get_index_stats: index health and coverage\n",
        }),
    )
}

fn handle_tools_list(id: Option<serde_json::Value>) -> McpResponse {
    let tools_json: Vec<serde_json::Value> = tools::create_tool_list()
        .into_iter()
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema.as_ref(),
            })
        })
        .collect();
    McpResponse::success(id, serde_json::json!({"tools": tools_json}))
}

async fn handle_tools_call(
    state: &AppState,
    session: &SessionHandle,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> (StatusCode, McpResponse) {
    let Some(params) = params else {
        return (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_INVALID_PARAMS, "missing params for tools/call"),
        );
    };
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_INVALID_PARAMS, "missing 'name' for tools/call"),
        );
    };
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    match tools::route_tool_call(state, session.org_id, tool_name, arguments).await {
        Ok(result) => (
            StatusCode::OK,
            McpResponse::success(id, tool_result_to_json(&result)),
        ),
        Err(error) => domain_error_to_rpc(id, error),
    }
}

async fn handle_resources_read(
    state: &AppState,
    session: &SessionHandle,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> (StatusCode, McpResponse) {
    let Some(uri) = params
        .as_ref()
        .and_then(|p| p.get("uri"))
        .and_then(|v| v.as_str())
    else {
        return (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_INVALID_PARAMS, "missing 'uri' for resources/read"),
        );
    };

    match resources::read_resource(state, session.org_id, uri).await {
        Ok(contents) => (StatusCode::OK, McpResponse::success(id, contents)),
        Err(error) => domain_error_to_rpc(id, error),
    }
}

/// Convert a tool call result into the wire shape
fn tool_result_to_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content: Vec<serde_json::Value> = result
        .content
        .iter()
        .map(|item| {
            serde_json::to_value(item).unwrap_or_else(|_| {
                serde_json::json!({"type": "text", "text": "error serializing content"})
            })
        })
        .collect();
    serde_json::json!({
        "content": content,
        "isError": result.is_error.unwrap_or(false),
    })
}

/// Map a domain error to a JSON-RPC error plus transport status
fn domain_error_to_rpc(
    id: Option<serde_json::Value>,
    error: Error,
) -> (StatusCode, McpResponse) {
    match &error {
        Error::ServiceUnavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            McpResponse::error_with_data(
                id,
                JSONRPC_SESSION_ERROR,
                error.to_string(),
                serde_json::json!({"reason": "embedding_unavailable"}),
            ),
        ),
        Error::Unauthorized { .. } | Error::Forbidden { .. } => (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_AUTH_ERROR, error.to_string()),
        ),
        Error::Validation { .. } | Error::NotFound { .. } => (
            StatusCode::OK,
            McpResponse::error(id, JSONRPC_INVALID_PARAMS, error.to_string()),
        ),
        _ => {
            tracing::error!(%error, "MCP tool call failed");
            (
                StatusCode::OK,
                McpResponse::error(id, JSONRPC_INTERNAL_ERROR, error.to_string()),
            )
        }
    }
}

fn rpc_response(status: StatusCode, headers: HeaderMap, response: McpResponse) -> Response {
    with_headers((status, axum::Json(response)).into_response(), headers)
}

fn rpc_error(
    status: StatusCode,
    headers: HeaderMap,
    id: Option<serde_json::Value>,
    code: i32,
    message: impl Into<String>,
) -> Response {
    rpc_response(status, headers, McpResponse::error(id, code, message))
}

fn with_headers(mut response: Response, headers: HeaderMap) -> Response {
    for (name, value) in headers.iter() {
        response.headers_mut().insert(name, value.clone());
    }
    response
}
