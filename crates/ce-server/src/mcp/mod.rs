//! MCP gateway
//!
//! JSON-RPC 2.0 over streamable HTTP at `/mcp`: POST carries requests, GET
//! opens the SSE notification stream, DELETE terminates a session. Sessions
//! are negotiated through the `mcp-session-id` header and owned by the
//! authenticating org. Middleware order is fixed: CORS headers first (written
//! directly to the response), then tenant auth, then session retrieval.

pub mod cors;
pub mod gateway;
pub mod resources;
pub mod session;
pub mod tools;
mod types;

pub use types::{McpRequest, McpResponse};

use axum::Router;
use axum::routing::any;

use crate::state::AppState;

/// JSON-RPC error code: malformed request payload
pub const JSONRPC_PARSE_ERROR: i32 = -32700;
/// JSON-RPC error code: session missing, unknown or expired
pub const JSONRPC_SESSION_ERROR: i32 = -32000;
/// JSON-RPC error code: authentication or ownership failure
pub const JSONRPC_AUTH_ERROR: i32 = -32001;
/// JSON-RPC error code: unknown method
pub const JSONRPC_METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code: invalid request parameters
pub const JSONRPC_INVALID_PARAMS: i32 = -32602;
/// JSON-RPC error code: internal failure
pub const JSONRPC_INTERNAL_ERROR: i32 = -32603;

/// Session id header negotiated by the transport
pub const SESSION_ID_HEADER: &str = "mcp-session-id";
/// Protocol version header
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
/// The protocol revision this gateway speaks
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// MCP endpoint routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/mcp", any(gateway::handle))
}
