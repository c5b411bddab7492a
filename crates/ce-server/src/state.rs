//! Shared server state

use std::sync::Arc;

use ce_infrastructure::bootstrap::AppContext;

use crate::mcp::session::McpSessionStore;

/// State injected into every handler
#[derive(Clone)]
pub struct AppState {
    /// Wired services and stores
    pub context: Arc<AppContext>,
    /// MCP session store
    pub sessions: Arc<McpSessionStore>,
}
