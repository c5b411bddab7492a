//! # Server Layer
//!
//! HTTP API and MCP gateway for the component knowledge base. Routes, bodies
//! and status codes follow the published API surface; the MCP endpoint
//! speaks JSON-RPC 2.0 over streamable HTTP with SSE notifications.

/// HTTP API routes and handlers
pub mod http;
/// MCP gateway: sessions, tools, resources
pub mod mcp;
/// Shared server state
pub mod state;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use ce_infrastructure::bootstrap::build_context;
use ce_infrastructure::config::ConfigLoader;
use ce_infrastructure::logging::init_logging;

use crate::mcp::session::McpSessionStore;
use crate::state::AppState;

/// Run the server until ctrl-c
pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }
    let config = loader.load()?;
    init_logging(&config.logging)?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let context = Arc::new(build_context(config)?);

    let sessions = Arc::new(McpSessionStore::new(
        context.config.session.idle_timeout_secs,
    ));
    let state = AppState {
        context: Arc::clone(&context),
        sessions: Arc::clone(&sessions),
    };

    // Background task group: reconciler loop + session expiry sweep
    let reconciler_handle = Arc::clone(&context.reconciler).spawn_loop();
    let sweep_handle = Arc::clone(&sessions).spawn_sweep(
        context.config.session.sweep_interval_secs,
    );

    let router = http::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("context engine listening on {bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reconciler_handle.abort();
    sweep_handle.abort();
    context.workspace.shutdown();
    info!("context engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
