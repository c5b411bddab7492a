//! Context Engine server binary
//!
//! Serves the component knowledge base over HTTP and MCP: the ingestion
//! pipeline (extract, generate, build), hybrid retrieval, reconciliation and
//! the platform administration surface.

use clap::Parser;

/// Command line interface for the Context Engine server
#[derive(Parser, Debug)]
#[command(name = "context-engine")]
#[command(about = "Context Engine - AI-queryable component knowledge base")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    ce_server::run(cli.config.as_deref()).await
}
