//! Configuration
//!
//! Typed configuration tree loaded with figment: defaults, then a TOML file,
//! then `CE_*` environment variables, then the well-known deployment
//! variables (`LLM_API_KEY`, `VOYAGE_API_KEY`, `PLATFORM_TOKEN`, ...).

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, EmbeddingConfig, GenerationConfig,
    GenerationProvider, LoggingConfig, McpCorsMode, ReconcilerSettings, ServerConfig,
    SessionConfig, WorkspaceConfig,
};
