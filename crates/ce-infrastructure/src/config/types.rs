//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server binding
    pub server: ServerConfig,
    /// Logging setup
    pub logging: LoggingConfig,
    /// Token validation and key issuance
    pub auth: AuthConfig,
    /// CORS policy
    pub cors: CorsConfig,
    /// LLM metadata generation
    pub generation: GenerationConfig,
    /// Embedding provider
    pub embedding: EmbeddingConfig,
    /// Background reconciler
    pub reconciler: ReconcilerSettings,
    /// MCP session store
    pub session: SessionConfig,
    /// Temp-file workspace
    pub workspace: WorkspaceConfig,
    /// Relational store connection
    pub database: DatabaseConfig,
    /// Deployment environment name ("development", "production", ...)
    pub environment: String,
}

/// HTTP server binding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON-formatted records
    pub json_format: bool,
    /// Optional log file; daily rotation
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Token validation and key issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for API key digests
    pub api_key_hash_secret: String,
    /// The platform admin token (`cep_` prefixed); absent disables the
    /// platform surface
    pub platform_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_hash_secret: "insecure-dev-secret".to_string(),
            platform_token: None,
        }
    }
}

/// CORS mode for the MCP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpCorsMode {
    /// Reflect any origin (development default)
    #[default]
    Permissive,
    /// Only the configured allowed origins
    Strict,
}

/// CORS policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins for the HTTP API; empty allows any
    pub allowed_origins: Vec<String>,
    /// MCP endpoint CORS mode
    pub mcp_mode: McpCorsMode,
}

/// Selectable LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Anthropic Messages API (default)
    #[default]
    Anthropic,
    /// Gemini generateContent API
    Gemini,
}

/// LLM metadata generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Provider selection
    pub provider: GenerationProvider,
    /// Provider API key; absent yields the null generator
    pub api_key: Option<String>,
    /// Model override; each provider has its own default
    pub model: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// General output token budget
    pub max_tokens: u32,
    /// Override budget for the metadata tool call
    pub generation_max_tokens: Option<u32>,
    /// Minimum accepted semantic description length
    pub description_min: usize,
    /// Maximum accepted semantic description length
    pub description_max: usize,
    /// Import package fallback when no dependency matches the
    /// design-system patterns
    pub default_package: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::Anthropic,
            api_key: None,
            model: None,
            timeout_ms: 60_000,
            max_tokens: 4096,
            generation_max_tokens: None,
            description_min: 50,
            description_max: 2000,
            default_package: "@acme/ui".to_string(),
        }
    }
}

impl GenerationConfig {
    /// The model to use, falling back to the provider default
    pub fn effective_model(&self) -> String {
        match (&self.model, self.provider) {
            (Some(model), _) => model.clone(),
            (None, GenerationProvider::Anthropic) => "claude-sonnet-4-5".to_string(),
            (None, GenerationProvider::Gemini) => "gemini-2.5-flash".to_string(),
        }
    }

    /// Token budget for the metadata tool call
    pub fn effective_max_tokens(&self) -> u32 {
        self.generation_max_tokens.unwrap_or(self.max_tokens)
    }
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Voyage API key; absent yields the null provider (keyword-only mode)
    pub voyage_api_key: Option<String>,
    /// Voyage model name
    pub model: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            voyage_api_key: None,
            model: "voyage-3-large".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Background reconciler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerSettings {
    /// Rows pulled per tick
    pub batch_size: usize,
    /// Per-org cap within a batch; absent derives `ceil(batch/10)`
    pub max_per_org: Option<usize>,
    /// Rows indexed concurrently
    pub concurrency: usize,
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Age after which a processing row counts as abandoned
    pub stale_after_secs: u64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_per_org: None,
            concurrency: 4,
            interval_secs: 30,
            stale_after_secs: 600,
        }
    }
}

/// MCP session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle seconds before a session expires and its transport closes
    pub idle_timeout_secs: u64,
    /// Seconds between expiry sweeps
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            sweep_interval_secs: 60,
        }
    }
}

/// Temp-file workspace settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root; absent uses the system temp dir
    pub root: Option<PathBuf>,
}

/// Relational store connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL of the reference deployment; absent runs the
    /// in-memory backend
    pub url: Option<String>,
}
