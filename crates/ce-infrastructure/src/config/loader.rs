//! Configuration loader
//!
//! Merges configuration from defaults, a TOML file and the environment.
//! `CE_*` variables address nested keys with `__` separators
//! (e.g. `CE_SERVER__PORT`); on top of that the well-known deployment
//! variables from the reference deployment are recognized directly.

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use ce_domain::{Error, Result};

use super::types::{AppConfig, GenerationProvider, McpCorsMode};

const CONFIG_ENV_PREFIX: &str = "CE";
const DEFAULT_CONFIG_FILENAME: &str = "context-engine.toml";

/// Configuration loader service
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources.
    ///
    /// Sources merge in this order (later overrides earlier):
    /// 1. `AppConfig::default()`
    /// 2. TOML file (explicit path, or `context-engine.toml` in the cwd)
    /// 3. `CE_*` environment variables
    /// 4. Well-known deployment variables (`LLM_API_KEY`, ...)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        let file = self
            .config_path
            .clone()
            .or_else(|| Some(env::current_dir().ok()?.join(DEFAULT_CONFIG_FILENAME)))
            .filter(|path| path.exists());
        if let Some(path) = file {
            figment = figment.merge(Toml::file(&path));
            tracing::info!("configuration loaded from {}", path.display());
        }

        figment = figment.merge(Env::prefixed(&format!("{CONFIG_ENV_PREFIX}_")).split("__"));

        let mut config: AppConfig = figment.extract().map_err(|e| {
            Error::configuration_with_source("failed to extract configuration", e)
        })?;

        apply_well_known_env(&mut config);
        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &AppConfig) -> Result<()> {
        if config.environment == "production"
            && config.auth.api_key_hash_secret == "insecure-dev-secret"
        {
            return Err(Error::configuration(
                "API_KEY_HASH_SECRET must be set in production",
            ));
        }
        if let Some(token) = &config.auth.platform_token {
            if !token.starts_with("cep_") {
                return Err(Error::configuration(
                    "PLATFORM_TOKEN must carry the cep_ prefix",
                ));
            }
        }
        if config.generation.description_min >= config.generation.description_max {
            return Err(Error::configuration(
                "description_min must be below description_max",
            ));
        }
        Ok(())
    }
}

/// The deployment variables of the reference stack, applied last
fn apply_well_known_env(config: &mut AppConfig) {
    if let Ok(value) = env::var("ENVIRONMENT") {
        config.environment = value;
    }

    if let Ok(value) = env::var("LLM_API_KEY") {
        config.generation.api_key = Some(value);
    }
    if let Ok(value) = env::var("CONTEXT_ENGINE_PROVIDER") {
        match value.as_str() {
            "anthropic" => config.generation.provider = GenerationProvider::Anthropic,
            "gemini" => config.generation.provider = GenerationProvider::Gemini,
            other => tracing::warn!(provider = other, "unknown CONTEXT_ENGINE_PROVIDER ignored"),
        }
    }
    if let Ok(value) = env::var("CONTEXT_ENGINE_MODEL") {
        config.generation.model = Some(value);
    } else {
        // Provider-specific model variables
        let provider_var = match config.generation.provider {
            GenerationProvider::Anthropic => "ANTHROPIC_MODEL",
            GenerationProvider::Gemini => "GEMINI_MODEL",
        };
        if let Ok(value) = env::var(provider_var) {
            config.generation.model = Some(value);
        }
    }
    if let Some(value) = parse_env("CONTEXT_ENGINE_MAX_TOKENS") {
        config.generation.max_tokens = value;
    }
    if let Some(value) = parse_env("CONTEXT_ENGINE_TIMEOUT_MS") {
        config.generation.timeout_ms = value;
    }
    if let Some(value) = parse_env("CONTEXT_ENGINE_GENERATION_MAX_TOKENS") {
        config.generation.generation_max_tokens = Some(value);
    }
    if let Some(value) = parse_env("CONTEXT_ENGINE_DESCRIPTION_MIN") {
        config.generation.description_min = value;
    }
    if let Some(value) = parse_env("CONTEXT_ENGINE_DESCRIPTION_MAX") {
        config.generation.description_max = value;
    }

    if let Ok(value) = env::var("VOYAGE_API_KEY") {
        config.embedding.voyage_api_key = Some(value);
    }
    if let Ok(value) = env::var("DATABASE_URL") {
        config.database.url = Some(value);
    }
    if let Ok(value) = env::var("API_KEY_HASH_SECRET") {
        config.auth.api_key_hash_secret = value;
    }
    if let Ok(value) = env::var("PLATFORM_TOKEN") {
        config.auth.platform_token = Some(value);
    }
    if let Ok(value) = env::var("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = value
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
    }
    if let Ok(value) = env::var("MCP_CORS_MODE") {
        match value.as_str() {
            "permissive" => config.cors.mcp_mode = McpCorsMode::Permissive,
            "strict" => config.cors.mcp_mode = McpCorsMode::Strict,
            other => tracing::warn!(mode = other, "unknown MCP_CORS_MODE ignored"),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_sources() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.session.idle_timeout_secs, 1800);
        assert_eq!(config.generation.effective_model(), "claude-sonnet-4-5");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context-engine.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9000\n\n[reconciler]\nbatch_size = 25\n",
        )
        .unwrap();

        let config = ConfigLoader::new().with_config_path(&path).load().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.reconciler.batch_size, 25);
        // Untouched sections keep defaults
        assert_eq!(config.embedding.model, "voyage-3-large");
    }

    #[test]
    fn platform_token_prefix_is_validated() {
        let loader = ConfigLoader::new();
        let mut config = AppConfig::default();
        config.auth.platform_token = Some("wrong-prefix".to_string());
        assert!(loader.validate(&config).is_err());
        config.auth.platform_token = Some("cep_token".to_string());
        assert!(loader.validate(&config).is_ok());
    }
}
