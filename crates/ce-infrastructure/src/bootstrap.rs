//! Application wiring
//!
//! Builds the application context from configuration: chooses providers,
//! constructs the storage backend and assembles the services through
//! constructor injection. The server layer receives one [`AppContext`] and
//! never constructs services itself.

use std::sync::Arc;
use std::time::Duration;

use ce_application::ports::{
    ApiKeyStore, ChunkStore, ComponentExtractor, ComponentStore, EmbeddingProvider, MetaGenerator,
    OrganizationStore,
};
use ce_application::services::{
    AuthService, GenerationLimits, GenerationService, ProcessingService, ReconcilerConfig,
    ReconcilerService, SearchService,
};
use ce_domain::Result;
use ce_providers::embedding::{NullEmbeddingProvider, VoyageEmbeddingProvider};
use ce_providers::extractor::TsxExtractor;
use ce_providers::generation::{AnthropicGenerator, GeminiGenerator, NullGenerator};
use ce_providers::storage::MemoryStore;

use crate::config::{AppConfig, GenerationProvider};
use crate::workspace::TempWorkspace;

/// Fully wired application services and stores
pub struct AppContext {
    /// Loaded configuration
    pub config: AppConfig,
    /// Organization store
    pub orgs: Arc<dyn OrganizationStore>,
    /// API key store
    pub api_keys: Arc<dyn ApiKeyStore>,
    /// Component store
    pub components: Arc<dyn ComponentStore>,
    /// Chunk store
    pub chunks: Arc<dyn ChunkStore>,
    /// Embedding provider
    pub embeddings: Arc<dyn EmbeddingProvider>,
    /// Token validation and key issuance
    pub auth: Arc<AuthService>,
    /// Pipeline orchestration
    pub processing: Arc<ProcessingService>,
    /// Search engine
    pub search: Arc<SearchService>,
    /// Embedding reconciliation
    pub reconciler: Arc<ReconcilerService>,
    /// Temp-file workspace
    pub workspace: Arc<TempWorkspace>,
}

/// Assemble the application context from configuration
pub fn build_context(config: AppConfig) -> Result<AppContext> {
    let store = Arc::new(MemoryStore::new());
    let orgs: Arc<dyn OrganizationStore> = store.clone();
    let api_keys: Arc<dyn ApiKeyStore> = store.clone();
    let components: Arc<dyn ComponentStore> = store.clone();
    let chunks: Arc<dyn ChunkStore> = store;

    let embeddings = build_embedding_provider(&config);
    let generator = build_generator(&config);

    let auth = Arc::new(AuthService::new(
        api_keys.clone(),
        config.auth.api_key_hash_secret.clone(),
        config.auth.platform_token.clone(),
    ));

    let generation = Arc::new(GenerationService::new(
        generator,
        GenerationLimits {
            description_min: config.generation.description_min,
            description_max: config.generation.description_max,
            max_tokens: config.generation.effective_max_tokens(),
        },
    ));

    let extractor: Arc<dyn ComponentExtractor> = Arc::new(TsxExtractor::new());
    let processing = Arc::new(ProcessingService::new(
        components.clone(),
        chunks.clone(),
        extractor,
        generation,
        config.generation.default_package.clone(),
    ));

    let search = Arc::new(SearchService::new(
        components.clone(),
        chunks.clone(),
        embeddings.clone(),
    ));

    let reconciler = Arc::new(ReconcilerService::new(
        components.clone(),
        chunks.clone(),
        embeddings.clone(),
        ReconcilerConfig {
            batch_size: config.reconciler.batch_size,
            max_per_org: config.reconciler.max_per_org,
            concurrency: config.reconciler.concurrency,
            interval_secs: config.reconciler.interval_secs,
            stale_after_secs: config.reconciler.stale_after_secs,
        },
    ));

    let workspace = Arc::new(TempWorkspace::startup(config.workspace.root.clone(), true)?);

    Ok(AppContext {
        config,
        orgs,
        api_keys,
        components,
        chunks,
        embeddings,
        auth,
        processing,
        search,
        reconciler,
        workspace,
    })
}

fn build_embedding_provider(config: &AppConfig) -> Arc<dyn EmbeddingProvider> {
    match &config.embedding.voyage_api_key {
        Some(api_key) if !api_key.is_empty() => {
            let client = http_client(config.embedding.timeout_ms);
            Arc::new(VoyageEmbeddingProvider::new(
                api_key.clone(),
                None,
                config.embedding.model.clone(),
                client,
            ))
        }
        _ => {
            tracing::warn!("no embedding provider configured; running keyword-only");
            Arc::new(NullEmbeddingProvider::new())
        }
    }
}

fn build_generator(config: &AppConfig) -> Arc<dyn MetaGenerator> {
    let Some(api_key) = config.generation.api_key.clone().filter(|k| !k.is_empty()) else {
        tracing::warn!("no LLM provider configured; generation endpoints will return 503");
        return Arc::new(NullGenerator::new());
    };
    let client = http_client(config.generation.timeout_ms);
    let model = config.generation.effective_model();
    match config.generation.provider {
        GenerationProvider::Anthropic => {
            Arc::new(AnthropicGenerator::new(api_key, None, model, client))
        }
        GenerationProvider::Gemini => Arc::new(GeminiGenerator::new(api_key, None, model, client)),
    }
}

fn http_client(timeout_ms: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms.max(1)))
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn default_config_wires_null_providers() {
        let context = build_context(AppConfig::default()).unwrap();
        assert!(!context.embeddings.is_available());
        assert_eq!(context.embeddings.provider_name(), "null");
    }

    #[tokio::test]
    async fn voyage_key_selects_voyage() {
        let mut config = AppConfig::default();
        config.embedding.voyage_api_key = Some("voyage-key".to_string());
        let context = build_context(config).unwrap();
        assert_eq!(context.embeddings.provider_name(), "voyage");
        assert!(context.embeddings.is_available());
    }
}
