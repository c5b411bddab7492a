//! Null embedding provider
//!
//! Stands in when no embedding provider is configured. Semantic and hybrid
//! surfaces check `is_available` and answer 503; keyword search keeps
//! working.

use async_trait::async_trait;

use ce_application::ports::EmbeddingProvider;
use ce_domain::constants::EMBEDDING_DIMENSIONS;
use ce_domain::entities::EmbeddingModelInfo;
use ce_domain::{Error, Result};

/// Placeholder provider for keyword-only deployments
#[derive(Debug, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    /// Create the null provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::service_unavailable(
            "embedding provider is not configured",
        ))
    }

    fn model_info(&self) -> EmbeddingModelInfo {
        EmbeddingModelInfo {
            provider: "null".to_string(),
            model: "none".to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
        }
    }

    fn provider_name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }
}
