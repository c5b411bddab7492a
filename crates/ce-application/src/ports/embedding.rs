//! Embedding provider port

use async_trait::async_trait;

use ce_domain::entities::EmbeddingModelInfo;
use ce_domain::{Error, Result};

/// Dense embedding capability.
///
/// `embed_query` has a default implementation delegating to `embed_batch`
/// with a single item; providers only implement it separately when the
/// upstream API distinguishes query from document embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts; one vector per input, fixed dimensionality
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("no embedding returned"))
    }

    /// Descriptor of the model behind this provider
    fn model_info(&self) -> EmbeddingModelInfo;

    /// Provider identifier (e.g. "voyage")
    fn provider_name(&self) -> &str;

    /// Whether the provider is configured; semantic surfaces return 503 when
    /// this is false
    fn is_available(&self) -> bool {
        true
    }
}
