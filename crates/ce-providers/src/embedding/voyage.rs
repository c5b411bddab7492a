//! Voyage AI embedding provider
//!
//! Implements the `EmbeddingProvider` port over Voyage's embedding API. The
//! reference deployment uses `voyage-3-large` at 1024 dimensions; the schema
//! is fixed to that dimensionality, so switching models is a migration.

use async_trait::async_trait;
use reqwest::Client;

use ce_application::ports::EmbeddingProvider;
use ce_domain::constants::EMBEDDING_DIMENSIONS;
use ce_domain::entities::EmbeddingModelInfo;
use ce_domain::{Error, Result};

/// Voyage AI embedding provider
pub struct VoyageEmbeddingProvider {
    api_key: String,
    base_url: Option<String>,
    model: String,
    http_client: Client,
}

impl VoyageEmbeddingProvider {
    /// Create a new Voyage provider
    ///
    /// # Arguments
    /// * `api_key` - Voyage API key
    /// * `base_url` - Optional custom base URL (defaults to the Voyage API)
    /// * `model` - Model name (e.g. "voyage-3-large")
    /// * `http_client` - Reqwest client carrying the request timeout
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        http_client: Client,
    ) -> Self {
        Self {
            api_key,
            base_url,
            model,
            http_client,
        }
    }

    fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("https://api.voyageai.com/v1")
    }

    async fn fetch_embeddings(
        &self,
        texts: &[String],
        input_type: &str,
    ) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "input": texts,
            "model": self.model,
            "input_type": input_type,
            "output_dimension": EMBEDDING_DIMENSIONS,
        });

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.effective_base_url()))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Voyage API returned {status}: {}",
                body.chars().take(400).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("invalid response: {e}")))
    }

    fn parse_embedding(&self, index: usize, item: &serde_json::Value) -> Result<Vec<f32>> {
        let vector: Vec<f32> = item["embedding"]
            .as_array()
            .ok_or_else(|| Error::embedding(format!("invalid embedding format for text {index}")))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if vector.len() != EMBEDDING_DIMENSIONS {
            return Err(Error::embedding(format!(
                "unexpected dimensionality for text {index}: got {}, expected {}",
                vector.len(),
                EMBEDDING_DIMENSIONS
            )));
        }
        Ok(vector)
    }

    async fn embed_with_type(&self, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response_data = self.fetch_embeddings(texts, input_type).await?;
        let data = response_data["data"]
            .as_array()
            .ok_or_else(|| Error::embedding("invalid response format: missing data array"))?;

        if data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "response data count mismatch: expected {}, got {}",
                texts.len(),
                data.len()
            )));
        }

        data.iter()
            .enumerate()
            .map(|(i, item)| self.parse_embedding(i, item))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_with_type(texts, "document").await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_with_type(&[text.to_string()], "query").await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("no embedding returned"))
    }

    fn model_info(&self) -> EmbeddingModelInfo {
        EmbeddingModelInfo {
            provider: "voyage".to_string(),
            model: self.model.clone(),
            dimensions: EMBEDDING_DIMENSIONS,
        }
    }

    fn provider_name(&self) -> &str {
        "voyage"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
