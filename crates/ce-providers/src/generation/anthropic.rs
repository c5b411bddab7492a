//! Anthropic metadata generator
//!
//! Implements the `MetaGenerator` port over the Anthropic Messages API,
//! forcing the model to answer through the fixed metadata tool.

use async_trait::async_trait;
use reqwest::Client;

use ce_application::ports::{GenerationOutcome, GenerationRequest, MetaGenerator, TokenUsage};
use ce_domain::error::GenerationErrorKind;
use ce_domain::{Error, Result};

use super::{kind_for_status, kind_for_transport};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic generation provider
pub struct AnthropicGenerator {
    api_key: String,
    base_url: Option<String>,
    model: String,
    http_client: Client,
}

impl AnthropicGenerator {
    /// Create a new Anthropic provider
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `base_url` - Optional custom base URL
    /// * `model` - Model name (e.g. "claude-sonnet-4-5")
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
        self.base_url.as_deref().unwrap_or("https://api.anthropic.com")
    }

    fn error(&self, kind: GenerationErrorKind, message: impl Into<String>) -> Error {
        Error::generation("anthropic", &self.model, kind, message)
    }

    async fn fetch(&self, request: &GenerationRequest) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [{"role": "user", "content": request.prompt}],
            "tools": [{
                "name": request.tool.name,
                "description": request.tool.description,
                "input_schema": request.tool.schema,
            }],
            "tool_choice": {"type": "tool", "name": request.tool.name},
        });

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.effective_base_url()))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.error(kind_for_transport(&e), format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(
                kind_for_status(status),
                format!("{status}: {}", body.chars().take(400).collect::<String>()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| self.error(GenerationErrorKind::Other, format!("invalid response: {e}")))
    }
}

#[async_trait]
impl MetaGenerator for AnthropicGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let response = self.fetch(&request).await?;

        let tool_input = response["content"]
            .as_array()
            .and_then(|blocks| {
                blocks.iter().find(|block| {
                    block["type"] == "tool_use" && block["name"] == request.tool.name
                })
            })
            .map(|block| block["input"].clone())
            .ok_or_else(|| {
                self.error(
                    GenerationErrorKind::Other,
                    "response carried no tool_use block",
                )
            })?;

        let usage = response.get("usage").map(|usage| TokenUsage {
            input_tokens: usage["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: usage["output_tokens"].as_u64().unwrap_or(0),
        });
        let model = response["model"]
            .as_str()
            .unwrap_or(&self.model)
            .to_string();

        Ok(GenerationOutcome {
            data: tool_input,
            usage,
            model,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
