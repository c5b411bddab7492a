//! Gemini metadata generator
//!
//! Implements the `MetaGenerator` port over the Gemini `generateContent` API
//! using forced function calling.

use async_trait::async_trait;
use reqwest::Client;

use ce_application::ports::{GenerationOutcome, GenerationRequest, MetaGenerator, TokenUsage};
use ce_domain::error::GenerationErrorKind;
use ce_domain::{Error, Result};

use super::{kind_for_status, kind_for_transport};

/// Gemini generation provider
pub struct GeminiGenerator {
    api_key: String,
    base_url: Option<String>,
    model: String,
    http_client: Client,
}

impl GeminiGenerator {
    /// Create a new Gemini provider
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
        self.base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }

    fn error(&self, kind: GenerationErrorKind, message: impl Into<String>) -> Error {
        Error::generation("gemini", &self.model, kind, message)
    }

    async fn fetch(&self, request: &GenerationRequest) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "systemInstruction": {"parts": [{"text": request.system}]},
            "contents": [{"role": "user", "parts": [{"text": request.prompt}]}],
            "tools": [{
                "functionDeclarations": [{
                    "name": request.tool.name,
                    "description": request.tool.description,
                    "parameters": request.tool.schema,
                }],
            }],
            "toolConfig": {
                "functionCallingConfig": {
                    "mode": "ANY",
                    "allowedFunctionNames": [request.tool.name],
                },
            },
            "generationConfig": {"maxOutputTokens": request.max_tokens},
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.effective_base_url(),
            self.model
        );
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
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
impl MetaGenerator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let response = self.fetch(&request).await?;

        let parts = response["candidates"][0]["content"]["parts"].clone();
        let function_call = parts
            .as_array()
            .and_then(|parts| {
                parts
                    .iter()
                    .find(|part| part["functionCall"]["name"] == request.tool.name)
            })
            .map(|part| part["functionCall"]["args"].clone())
            .ok_or_else(|| {
                self.error(
                    GenerationErrorKind::Other,
                    "response carried no function call",
                )
            })?;

        let usage = response.get("usageMetadata").map(|usage| TokenUsage {
            input_tokens: usage["promptTokenCount"].as_u64().unwrap_or(0),
            output_tokens: usage["candidatesTokenCount"].as_u64().unwrap_or(0),
        });

        Ok(GenerationOutcome {
            data: function_call,
            usage,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
