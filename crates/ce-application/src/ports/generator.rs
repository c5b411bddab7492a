//! Metadata generation port (LLM tool-call contract)

use async_trait::async_trait;

use ce_domain::Result;

/// The single tool the model must call, with its fixed parameter schema
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name (`generate_component_metadata`)
    pub name: &'static str,
    /// Tool description shown to the model
    pub description: String,
    /// JSON Schema of the tool parameters
    pub schema: serde_json::Value,
}

/// One generation request: a deterministic prompt plus the tool contract
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System prompt framing the task
    pub system: String,
    /// User prompt summarizing the extracted component
    pub prompt: String,
    /// Tool the model must call
    pub tool: ToolSpec,
    /// Maximum output tokens
    pub max_tokens: u32,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens consumed
    pub input_tokens: u64,
    /// Completion tokens produced
    pub output_tokens: u64,
}

/// A completed generation call
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The tool-call arguments the model produced, schema-shaped
    pub data: serde_json::Value,
    /// Token accounting, when the provider reports it
    pub usage: Option<TokenUsage>,
    /// Model that answered
    pub model: String,
}

/// LLM provider capability for metadata generation.
///
/// One implementation per provider; adding a provider is a new
/// implementation, not a schema change. Failures carry the provider, model
/// and an HTTP-like class ([`ce_domain::error::GenerationErrorKind`]).
/// Timeouts are not retried here — retry is a caller decision.
#[async_trait]
pub trait MetaGenerator: Send + Sync {
    /// Execute one tool call
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome>;

    /// Provider identifier (e.g. "anthropic")
    fn provider_name(&self) -> &str;

    /// Configured model identifier
    fn model(&self) -> &str;

    /// Whether the provider is configured and reachable in principle
    fn is_available(&self) -> bool {
        true
    }
}
