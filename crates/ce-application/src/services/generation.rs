//! LLM metadata generation
//!
//! Builds the deterministic prompt and the fixed `generate_component_metadata`
//! tool schema, executes a single provider call through the [`MetaGenerator`]
//! port, and validates the tool output into a [`ComponentMeta`]. The provider
//! is never retried here; retry is a caller decision.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;

use ce_domain::value_objects::{
    AiMeta, ComponentMeta, ExtractedData, MetaExamples, Pattern,
};
use ce_domain::{Error, Result};

use crate::ports::{GenerationRequest, MetaGenerator, TokenUsage, ToolSpec};

/// Length bounds applied to generated text fields
#[derive(Debug, Clone, Copy)]
pub struct GenerationLimits {
    /// Minimum accepted description length
    pub description_min: usize,
    /// Maximum accepted description length
    pub description_max: usize,
    /// Output token budget per call
    pub max_tokens: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            description_min: 50,
            description_max: 2000,
            max_tokens: 4096,
        }
    }
}

/// A validated generation result with its provider annotations
#[derive(Debug, Clone)]
pub struct GeneratedMeta {
    /// Validated metadata payload
    pub meta: ComponentMeta,
    /// Provider that answered
    pub provider: String,
    /// Model that answered
    pub model: String,
    /// Token accounting, when reported
    pub usage: Option<TokenUsage>,
}

/// Raw shape of the `generate_component_metadata` tool call
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ToolOutput {
    /// Component description, 50 to 2000 characters
    description: String,
    /// Usage guidance block
    guidance: ToolGuidance,
    /// Usage examples; requested only when no stories were extracted
    #[serde(default)]
    examples: Option<MetaExamples>,
    /// variant -> value -> description; models sometimes stringify this
    #[serde(default)]
    variant_descriptions: Option<serde_json::Value>,
    /// sub-component -> variant -> value -> description
    #[serde(default)]
    sub_component_variant_descriptions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ToolGuidance {
    /// When the component is the right choice, at least 20 characters
    when_to_use: String,
    /// When to reach for something else, at least 10 characters
    when_not_to_use: String,
    /// Accessibility notes
    accessibility: String,
    /// Usage patterns from the allowed enumeration
    patterns: Vec<String>,
    /// Related component names
    #[serde(default)]
    related_components: Vec<String>,
}

/// Orchestrates one metadata generation call per component
pub struct GenerationService {
    generator: Arc<dyn MetaGenerator>,
    limits: GenerationLimits,
}

impl GenerationService {
    /// Create the service around a provider
    pub fn new(generator: Arc<dyn MetaGenerator>, limits: GenerationLimits) -> Self {
        Self { generator, limits }
    }

    /// Whether the underlying provider is configured
    pub fn is_available(&self) -> bool {
        self.generator.is_available()
    }

    /// Run the single tool call and validate its output
    pub async fn generate(
        &self,
        name: &str,
        extracted: &ExtractedData,
        hints: Option<&str>,
    ) -> Result<GeneratedMeta> {
        let request = GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(name, extracted, hints),
            tool: tool_spec(),
            max_tokens: self.limits.max_tokens,
        };

        let outcome = self.generator.generate(request).await?;
        let output: ToolOutput = serde_json::from_value(outcome.data).map_err(|e| {
            Error::generation(
                self.generator.provider_name(),
                &outcome.model,
                ce_domain::error::GenerationErrorKind::Other,
                format!("tool output failed schema validation: {e}"),
            )
        })?;

        let meta = validate_output(name, extracted, output, self.limits);
        Ok(GeneratedMeta {
            meta,
            provider: self.generator.provider_name().to_string(),
            model: outcome.model,
            usage: outcome.usage,
        })
    }
}

const SYSTEM_PROMPT: &str = "You are a design-system librarian. Given the structural \
API of a UI component, produce precise semantic metadata for an AI-queryable \
component knowledge base. Always answer by calling the provided tool.";

/// Build the deterministic user prompt from the extracted data.
///
/// The prompt is a pure function of its inputs: same extraction, same prompt.
fn build_prompt(name: &str, extracted: &ExtractedData, hints: Option<&str>) -> String {
    let mut prompt = format!("Component: {name}\n");

    if let Some(description) = &extracted.source_description {
        let _ = writeln!(prompt, "Source description: {description}");
    }

    if !extracted.props.is_empty() {
        prompt.push_str("\nProps:\n");
        for prop in &extracted.props {
            let _ = write!(prompt, "- {}: {}", prop.name, prop.prop_type);
            if prop.required {
                prompt.push_str(" (required)");
            }
            if let Some(default) = &prop.default_value {
                let _ = write!(prompt, " default={default}");
            }
            if let Some(description) = &prop.description {
                let _ = write!(prompt, " // {description}");
            }
            prompt.push('\n');
        }
    }

    if !extracted.variants.is_empty() {
        prompt.push_str("\nVariants:\n");
        for (variant, values) in &extracted.variants {
            let _ = write!(prompt, "- {variant}: {}", values.join(" | "));
            if let Some(default) = extracted.default_variants.get(variant) {
                let _ = write!(prompt, " (default: {default})");
            }
            prompt.push('\n');
        }
    }

    if let Some(subs) = &extracted.sub_components {
        if !subs.is_empty() {
            prompt.push_str("\nSub-components:\n");
            for sub in subs {
                let _ = write!(prompt, "- {}", sub.name);
                if sub.required_in_composition {
                    prompt.push_str(" (required in composition)");
                }
                if let Some(variants) = &sub.variants {
                    for (variant, values) in variants {
                        let _ = write!(prompt, " {variant}={}", values.join("|"));
                    }
                }
                prompt.push('\n');
            }
        }
    }

    if !extracted.npm_dependencies.is_empty() {
        let deps: Vec<&str> = extracted.npm_dependencies.keys().map(String::as_str).collect();
        let _ = writeln!(prompt, "\nDependencies: {}", deps.join(", "));
    }
    if !extracted.internal_dependencies.is_empty() {
        let _ = writeln!(
            prompt,
            "Internal dependencies: {}",
            extracted.internal_dependencies.join(", ")
        );
    }
    if let Some(base) = &extracted.base_library {
        let _ = write!(prompt, "Base library: {}", base.name);
        if let Some(component) = &base.component {
            let _ = write!(prompt, " ({component})");
        }
        prompt.push('\n');
    }

    if extracted.stories.is_empty() {
        prompt.push_str("\nNo usage examples were extracted; include an examples block.\n");
    } else {
        let _ = writeln!(
            prompt,
            "\n{} usage examples already exist; do NOT include an examples block.",
            extracted.stories.len()
        );
    }

    if let Some(hints) = hints {
        let _ = writeln!(prompt, "\nAdditional context from the library authors:\n{hints}");
    }

    let allowed: Vec<&str> = Pattern::ALL.iter().map(|p| p.as_str()).collect();
    let _ = writeln!(prompt, "\nAllowed patterns: {}", allowed.join(", "));

    prompt
}

/// The fixed tool contract; the parameter schema is generated once from the
/// output shape.
fn tool_spec() -> ToolSpec {
    let schema = schemars::schema_for!(ToolOutput);
    ToolSpec {
        name: "generate_component_metadata",
        description: "Record semantic metadata for a UI component".to_string(),
        schema: serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({})),
    }
}

/// Validate and repair the tool output into a [`ComponentMeta`].
fn validate_output(
    name: &str,
    extracted: &ExtractedData,
    output: ToolOutput,
    limits: GenerationLimits,
) -> ComponentMeta {
    let description = clamp_description(name, extracted, output.description, limits);

    let patterns: Vec<Pattern> = output
        .guidance
        .patterns
        .iter()
        .filter_map(|p| Pattern::parse(p))
        .collect();

    let when_to_use = ensure_min_len(output.guidance.when_to_use, 20, || {
        format!("Use {name} where its props and variants fit the surrounding flow.")
    });
    let when_not_to_use = ensure_min_len(output.guidance.when_not_to_use, 10, || {
        format!("Avoid {name} when a simpler element suffices.")
    });

    // Examples only survive when none were extracted from stories
    let examples = if extracted.stories.is_empty() {
        output.examples
    } else {
        None
    };

    ComponentMeta {
        name: name.to_string(),
        description: description.clone(),
        ai: AiMeta {
            semantic_description: description,
            when_to_use,
            when_not_to_use,
            patterns,
            examples,
            related_components: output.guidance.related_components,
            a11y_notes: output.guidance.accessibility,
            variant_descriptions: parse_nested_map(output.variant_descriptions),
            sub_component_variant_descriptions: parse_sub_map(
                output.sub_component_variant_descriptions,
            ),
        },
    }
}

fn ensure_min_len(value: String, min: usize, default: impl FnOnce() -> String) -> String {
    if value.trim().len() < min { default() } else { value }
}

/// Clamp a description into the configured bounds, composing a programmatic
/// default from the extraction when the model's text is too short.
fn clamp_description(
    name: &str,
    extracted: &ExtractedData,
    description: String,
    limits: GenerationLimits,
) -> String {
    let trimmed = description.trim();
    if trimmed.len() >= limits.description_min {
        if trimmed.len() > limits.description_max {
            return trimmed.chars().take(limits.description_max).collect();
        }
        return trimmed.to_string();
    }

    let mut fallback = format!("{name} is a reusable UI component");
    if let Some(base) = &extracted.base_library {
        let _ = write!(fallback, " built on {}", base.name);
    }
    if !extracted.variants.is_empty() {
        let variants: Vec<&str> = extracted.variants.keys().map(String::as_str).collect();
        let _ = write!(fallback, " with {} variants", variants.join(", "));
    }
    if extracted.accepts_children {
        fallback.push_str(" that renders arbitrary children");
    }
    fallback.push('.');
    fallback
}

/// Parse a `variant -> value -> description` payload that may arrive as an
/// object or as stringified JSON; anything else is dropped.
fn parse_nested_map(
    value: Option<serde_json::Value>,
) -> Option<BTreeMap<String, BTreeMap<String, String>>> {
    let value = normalize_json(value)?;
    let parsed: BTreeMap<String, BTreeMap<String, String>> =
        serde_json::from_value(value).ok()?;
    (!parsed.is_empty()).then_some(parsed)
}

/// Same recovery for the `sub -> variant -> value -> description` payload
fn parse_sub_map(
    value: Option<serde_json::Value>,
) -> Option<BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>> {
    let value = normalize_json(value)?;
    let parsed: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>> =
        serde_json::from_value(value).ok()?;
    (!parsed.is_empty()).then_some(parsed)
}

fn normalize_json(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    match value? {
        serde_json::Value::String(text) => serde_json::from_str(&text).ok(),
        object @ serde_json::Value::Object(_) => Some(object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GenerationOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        data: serde_json::Value,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedGenerator {
        fn new(data: serde_json::Value) -> Self {
            Self {
                data,
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl MetaGenerator for CannedGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
            *self.last_prompt.lock().unwrap() = Some(request.prompt);
            Ok(GenerationOutcome {
                data: self.data.clone(),
                usage: None,
                model: "test-model".to_string(),
            })
        }

        fn provider_name(&self) -> &str {
            "test"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    fn tool_output() -> serde_json::Value {
        serde_json::json!({
            "description": "A button component for triggering actions across forms and toolbars.",
            "guidance": {
                "whenToUse": "Use for primary and secondary actions.",
                "whenNotToUse": "Not for navigation links.",
                "accessibility": "Focusable, activates on Enter and Space.",
                "patterns": ["action", "interactive-control", "not-a-pattern"],
                "relatedComponents": ["IconButton"]
            }
        })
    }

    #[tokio::test]
    async fn patterns_are_filtered_to_the_closed_set() {
        let svc = GenerationService::new(
            Arc::new(CannedGenerator::new(tool_output())),
            GenerationLimits::default(),
        );
        let generated = svc
            .generate("Button", &ExtractedData::default(), None)
            .await
            .unwrap();
        assert_eq!(
            generated.meta.ai.patterns,
            vec![Pattern::Action, Pattern::InteractiveControl]
        );
        assert_eq!(generated.provider, "test");
        assert_eq!(generated.model, "test-model");
    }

    #[tokio::test]
    async fn short_description_replaced_by_programmatic_default() {
        let mut output = tool_output();
        output["description"] = serde_json::json!("Too short");
        let svc = GenerationService::new(
            Arc::new(CannedGenerator::new(output)),
            GenerationLimits::default(),
        );

        let mut extracted = ExtractedData::default();
        extracted
            .variants
            .insert("size".to_string(), vec!["sm".to_string(), "lg".to_string()]);
        extracted.accepts_children = true;

        let generated = svc.generate("Button", &extracted, None).await.unwrap();
        assert!(generated.meta.description.starts_with("Button is a reusable"));
        assert!(generated.meta.description.contains("size"));
    }

    #[tokio::test]
    async fn stringified_variant_descriptions_are_recovered() {
        let mut output = tool_output();
        output["variantDescriptions"] =
            serde_json::json!("{\"variant\": {\"ghost\": \"Low-emphasis\"}}");
        let svc = GenerationService::new(
            Arc::new(CannedGenerator::new(output)),
            GenerationLimits::default(),
        );
        let generated = svc
            .generate("Button", &ExtractedData::default(), None)
            .await
            .unwrap();
        let descriptions = generated.meta.ai.variant_descriptions.unwrap();
        assert_eq!(descriptions["variant"]["ghost"], "Low-emphasis");
    }

    #[tokio::test]
    async fn malformed_tool_output_is_a_typed_generation_failure() {
        let svc = GenerationService::new(
            Arc::new(CannedGenerator::new(serde_json::json!({"nope": true}))),
            GenerationLimits::default(),
        );
        let err = svc
            .generate("Button", &ExtractedData::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "GENERATION_FAILED");
    }

    #[tokio::test]
    async fn prompt_requests_examples_only_without_stories() {
        use ce_domain::value_objects::{StoryComplexity, StoryExample};

        let generator = Arc::new(CannedGenerator::new(tool_output()));
        let svc = GenerationService::new(generator.clone(), GenerationLimits::default());

        svc.generate("Button", &ExtractedData::default(), None)
            .await
            .unwrap();
        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("include an examples block"));

        let mut extracted = ExtractedData::default();
        extracted.stories.push(StoryExample {
            title: "Default".into(),
            code: "<Button />".into(),
            complexity: StoryComplexity::Minimal,
        });
        svc.generate("Button", &extracted, None).await.unwrap();
        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("do NOT include an examples block"));
    }
}
