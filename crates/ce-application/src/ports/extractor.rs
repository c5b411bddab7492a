//! Extraction ports

use async_trait::async_trait;

use ce_domain::Result;
use ce_domain::entities::Framework;
use ce_domain::value_objects::{ExtractedData, ExtractionDiagnostics};

/// Input to one extraction run
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Component name (e.g. "Button")
    pub name: String,
    /// Component source text
    pub source_code: String,
    /// Optional Storybook stories source
    pub stories_code: Option<String>,
    /// Authoring framework; the pipeline is implemented for react
    pub framework: Framework,
    /// Path of the component source file
    pub file_path: Option<String>,
    /// Path of the stories file
    pub stories_file_path: Option<String>,
    /// Import-alias prefixes treated as internal (e.g. `@/`)
    pub path_aliases: Vec<String>,
    /// Package names known to be part of the customer library
    pub known_packages: Vec<String>,
}

impl ExtractionRequest {
    /// Build a request with just a name and source
    pub fn new<N: Into<String>, S: Into<String>>(name: N, source_code: S) -> Self {
        Self {
            name: name.into(),
            source_code: source_code.into(),
            stories_code: None,
            framework: Framework::React,
            file_path: None,
            stories_file_path: None,
            path_aliases: vec!["@/".to_string()],
            known_packages: Vec::new(),
        }
    }
}

/// Extraction result plus its diagnostics
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Structural payload; empty on parse failure, never absent
    pub data: ExtractedData,
    /// Which path ran and why
    pub diagnostics: ExtractionDiagnostics,
}

/// Full component extractor capability.
///
/// Contract: never fails on malformed source — parse errors produce an empty
/// [`ExtractedData`] with diagnostics. Errors are reserved for internal
/// faults (e.g. a poisoned worker).
#[async_trait]
pub trait ComponentExtractor: Send + Sync {
    /// Run extraction for one component
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionOutcome>;
}

/// A prop reported by the primary (strongly-typed) analyzer
#[derive(Debug, Clone)]
pub struct AnalyzedProp {
    /// Prop name
    pub name: String,
    /// Rendered type
    pub prop_type: String,
    /// Whether the declaration is non-optional
    pub required: bool,
    /// Doc text attached to the declaration
    pub description: Option<String>,
    /// Default value rendered as text
    pub default_value: Option<String>,
    /// Values of a union-literal type
    pub values: Option<Vec<String>>,
    /// File the prop's declaration lives in, when known
    pub declared_in: Option<String>,
}

/// Primary strongly-typed props analyzer capability.
///
/// The reference deployment backs this with a TypeScript-aware analyzer;
/// `None` means the analyzer produced no result for this source (which is one
/// of the explicit fallback triggers, not an error).
pub trait PropsAnalyzer: Send + Sync {
    /// Analyze the props of `component_name` within `source`
    fn analyze_props(
        &self,
        component_name: &str,
        source: &str,
        file_path: Option<&str>,
    ) -> Option<Vec<AnalyzedProp>>;
}
