//! Structural extraction payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single extracted prop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropInfo {
    /// Prop name
    pub name: String,
    /// Simplified type ("string", "boolean", union rendering, ...)
    #[serde(rename = "type")]
    pub prop_type: String,
    /// First JSDoc block above the declaration, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default value read from destructuring, rendered as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Values parsed from union literals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Whether the prop is required (`!optional`)
    pub required: bool,
    /// Whether this is the `children` prop
    pub is_children: bool,
}

impl PropInfo {
    /// Minimal constructor for a named prop of a simplified type
    pub fn new<N: Into<String>, T: Into<String>>(name: N, prop_type: T) -> Self {
        let name = name.into();
        Self {
            is_children: name == "children",
            name,
            prop_type: prop_type.into(),
            description: None,
            default_value: None,
            values: None,
            required: false,
        }
    }
}

/// Base library reference (e.g. Radix UI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLibraryRef {
    /// Package name
    pub name: String,
    /// Resolved component within the base library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

/// Complexity classification of an extracted story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryComplexity {
    /// Default/Basic/Simple stories
    Minimal,
    /// Everything else
    Common,
    /// Stories whose render body uses state, effects or async patterns
    Advanced,
}

/// A usage example recovered from a Storybook stories file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryExample {
    /// Story export name, humanized
    pub title: String,
    /// Render body or synthesized JSX
    pub code: String,
    /// Complexity classification
    pub complexity: StoryComplexity,
}

/// Compound component shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundInfo {
    /// Whether the file exposes a compound component
    pub is_compound: bool,
    /// Root component name
    pub root_component: String,
    /// Sub-component names
    pub sub_components: Vec<String>,
}

/// Reference to a Radix primitive backing a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadixPrimitiveRef {
    /// Primitive member name (e.g. "Trigger")
    pub primitive: String,
    /// Radix documentation anchor for the primitive
    pub docs_url: String,
}

/// Extracted data for one sub-component of a compound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubComponentInfo {
    /// Sub-component name
    pub name: String,
    /// Props extracted with the fallback walker
    pub props: Vec<PropInfo>,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the sub appears as a required descendant in the root's JSX
    pub required_in_composition: bool,
    /// Radix primitive backing this sub, when resolvable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radix_primitive: Option<RadixPrimitiveRef>,
    /// Variants owned by this sub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<BTreeMap<String, Vec<String>>>,
    /// Default variant selections for this sub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_variants: Option<BTreeMap<String, String>>,
}

/// Structural API description of a component source file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    /// Filtered prop list
    pub props: Vec<PropInfo>,
    /// Variant name -> allowed values
    pub variants: BTreeMap<String, Vec<String>>,
    /// Variant name -> default value
    pub default_variants: BTreeMap<String, String>,
    /// External package -> version spec
    pub npm_dependencies: BTreeMap<String, String>,
    /// Internal component dependencies, PascalCase
    pub internal_dependencies: Vec<String>,
    /// Whether the component renders children
    pub accepts_children: bool,
    /// Base library reference, when a single Radix package is imported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_library: Option<BaseLibraryRef>,
    /// Leading file-level description comment, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
    /// Source file paths that contributed
    pub files: Vec<String>,
    /// Usage examples recovered from stories
    pub stories: Vec<StoryExample>,
    /// Compound component shape, when detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound_info: Option<CompoundInfo>,
    /// Extracted sub-components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_components: Option<Vec<SubComponentInfo>>,
    /// Radix primitive backing the root component
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radix_primitive: Option<RadixPrimitiveRef>,
}

/// Which extraction path produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Strongly-typed analyzer only
    Primary,
    /// Syntactic walker only
    Fallback,
    /// Primary props merged with syntactic supplements
    Hybrid,
}

/// Why the syntactic fallback was triggered.
///
/// Fallback is a rule-based decision, not a quality heuristic; the reasons
/// mirror the rules one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The primary analyzer returned no result
    PrimaryUnavailable,
    /// The primary analyzer returned zero props
    NoPropsExtracted,
    /// `forwardRef` in source, no `ref` prop, fewer than two props
    ForwardRefNoProps,
    /// A HOC wrapper pattern matched with fewer than three props
    HocWrapper,
    /// A styled-components pattern matched with fewer than two props
    StyledComponents,
}

/// Diagnostics accompanying every extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDiagnostics {
    /// Path that produced the props
    #[serde(rename = "extractionMethod")]
    pub method: ExtractionMethod,
    /// Whether the fallback walker ran
    pub fallback_triggered: bool,
    /// Rule that triggered the fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl Default for ExtractionDiagnostics {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::Primary,
            fallback_triggered: false,
            fallback_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_data_serializes_camel_case() {
        let data = ExtractedData {
            accepts_children: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["acceptsChildren"], true);
        assert!(json.get("baseLibrary").is_none());
        assert!(json.get("npmDependencies").is_some());
    }

    #[test]
    fn fallback_reason_uses_snake_case_wire_form() {
        let json = serde_json::to_value(FallbackReason::ForwardRefNoProps).unwrap();
        assert_eq!(json, "forward_ref_no_props");
    }

    #[test]
    fn children_prop_is_flagged() {
        let prop = PropInfo::new("children", "ReactNode");
        assert!(prop.is_children);
        assert!(!PropInfo::new("variant", "string").is_children);
    }
}
