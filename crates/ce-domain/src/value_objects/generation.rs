//! LLM-generated semantic metadata payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed enumeration of usage patterns.
///
/// Generated `patterns` lists are filtered to this set; unknown values are
/// dropped, never stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Participates in forms (inputs, selects, checkboxes)
    FormElement,
    /// Clickable/togglable control
    InteractiveControl,
    /// Container surface (cards, panels)
    Surface,
    /// Expand/collapse behavior
    Disclosure,
    /// Status communication (alerts, toasts)
    Feedback,
    /// Wayfinding (menus, tabs, breadcrumbs)
    Navigation,
    /// Read-only presentation of data
    DataDisplay,
    /// Structural arrangement
    Layout,
    /// Rendered above the page (dialogs, popovers)
    Overlay,
    /// Free-form user input
    Input,
    /// Triggers an operation
    Action,
}

impl Pattern {
    /// Every allowed pattern, in canonical order
    pub const ALL: [Pattern; 11] = [
        Pattern::FormElement,
        Pattern::InteractiveControl,
        Pattern::Surface,
        Pattern::Disclosure,
        Pattern::Feedback,
        Pattern::Navigation,
        Pattern::DataDisplay,
        Pattern::Layout,
        Pattern::Overlay,
        Pattern::Input,
        Pattern::Action,
    ];

    /// Parse a pattern string, returning `None` for values outside the set
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "form-element" => Some(Self::FormElement),
            "interactive-control" => Some(Self::InteractiveControl),
            "surface" => Some(Self::Surface),
            "disclosure" => Some(Self::Disclosure),
            "feedback" => Some(Self::Feedback),
            "navigation" => Some(Self::Navigation),
            "data-display" => Some(Self::DataDisplay),
            "layout" => Some(Self::Layout),
            "overlay" => Some(Self::Overlay),
            "input" => Some(Self::Input),
            "action" => Some(Self::Action),
            _ => None,
        }
    }

    /// Canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormElement => "form-element",
            Self::InteractiveControl => "interactive-control",
            Self::Surface => "surface",
            Self::Disclosure => "disclosure",
            Self::Feedback => "feedback",
            Self::Navigation => "navigation",
            Self::DataDisplay => "data-display",
            Self::Layout => "layout",
            Self::Overlay => "overlay",
            Self::Input => "input",
            Self::Action => "action",
        }
    }
}

/// A titled code example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExampleBlock {
    /// Example title
    pub title: String,
    /// JSX snippet
    pub code: String,
    /// Optional prose description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generated examples, produced only when no stories were extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaExamples {
    /// Smallest working usage
    pub minimal: ExampleBlock,
    /// Typical usages
    pub common: Vec<ExampleBlock>,
    /// Stateful/async usages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<Vec<ExampleBlock>>,
}

/// Semantic guidance block of the generated metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMeta {
    /// One-paragraph semantic description
    pub semantic_description: String,
    /// When the component is the right choice
    pub when_to_use: String,
    /// When to reach for something else
    pub when_not_to_use: String,
    /// Usage patterns, filtered to the closed enumeration
    pub patterns: Vec<Pattern>,
    /// Generated examples (absent when stories were extracted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<MetaExamples>,
    /// Names of related components in the same library
    pub related_components: Vec<String>,
    /// Accessibility notes
    pub a11y_notes: String,
    /// variant -> value -> description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_descriptions: Option<BTreeMap<String, BTreeMap<String, String>>>,
    /// sub-component -> variant -> value -> description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_component_variant_descriptions:
        Option<BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>>,
}

/// LLM-produced semantic metadata for one component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    /// Component name
    pub name: String,
    /// Validated description (length-clamped)
    pub description: String,
    /// Semantic guidance
    pub ai: AiMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_set_is_closed() {
        assert_eq!(Pattern::parse("overlay"), Some(Pattern::Overlay));
        assert_eq!(Pattern::parse("modal"), None);
        for p in Pattern::ALL {
            assert_eq!(Pattern::parse(p.as_str()), Some(p));
        }
    }

    #[test]
    fn meta_serializes_camel_case() {
        let meta = ComponentMeta {
            name: "Button".into(),
            description: "A button".into(),
            ai: AiMeta {
                semantic_description: "Clickable".into(),
                when_to_use: "For actions".into(),
                when_not_to_use: "For navigation".into(),
                patterns: vec![Pattern::Action],
                related_components: vec!["IconButton".into()],
                a11y_notes: "Focusable".into(),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["ai"]["whenToUse"], "For actions");
        assert_eq!(json["ai"]["patterns"][0], "action");
        assert!(json["ai"].get("variantDescriptions").is_none());
    }
}
