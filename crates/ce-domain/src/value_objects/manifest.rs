//! Canonical merged manifest payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::extraction::{BaseLibraryRef, RadixPrimitiveRef};
use super::generation::{ExampleBlock, Pattern};

/// A prop as rendered in the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestProp {
    /// Prop name
    pub name: String,
    /// Simplified type
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Whether the prop is required
    pub required: bool,
    /// Default value, rendered as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Prose description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values for enum-like props
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// value -> description, from generated variant descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_descriptions: Option<BTreeMap<String, String>>,
}

/// Props grouped by role. Empty groups are omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedProps {
    /// Style-switch props backed by variant builders
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub variants: Vec<ManifestProp>,
    /// Boolean/state behavior props
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub behaviors: Vec<ManifestProp>,
    /// Event handler props
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<ManifestProp>,
    /// Render-slot props
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub slots: Vec<ManifestProp>,
    /// Everything else
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub other: Vec<ManifestProp>,
}

impl CategorizedProps {
    /// Whether every group is empty
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
            && self.behaviors.is_empty()
            && self.events.is_empty()
            && self.slots.is_empty()
            && self.other.is_empty()
    }

    /// Total prop count across groups
    pub fn len(&self) -> usize {
        self.variants.len()
            + self.behaviors.len()
            + self.events.len()
            + self.slots.len()
            + self.other.len()
    }

    /// Iterate over all props in group order
    pub fn iter(&self) -> impl Iterator<Item = &ManifestProp> {
        self.variants
            .iter()
            .chain(&self.behaviors)
            .chain(&self.events)
            .chain(&self.slots)
            .chain(&self.other)
    }
}

/// Import statement block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// Primary value import
    pub primary: String,
    /// Type-only import of the props type
    pub type_only: String,
    /// Optional subpath import form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

/// Examples section of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExamples {
    /// Smallest working usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimal: Option<ExampleBlock>,
    /// Typical usages, at most 8
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub common: Vec<ExampleBlock>,
    /// Stateful usages, at most 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<Vec<ExampleBlock>>,
}

impl ManifestExamples {
    /// Whether the section carries no examples at all
    pub fn is_empty(&self) -> bool {
        self.minimal.is_none()
            && self.common.is_empty()
            && self.advanced.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Guidance section of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    /// When the component is the right choice
    pub when_to_use: String,
    /// When to reach for something else
    pub when_not_to_use: String,
    /// Accessibility notes
    pub accessibility: String,
    /// Usage patterns
    pub patterns: Vec<Pattern>,
    /// Related components that exist in the library
    pub related_components: Vec<String>,
}

/// Dependencies section of the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDependencies {
    /// External package -> version spec
    pub npm: BTreeMap<String, String>,
    /// Internal component names
    pub internal: Vec<String>,
}

impl ManifestDependencies {
    /// Whether both lists are empty
    pub fn is_empty(&self) -> bool {
        self.npm.is_empty() && self.internal.is_empty()
    }
}

/// A sub-component as rendered in the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSubComponent {
    /// Sub-component name
    pub name: String,
    /// Prose description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `data-slot` attribute value (kebab-cased name)
    pub data_slot: String,
    /// Whether the sub is required inside the root's composition
    pub required_in_composition: bool,
    /// Categorized props
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<CategorizedProps>,
    /// Radix primitive backing this sub
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radix_primitive: Option<RadixPrimitiveRef>,
}

/// The merged, AI-consumable view of one component.
///
/// Empty sections are omitted from the serialized payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiManifest {
    /// Component name
    pub name: String,
    /// Per-org unique slug
    pub slug: String,
    /// Validated description
    pub description: String,
    /// Import statement block
    pub import_statement: ImportStatement,
    /// Whether the component renders children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<bool>,
    /// Categorized props
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<CategorizedProps>,
    /// Usage examples
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<ManifestExamples>,
    /// Usage guidance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<Guidance>,
    /// Dependency summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<ManifestDependencies>,
    /// Base library reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_library: Option<BaseLibraryRef>,
    /// Compound sub-components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_components: Option<Vec<ManifestSubComponent>>,
    /// Radix primitive backing the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radix_primitive: Option<RadixPrimitiveRef>,
}

impl Default for ImportStatement {
    fn default() -> Self {
        Self {
            primary: String::new(),
            type_only: String::new(),
            subpath: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_are_omitted() {
        let manifest = AiManifest {
            name: "Button".into(),
            slug: "button-react-a1b2c3d4".into(),
            description: "A button".into(),
            import_statement: ImportStatement {
                primary: "import { Button } from '@acme/ui'".into(),
                type_only: "import type { ButtonProps } from '@acme/ui'".into(),
                subpath: None,
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("props").is_none());
        assert!(json.get("guidance").is_none());
        assert!(json.get("subComponents").is_none());
        assert!(
            json["importStatement"]["typeOnly"]
                .as_str()
                .unwrap()
                .contains("ButtonProps")
        );
    }

    #[test]
    fn categorized_props_iter_covers_all_groups() {
        let props = CategorizedProps {
            variants: vec![ManifestProp::default()],
            events: vec![ManifestProp::default(), ManifestProp::default()],
            ..Default::default()
        };
        assert_eq!(props.len(), 3);
        assert_eq!(props.iter().count(), 3);
        assert!(!props.is_empty());
    }
}
