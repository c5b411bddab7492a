//! Manifest assembly
//!
//! Merges one component's structural extraction with its generated metadata
//! into the canonical manifest. Pure functions throughout; the processing
//! service owns persistence.

use std::collections::BTreeMap;

use ce_domain::constants::{MAX_ADVANCED_EXAMPLES, MAX_COMMON_EXAMPLES};
use ce_domain::identity::kebab_case;
use ce_domain::value_objects::{
    AiManifest, CategorizedProps, ComponentMeta, ExampleBlock, ExtractedData, Guidance,
    ImportStatement, ManifestDependencies, ManifestExamples, ManifestProp, ManifestSubComponent,
    PropInfo, StoryComplexity, SubComponentInfo,
};

/// Identity fields of the component being built
#[derive(Debug, Clone)]
pub struct ManifestIdentity<'a> {
    /// Component name
    pub name: &'a str,
    /// Per-org unique slug
    pub slug: &'a str,
    /// Fallback package for import statements when no dependency matches
    pub default_package: &'a str,
}

/// Build the canonical manifest for a component.
///
/// `available_components` filters `relatedComponents`; when `None` the
/// generated list passes through unchanged. Empty sections are omitted.
pub fn build_manifest(
    identity: &ManifestIdentity<'_>,
    extracted: &ExtractedData,
    meta: &ComponentMeta,
    available_components: Option<&[String]>,
) -> AiManifest {
    let props = prop_pipeline(
        &extracted.props,
        &extracted.variants,
        &extracted.default_variants,
        meta.ai.variant_descriptions.as_ref(),
    );

    let examples = build_examples(extracted, meta);
    let guidance = build_guidance(meta, available_components);
    let dependencies = build_dependencies(extracted);
    let sub_components = build_sub_components(extracted, meta);

    AiManifest {
        name: identity.name.to_string(),
        slug: identity.slug.to_string(),
        description: meta.description.clone(),
        import_statement: import_statement(identity, extracted),
        children: extracted.accepts_children.then_some(true),
        props: (!props.is_empty()).then_some(props),
        examples: examples.filter(|e| !e.is_empty()),
        guidance,
        dependencies: {
            let deps = dependencies;
            (!deps.is_empty()).then_some(deps)
        },
        base_library: extracted.base_library.clone(),
        sub_components,
        radix_primitive: extracted.radix_primitive.clone(),
    }
}

/// The strict three-step prop pipeline: categorize, normalize variants,
/// enrich with value descriptions.
pub fn prop_pipeline(
    props: &[PropInfo],
    variants: &BTreeMap<String, Vec<String>>,
    default_variants: &BTreeMap<String, String>,
    variant_descriptions: Option<&BTreeMap<String, BTreeMap<String, String>>>,
) -> CategorizedProps {
    let mut categorized = categorize_props(props, variants);
    normalize_variants(&mut categorized, variants, default_variants);
    enrich_variants(&mut categorized, variant_descriptions);
    categorized
}

/// Group props by role with closed predicate precedence:
/// events > slots > variants > behaviors > other.
pub fn categorize_props(
    props: &[PropInfo],
    variants: &BTreeMap<String, Vec<String>>,
) -> CategorizedProps {
    let mut out = CategorizedProps::default();
    for prop in props {
        let rendered = to_manifest_prop(prop);
        if is_event_prop(&prop.name) {
            out.events.push(rendered);
        } else if is_slot_prop(prop) {
            out.slots.push(rendered);
        } else if variants.contains_key(&prop.name) {
            out.variants.push(rendered);
        } else if is_behavior_prop(prop) {
            out.behaviors.push(rendered);
        } else {
            out.other.push(rendered);
        }
    }
    out
}

/// Ensure every extracted variant exists as a prop in the variants group and
/// merge default selections.
pub fn normalize_variants(
    categorized: &mut CategorizedProps,
    variants: &BTreeMap<String, Vec<String>>,
    default_variants: &BTreeMap<String, String>,
) {
    for (variant_name, values) in variants {
        let existing = categorized
            .variants
            .iter_mut()
            .find(|p| &p.name == variant_name);
        match existing {
            Some(prop) => {
                prop.prop_type = "string".to_string();
                prop.values = Some(values.clone());
                prop.required = false;
                if prop.default_value.is_none() {
                    prop.default_value = default_variants.get(variant_name).cloned();
                }
            }
            None => {
                categorized.variants.push(ManifestProp {
                    name: variant_name.clone(),
                    prop_type: "string".to_string(),
                    required: false,
                    default_value: default_variants.get(variant_name).cloned(),
                    description: None,
                    values: Some(values.clone()),
                    value_descriptions: None,
                });
            }
        }
    }
}

/// Attach per-value descriptions from the generated metadata
pub fn enrich_variants(
    categorized: &mut CategorizedProps,
    variant_descriptions: Option<&BTreeMap<String, BTreeMap<String, String>>>,
) {
    let Some(descriptions) = variant_descriptions else {
        return;
    };
    for prop in &mut categorized.variants {
        if let Some(values) = descriptions.get(&prop.name) {
            if !values.is_empty() {
                prop.value_descriptions = Some(values.clone());
            }
        }
    }
}

fn to_manifest_prop(prop: &PropInfo) -> ManifestProp {
    ManifestProp {
        name: prop.name.clone(),
        prop_type: prop.prop_type.clone(),
        required: prop.required,
        default_value: prop.default_value.clone(),
        description: prop.description.clone(),
        values: prop.values.clone(),
        value_descriptions: None,
    }
}

fn is_event_prop(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on") && name.as_bytes()[2].is_ascii_uppercase()
}

fn is_slot_prop(prop: &PropInfo) -> bool {
    if prop.is_children {
        return true;
    }
    let ty = prop.prop_type.as_str();
    ty.contains("ReactNode") || ty.contains("ReactElement") || ty.contains("JSX.Element")
}

fn is_behavior_prop(prop: &PropInfo) -> bool {
    prop.prop_type == "boolean"
        || prop.name.starts_with("is")
        || prop.name.starts_with("has")
        || matches!(
            prop.name.as_str(),
            "disabled" | "loading" | "open" | "defaultOpen" | "checked" | "defaultChecked"
                | "asChild" | "readOnly" | "required"
        )
}

/// Pick the examples section: extracted stories win over generated examples.
fn build_examples(extracted: &ExtractedData, meta: &ComponentMeta) -> Option<ManifestExamples> {
    if !extracted.stories.is_empty() {
        let minimal = extracted
            .stories
            .iter()
            .find(|s| s.complexity == StoryComplexity::Minimal)
            .or_else(|| extracted.stories.first())
            .map(|s| ExampleBlock {
                title: s.title.clone(),
                code: s.code.clone(),
                description: None,
            });
        let minimal_title = minimal.as_ref().map(|m| m.title.clone());

        let common: Vec<ExampleBlock> = extracted
            .stories
            .iter()
            .filter(|s| s.complexity == StoryComplexity::Common)
            .filter(|s| minimal_title.as_deref() != Some(s.title.as_str()))
            .take(MAX_COMMON_EXAMPLES)
            .map(|s| ExampleBlock {
                title: s.title.clone(),
                code: s.code.clone(),
                description: None,
            })
            .collect();

        let advanced: Vec<ExampleBlock> = extracted
            .stories
            .iter()
            .filter(|s| s.complexity == StoryComplexity::Advanced)
            .take(MAX_ADVANCED_EXAMPLES)
            .map(|s| ExampleBlock {
                title: s.title.clone(),
                code: s.code.clone(),
                description: None,
            })
            .collect();

        return Some(ManifestExamples {
            minimal,
            common,
            advanced: (!advanced.is_empty()).then_some(advanced),
        });
    }

    meta.ai.examples.as_ref().map(|examples| ManifestExamples {
        minimal: Some(examples.minimal.clone()),
        common: examples.common.iter().take(MAX_COMMON_EXAMPLES).cloned().collect(),
        advanced: examples
            .advanced
            .as_ref()
            .map(|a| a.iter().take(MAX_ADVANCED_EXAMPLES).cloned().collect()),
    })
}

/// Choose the import package and render the statement block.
fn import_statement(identity: &ManifestIdentity<'_>, extracted: &ExtractedData) -> ImportStatement {
    let package = extracted
        .npm_dependencies
        .keys()
        .find(|name| is_design_system_package(name))
        .map(String::as_str)
        .unwrap_or(identity.default_package);

    let imports = match &extracted.compound_info {
        Some(compound) if compound.is_compound => {
            let mut names = vec![compound.root_component.clone()];
            names.extend(compound.sub_components.iter().cloned());
            names.join(", ")
        }
        _ => identity.name.to_string(),
    };

    ImportStatement {
        primary: format!("import {{ {imports} }} from '{package}'"),
        type_only: format!("import type {{ {}Props }} from '{package}'", identity.name),
        subpath: None,
    }
}

fn is_design_system_package(name: &str) -> bool {
    if name.contains("design-system") {
        return true;
    }
    // ^@[a-z-]+/(react|components|ui)$
    let Some(rest) = name.strip_prefix('@') else {
        return false;
    };
    let Some((scope, pkg)) = rest.split_once('/') else {
        return false;
    };
    !scope.is_empty()
        && scope.bytes().all(|b| b.is_ascii_lowercase() || b == b'-')
        && matches!(pkg, "react" | "components" | "ui")
}

/// Guidance with related components filtered to the library's inventory
fn build_guidance(
    meta: &ComponentMeta,
    available_components: Option<&[String]>,
) -> Option<Guidance> {
    let ai = &meta.ai;
    if ai.when_to_use.is_empty() && ai.when_not_to_use.is_empty() && ai.patterns.is_empty() {
        return None;
    }
    let related_components = match available_components {
        Some(available) => ai
            .related_components
            .iter()
            .filter(|name| available.contains(name))
            .cloned()
            .collect(),
        None => ai.related_components.clone(),
    };
    Some(Guidance {
        when_to_use: ai.when_to_use.clone(),
        when_not_to_use: ai.when_not_to_use.clone(),
        accessibility: ai.a11y_notes.clone(),
        patterns: ai.patterns.clone(),
        related_components,
    })
}

fn build_dependencies(extracted: &ExtractedData) -> ManifestDependencies {
    ManifestDependencies {
        npm: extracted.npm_dependencies.clone(),
        internal: extracted.internal_dependencies.clone(),
    }
}

/// Sub-components run the same prop pipeline, then pick up their data-slot,
/// composition requirement and Radix primitive.
fn build_sub_components(
    extracted: &ExtractedData,
    meta: &ComponentMeta,
) -> Option<Vec<ManifestSubComponent>> {
    let subs = extracted.sub_components.as_ref()?;
    if subs.is_empty() {
        return None;
    }
    let sub_descriptions = meta.ai.sub_component_variant_descriptions.as_ref();
    let rendered: Vec<ManifestSubComponent> =
        subs.iter().map(|sub| build_sub(sub, sub_descriptions)).collect();
    Some(rendered)
}

fn build_sub(
    sub: &SubComponentInfo,
    sub_descriptions: Option<&BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>>,
) -> ManifestSubComponent {
    let empty_variants = BTreeMap::new();
    let empty_defaults = BTreeMap::new();
    let variants = sub.variants.as_ref().unwrap_or(&empty_variants);
    let defaults = sub.default_variants.as_ref().unwrap_or(&empty_defaults);
    let descriptions = sub_descriptions.and_then(|all| all.get(&sub.name));

    let props = prop_pipeline(&sub.props, variants, defaults, descriptions);

    ManifestSubComponent {
        name: sub.name.clone(),
        description: sub.description.clone(),
        data_slot: kebab_case(&sub.name),
        required_in_composition: sub.required_in_composition,
        props: (!props.is_empty()).then_some(props),
        radix_primitive: sub.radix_primitive.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ce_domain::value_objects::AiMeta;

    fn identity<'a>() -> ManifestIdentity<'a> {
        ManifestIdentity {
            name: "Button",
            slug: "button-react-a1b2c3d4",
            default_package: "@acme/ui",
        }
    }

    fn meta_with(related: Vec<String>) -> ComponentMeta {
        ComponentMeta {
            name: "Button".into(),
            description: "A clickable button".into(),
            ai: AiMeta {
                semantic_description: "Triggers actions".into(),
                when_to_use: "For actions".into(),
                when_not_to_use: "For navigation".into(),
                related_components: related,
                a11y_notes: "Keyboard focusable".into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn categorization_precedence_is_events_slots_variants_behaviors_other() {
        let mut variants = BTreeMap::new();
        variants.insert("variant".to_string(), vec!["default".to_string()]);

        let props = vec![
            PropInfo::new("onClick", "() => void"),
            PropInfo::new("children", "ReactNode"),
            PropInfo::new("icon", "ReactElement"),
            PropInfo::new("variant", "string"),
            PropInfo::new("disabled", "boolean"),
            PropInfo::new("label", "string"),
        ];
        let categorized = categorize_props(&props, &variants);
        assert_eq!(categorized.events.len(), 1);
        assert_eq!(categorized.slots.len(), 2);
        assert_eq!(categorized.variants.len(), 1);
        assert_eq!(categorized.behaviors.len(), 1);
        assert_eq!(categorized.other.len(), 1);
        // Union of groups equals the input set
        assert_eq!(categorized.len(), props.len());
    }

    #[test]
    fn normalization_creates_missing_variant_props() {
        let mut variants = BTreeMap::new();
        variants.insert(
            "size".to_string(),
            vec!["sm".to_string(), "lg".to_string()],
        );
        let mut defaults = BTreeMap::new();
        defaults.insert("size".to_string(), "sm".to_string());

        let categorized = prop_pipeline(&[], &variants, &defaults, None);
        assert_eq!(categorized.variants.len(), 1);
        let size = &categorized.variants[0];
        assert_eq!(size.prop_type, "string");
        assert_eq!(size.values.as_deref(), Some(&["sm".to_string(), "lg".to_string()][..]));
        assert_eq!(size.default_value.as_deref(), Some("sm"));
        assert!(!size.required);
    }

    #[test]
    fn enrichment_attaches_value_descriptions() {
        let mut variants = BTreeMap::new();
        variants.insert("variant".to_string(), vec!["destructive".to_string()]);
        let mut descriptions = BTreeMap::new();
        let mut values = BTreeMap::new();
        values.insert("destructive".to_string(), "For dangerous actions".to_string());
        descriptions.insert("variant".to_string(), values);

        let categorized = prop_pipeline(&[], &variants, &BTreeMap::new(), Some(&descriptions));
        let descriptions = categorized.variants[0].value_descriptions.as_ref().unwrap();
        assert_eq!(descriptions["destructive"], "For dangerous actions");
    }

    #[test]
    fn related_components_filtered_against_available() {
        let extracted = ExtractedData::default();
        let meta = meta_with(vec!["Card".into(), "Tooltip".into(), "NonExistent".into()]);
        let available = vec!["Button".to_string(), "Card".to_string(), "Tooltip".to_string()];

        let manifest = build_manifest(&identity(), &extracted, &meta, Some(&available));
        let guidance = manifest.guidance.unwrap();
        assert_eq!(guidance.related_components, vec!["Card", "Tooltip"]);
    }

    #[test]
    fn stories_win_over_generated_examples() {
        use ce_domain::value_objects::{MetaExamples, StoryExample};

        let mut extracted = ExtractedData::default();
        extracted.stories = vec![
            StoryExample {
                title: "Default".into(),
                code: "<Button />".into(),
                complexity: StoryComplexity::Minimal,
            },
            StoryExample {
                title: "WithIcon".into(),
                code: "<Button icon />".into(),
                complexity: StoryComplexity::Common,
            },
        ];
        let mut meta = meta_with(vec![]);
        meta.ai.examples = Some(MetaExamples {
            minimal: ExampleBlock {
                title: "Generated".into(),
                code: "<Button>generated</Button>".into(),
                description: None,
            },
            common: vec![],
            advanced: None,
        });

        let manifest = build_manifest(&identity(), &extracted, &meta, None);
        let examples = manifest.examples.unwrap();
        assert_eq!(examples.minimal.unwrap().title, "Default");
        assert_eq!(examples.common.len(), 1);
    }

    #[test]
    fn compound_import_lists_root_and_subs() {
        use ce_domain::value_objects::CompoundInfo;

        let mut extracted = ExtractedData::default();
        extracted.compound_info = Some(CompoundInfo {
            is_compound: true,
            root_component: "Dialog".into(),
            sub_components: vec!["DialogTrigger".into(), "DialogContent".into()],
        });
        extracted
            .npm_dependencies
            .insert("@acme/react".to_string(), "^1.0.0".to_string());

        let id = ManifestIdentity {
            name: "Dialog",
            slug: "dialog-react-a1b2c3d4",
            default_package: "@acme/ui",
        };
        let manifest = build_manifest(&id, &extracted, &meta_with(vec![]), None);
        assert_eq!(
            manifest.import_statement.primary,
            "import { Dialog, DialogTrigger, DialogContent } from '@acme/react'"
        );
    }

    #[test]
    fn design_system_package_pattern() {
        assert!(is_design_system_package("@acme/ui"));
        assert!(is_design_system_package("@my-org/react"));
        assert!(is_design_system_package("acme-design-system"));
        assert!(!is_design_system_package("@radix-ui/react-dialog"));
        assert!(!is_design_system_package("clsx"));
    }
}
