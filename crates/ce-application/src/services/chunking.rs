//! Manifest chunking for embedding
//!
//! Splits a manifest into semantic chunks, one text per section the retrieval
//! engine should match on. Pure function; the reconciler owns persistence.

use std::fmt::Write as _;

use ce_domain::constants::{
    CHUNK_MAX_CHARS, CHUNK_TRUNCATION_SUFFIX, MAX_ADVANCED_EXAMPLES, MAX_COMMON_EXAMPLES,
};
use ce_domain::entities::ChunkType;
use ce_domain::value_objects::{AiManifest, ManifestProp};

/// One chunk of manifest text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestChunk {
    /// Manifest section this text came from
    pub chunk_type: ChunkType,
    /// Chunk text, truncated to the chunk budget
    pub content: String,
    /// Sequence within the chunk type
    pub index: u32,
}

/// Split a manifest into embedding chunks.
///
/// Sections that are empty in the manifest produce no chunk. Every chunk is
/// truncated to 4000 characters with a `"..."` suffix when cut.
pub fn chunk_manifest(manifest: &AiManifest) -> Vec<ManifestChunk> {
    let mut chunks = Vec::new();

    push_chunk(&mut chunks, ChunkType::Description, description_text(manifest));
    push_chunk(&mut chunks, ChunkType::Import, import_text(manifest));
    push_chunk(&mut chunks, ChunkType::Props, props_text(manifest));
    push_chunk(&mut chunks, ChunkType::Composition, composition_text(manifest));
    push_chunk(&mut chunks, ChunkType::Examples, examples_text(manifest));
    push_chunk(&mut chunks, ChunkType::Patterns, patterns_text(manifest));
    push_chunk(&mut chunks, ChunkType::Guidance, guidance_text(manifest));

    chunks
}

fn push_chunk(chunks: &mut Vec<ManifestChunk>, chunk_type: ChunkType, text: Option<String>) {
    if let Some(text) = text {
        let text = text.trim().to_string();
        if !text.is_empty() {
            chunks.push(ManifestChunk {
                chunk_type,
                content: truncate(text),
                index: 0,
            });
        }
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= CHUNK_MAX_CHARS {
        return text;
    }
    let keep = CHUNK_MAX_CHARS - CHUNK_TRUNCATION_SUFFIX.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(CHUNK_TRUNCATION_SUFFIX);
    out
}

fn description_text(manifest: &AiManifest) -> Option<String> {
    let mut text = format!("{}: {}", manifest.name, manifest.description);
    if let Some(base) = &manifest.base_library {
        let _ = write!(text, "\nBuilt on {}", base.name);
        if let Some(component) = &base.component {
            let _ = write!(text, " ({component})");
        }
    }
    if let Some(radix) = &manifest.radix_primitive {
        let _ = write!(text, "\nRadix primitive: {}", radix.docs_url);
    }
    Some(text)
}

fn import_text(manifest: &AiManifest) -> Option<String> {
    let stmt = &manifest.import_statement;
    if stmt.primary.is_empty() {
        return None;
    }
    let mut text = stmt.primary.clone();
    if !stmt.type_only.is_empty() {
        let _ = write!(text, "\n{}", stmt.type_only);
    }
    if let Some(subpath) = &stmt.subpath {
        let _ = write!(text, "\n{subpath}");
    }
    Some(text)
}

fn props_text(manifest: &AiManifest) -> Option<String> {
    let props = manifest.props.as_ref()?;
    if props.is_empty() {
        return None;
    }
    let mut text = format!("{} props:\n", manifest.name);
    append_prop_group(&mut text, "Variants", &props.variants);
    append_prop_group(&mut text, "Behaviors", &props.behaviors);
    append_prop_group(&mut text, "Events", &props.events);
    append_prop_group(&mut text, "Slots", &props.slots);
    append_prop_group(&mut text, "Other", &props.other);
    Some(text)
}

fn append_prop_group(text: &mut String, label: &str, props: &[ManifestProp]) {
    if props.is_empty() {
        return;
    }
    let _ = writeln!(text, "{label}:");
    for prop in props {
        let _ = write!(text, "- {} ({})", prop.name, prop.prop_type);
        if let Some(default) = &prop.default_value {
            let _ = write!(text, " default={default}");
        }
        if let Some(description) = &prop.description {
            let _ = write!(text, ": {description}");
        }
        text.push('\n');
        if let Some(value_descriptions) = &prop.value_descriptions {
            for (value, description) in value_descriptions {
                let _ = writeln!(text, "  - {value}: {description}");
            }
        }
    }
}

fn composition_text(manifest: &AiManifest) -> Option<String> {
    let subs = manifest.sub_components.as_ref()?;
    if subs.is_empty() {
        return None;
    }
    let mut text = format!("{} composition:\n", manifest.name);
    for sub in subs {
        let _ = write!(text, "- {}", sub.name);
        if sub.required_in_composition {
            text.push_str(" [REQUIRED]");
        }
        let _ = write!(text, " data-slot={}", sub.data_slot);
        if let Some(description) = &sub.description {
            let _ = write!(text, ": {description}");
        }
        if let Some(props) = &sub.props {
            let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
            if !names.is_empty() {
                let _ = write!(text, " props: {}", names.join(", "));
            }
        }
        if let Some(radix) = &sub.radix_primitive {
            let _ = write!(text, " (Radix {})", radix.primitive);
        }
        text.push('\n');
    }
    Some(text)
}

fn examples_text(manifest: &AiManifest) -> Option<String> {
    let examples = manifest.examples.as_ref()?;
    if examples.is_empty() {
        return None;
    }
    let mut text = format!("{} examples:\n", manifest.name);
    if let Some(minimal) = &examples.minimal {
        let _ = writeln!(text, "## {}\n{}", minimal.title, minimal.code);
    }
    for example in examples.common.iter().take(MAX_COMMON_EXAMPLES) {
        let _ = writeln!(text, "## {}\n{}", example.title, example.code);
    }
    if let Some(advanced) = &examples.advanced {
        for example in advanced.iter().take(MAX_ADVANCED_EXAMPLES) {
            let _ = writeln!(text, "## {}\n{}", example.title, example.code);
        }
    }
    Some(text)
}

fn patterns_text(manifest: &AiManifest) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(base) = &manifest.base_library {
        lines.push(format!("Base library: {}", base.name));
    }
    if let Some(subs) = &manifest.sub_components {
        if !subs.is_empty() {
            let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
            lines.push(format!("Sub-components: {}", names.join(", ")));
        }
    }
    if let Some(deps) = &manifest.dependencies {
        if !deps.internal.is_empty() {
            lines.push(format!("Uses: {}", deps.internal.join(", ")));
        }
    }
    if let Some(guidance) = &manifest.guidance {
        if !guidance.patterns.is_empty() {
            let names: Vec<&str> = guidance.patterns.iter().map(|p| p.as_str()).collect();
            lines.push(format!("Patterns: {}", names.join(", ")));
        }
        if !guidance.related_components.is_empty() {
            lines.push(format!("Related: {}", guidance.related_components.join(", ")));
        }
    }
    if lines.is_empty() {
        return None;
    }
    Some(format!("{}:\n{}", manifest.name, lines.join("\n")))
}

fn guidance_text(manifest: &AiManifest) -> Option<String> {
    let guidance = manifest.guidance.as_ref()?;
    let mut text = String::new();
    if !guidance.when_to_use.is_empty() {
        let _ = writeln!(text, "When to use {}: {}", manifest.name, guidance.when_to_use);
    }
    if !guidance.when_not_to_use.is_empty() {
        let _ = writeln!(text, "When not to use: {}", guidance.when_not_to_use);
    }
    if !guidance.accessibility.is_empty() {
        let _ = writeln!(text, "Accessibility: {}", guidance.accessibility);
    }
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ce_domain::value_objects::{
        ExampleBlock, Guidance, ImportStatement, ManifestExamples, ManifestSubComponent, Pattern,
    };

    fn manifest() -> AiManifest {
        AiManifest {
            name: "Dialog".into(),
            slug: "dialog-react-a1b2c3d4".into(),
            description: "A modal dialog".into(),
            import_statement: ImportStatement {
                primary: "import { Dialog } from '@acme/ui'".into(),
                type_only: "import type { DialogProps } from '@acme/ui'".into(),
                subpath: None,
            },
            guidance: Some(Guidance {
                when_to_use: "Interrupting flows".into(),
                when_not_to_use: "Inline content".into(),
                accessibility: "Focus is trapped".into(),
                patterns: vec![Pattern::Overlay],
                related_components: vec!["Sheet".into()],
            }),
            examples: Some(ManifestExamples {
                minimal: Some(ExampleBlock {
                    title: "Default".into(),
                    code: "<Dialog />".into(),
                    description: None,
                }),
                common: vec![],
                advanced: None,
            }),
            sub_components: Some(vec![ManifestSubComponent {
                name: "DialogTrigger".into(),
                data_slot: "dialog-trigger".into(),
                required_in_composition: true,
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn empty_sections_produce_no_chunks() {
        let manifest = AiManifest {
            name: "Box".into(),
            slug: "box-react-00000000".into(),
            description: "A box".into(),
            import_statement: ImportStatement {
                primary: "import { Box } from '@acme/ui'".into(),
                type_only: String::new(),
                subpath: None,
            },
            ..Default::default()
        };
        let chunks = chunk_manifest(&manifest);
        let types: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(types, vec![ChunkType::Description, ChunkType::Import]);
    }

    #[test]
    fn full_manifest_covers_expected_sections() {
        let chunks = chunk_manifest(&manifest());
        let types: Vec<ChunkType> = chunks.iter().map(|c| c.chunk_type).collect();
        assert!(types.contains(&ChunkType::Description));
        assert!(types.contains(&ChunkType::Composition));
        assert!(types.contains(&ChunkType::Examples));
        assert!(types.contains(&ChunkType::Guidance));

        let composition = chunks
            .iter()
            .find(|c| c.chunk_type == ChunkType::Composition)
            .unwrap();
        assert!(composition.content.contains("[REQUIRED]"));
        assert!(composition.content.contains("data-slot=dialog-trigger"));
    }

    #[test]
    fn long_content_is_truncated_with_suffix() {
        let mut m = manifest();
        m.description = "x".repeat(5000);
        let chunks = chunk_manifest(&m);
        let description = &chunks[0];
        assert_eq!(description.content.chars().count(), CHUNK_MAX_CHARS);
        assert!(description.content.ends_with("..."));
    }
}
