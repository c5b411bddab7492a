//! TSX component extraction
//!
//! Implements the `ComponentExtractor` port with a tree-sitter TSX syntax
//! walker. The primary strongly-typed analysis runs first; an explicit rule
//! set (not a quality heuristic) decides whether the syntactic fallback
//! walker also runs, and the diagnostics report which path produced the
//! result. The extractor never fails on malformed source.

mod ast;
mod compound;
mod dependencies;
mod filters;
mod props;
mod radix;
mod stories;
mod variants;

pub use ast::SourceTree;
pub use filters::{DOM_EVENT_PROPS, PASSTHROUGH_PROPS};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use ce_domain::value_objects::{
    ExtractedData, ExtractionDiagnostics, ExtractionMethod, FallbackReason, PropInfo,
    SubComponentInfo,
};
use ce_domain::{Error, Result};

use ce_application::ports::{
    AnalyzedProp, ComponentExtractor, ExtractionOutcome, ExtractionRequest, PropsAnalyzer,
};

/// Source patterns of higher-order-component wrappers
const HOC_PATTERNS: &[&str] = &[
    "withRouter(", "connect(", "withStyles(", "withTheme(", "memo(forwardRef", "forwardRef(memo",
];

/// styled-components usage: `styled.x`, `styled(`, `` css` ``
static STYLED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"styled\.[A-Za-z]|styled\(|css`").expect("styled pattern is valid")
});

/// Primary analyzer backed by the typed declarations in the source itself.
///
/// Stands in for the TypeScript-aware analyzer capability: it reads interface
/// and type-alias declarations (and `forwardRef` type arguments) and reports
/// `None` when the source declares no props type at all.
#[derive(Debug, Default)]
pub struct SyntacticPropsAnalyzer;

impl PropsAnalyzer for SyntacticPropsAnalyzer {
    fn analyze_props(
        &self,
        component_name: &str,
        source: &str,
        file_path: Option<&str>,
    ) -> Option<Vec<AnalyzedProp>> {
        let tree = SourceTree::parse(source)?;
        let typed = props::typed_props(&tree, component_name)?;
        Some(
            typed
                .into_iter()
                .map(|prop| AnalyzedProp {
                    name: prop.name,
                    prop_type: prop.prop_type,
                    required: prop.required,
                    description: prop.description,
                    default_value: prop.default_value,
                    values: prop.values,
                    declared_in: file_path.map(str::to_string),
                })
                .collect(),
        )
    }
}

/// Tree-sitter based component extractor
pub struct TsxExtractor {
    analyzer: Arc<dyn PropsAnalyzer>,
}

impl TsxExtractor {
    /// Create an extractor with the default syntactic analyzer
    pub fn new() -> Self {
        Self {
            analyzer: Arc::new(SyntacticPropsAnalyzer),
        }
    }

    /// Create an extractor around a custom primary analyzer
    pub fn with_analyzer(analyzer: Arc<dyn PropsAnalyzer>) -> Self {
        Self { analyzer }
    }
}

impl Default for TsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentExtractor for TsxExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionOutcome> {
        let analyzer = Arc::clone(&self.analyzer);
        // Parsing is CPU-bound; keep it off the async workers
        tokio::task::spawn_blocking(move || extract_sync(analyzer.as_ref(), &request))
            .await
            .map_err(|e| Error::internal(format!("extraction worker failed: {e}")))
    }
}

fn extract_sync(analyzer: &dyn PropsAnalyzer, request: &ExtractionRequest) -> ExtractionOutcome {
    let Some(tree) = SourceTree::parse(&request.source_code) else {
        return ExtractionOutcome {
            data: ExtractedData::default(),
            diagnostics: ExtractionDiagnostics {
                method: ExtractionMethod::Fallback,
                fallback_triggered: true,
                fallback_reason: Some(FallbackReason::PrimaryUnavailable),
            },
        };
    };

    // Primary props, filtered to component-specific names
    let analyzed = analyzer.analyze_props(
        &request.name,
        &request.source_code,
        request.file_path.as_deref(),
    );
    let raw_names: Vec<String> = analyzed
        .as_ref()
        .map(|props| props.iter().map(|p| p.name.clone()).collect())
        .unwrap_or_default();
    let primary: Option<Vec<PropInfo>> = analyzed.map(|props| {
        filters::filter_props(
            props
                .into_iter()
                .filter(|p| !filters::is_third_party_declaration(p.declared_in.as_deref()))
                .map(|p| {
                    let mut prop = PropInfo::new(p.name, p.prop_type);
                    prop.required = p.required;
                    prop.description = p.description;
                    prop.default_value = p.default_value;
                    prop.values = p.values;
                    prop
                })
                .collect(),
        )
    });

    let primary_count = primary.as_ref().map_or(0, Vec::len);
    let fallback_reason = decide_fallback(
        &request.source_code,
        primary.is_some(),
        primary_count,
        &raw_names,
    );

    let (mut props, method) = match fallback_reason {
        Some(_) => {
            let walked = filters::filter_props(props::fallback_props(&tree, &request.name));
            let mut merged = primary.clone().unwrap_or_default();
            for prop in walked {
                if !merged.iter().any(|existing| existing.name == prop.name) {
                    merged.push(prop);
                }
            }
            let method = if primary_count > 0 {
                ExtractionMethod::Hybrid
            } else {
                ExtractionMethod::Fallback
            };
            (merged, method)
        }
        None => (primary.unwrap_or_default(), ExtractionMethod::Primary),
    };

    // Destructuring defaults apply to whichever path produced the props
    let defaults = props::parameter_defaults(&tree, &request.name);
    for prop in &mut props {
        if prop.default_value.is_none() {
            if let Some(default) = defaults.get(&prop.name) {
                prop.default_value = Some(default.clone());
            }
        }
    }

    let builders = variants::find_variant_builders(&tree);
    let (variant_map, default_variants) =
        variants::variants_for_component(&tree, &request.name, &builders);

    let deps = dependencies::extract_dependencies(&tree, &request.path_aliases);
    let radix_namespace = radix::find_radix_namespace(&tree);
    let radix_primitive = radix_namespace
        .as_ref()
        .and_then(|ns| radix::resolve_primitive(&tree, ns, &request.name));

    let compound_info = compound::detect_compound(&tree);
    let sub_components = compound_info.as_ref().map(|compound| {
        compound
            .sub_components
            .iter()
            .map(|sub_name| {
                extract_sub_component(
                    &tree,
                    &compound.root_component,
                    sub_name,
                    &builders,
                    radix_namespace.as_ref(),
                )
            })
            .collect::<Vec<SubComponentInfo>>()
    });

    let story_examples = request
        .stories_code
        .as_deref()
        .map(|code| stories::extract_stories(code, &request.name))
        .unwrap_or_default();

    let accepts_children = props.iter().any(|p| p.is_children)
        || request.source_code.contains("children");

    let mut files = Vec::new();
    if let Some(path) = &request.file_path {
        files.push(path.clone());
    }
    if let Some(path) = &request.stories_file_path {
        files.push(path.clone());
    }

    let data = ExtractedData {
        props,
        variants: variant_map,
        default_variants,
        npm_dependencies: deps.npm,
        internal_dependencies: deps.internal,
        accepts_children,
        base_library: deps.base_library,
        source_description: leading_description(&tree),
        files,
        stories: story_examples,
        compound_info,
        sub_components,
        radix_primitive,
    };

    ExtractionOutcome {
        data,
        diagnostics: ExtractionDiagnostics {
            method,
            fallback_triggered: fallback_reason.is_some(),
            fallback_reason,
        },
    }
}

/// The explicit fallback rule set. Pattern-specific reasons outrank the
/// generic no-result reasons so a forwardRef-only source reports
/// `forward_ref_no_props` rather than the analyzer miss that accompanies it.
fn decide_fallback(
    source: &str,
    primary_available: bool,
    primary_count: usize,
    raw_names: &[String],
) -> Option<FallbackReason> {
    let has_ref_prop = raw_names.iter().any(|name| name == "ref");

    if source.contains("forwardRef") && !has_ref_prop && primary_count < 2 {
        return Some(FallbackReason::ForwardRefNoProps);
    }
    if HOC_PATTERNS.iter().any(|p| source.contains(p)) && primary_count < 3 {
        return Some(FallbackReason::HocWrapper);
    }
    if STYLED_PATTERN.is_match(source) && primary_count < 2 {
        return Some(FallbackReason::StyledComponents);
    }
    if !primary_available {
        return Some(FallbackReason::PrimaryUnavailable);
    }
    if primary_count == 0 {
        return Some(FallbackReason::NoPropsExtracted);
    }
    None
}

fn extract_sub_component(
    tree: &SourceTree,
    root: &str,
    sub_name: &str,
    builders: &BTreeMap<String, variants::VariantBuilder>,
    radix_namespace: Option<&radix::RadixNamespace>,
) -> SubComponentInfo {
    let props = filters::filter_props(props::fallback_props(tree, sub_name));
    let (variant_map, default_variants) = variants::variants_for_component(tree, sub_name, builders);
    let radix_primitive =
        radix_namespace.and_then(|ns| radix::resolve_primitive(tree, ns, sub_name));

    SubComponentInfo {
        name: sub_name.to_string(),
        props,
        description: None,
        required_in_composition: compound::required_in_composition(tree, root, sub_name),
        radix_primitive,
        variants: (!variant_map.is_empty()).then_some(variant_map),
        default_variants: (!default_variants.is_empty()).then_some(default_variants),
    }
}

/// A `/** ... */` block at the very top of the file describes the component
fn leading_description(tree: &SourceTree) -> Option<String> {
    let root = tree.root();
    let first = root.child(0)?;
    if first.kind() == "comment" {
        let text = tree.text(first);
        if text.starts_with("/**") {
            let cleaned: String = text
                .trim_start_matches("/**")
                .trim_end_matches("*/")
                .lines()
                .map(|line| line.trim().trim_start_matches('*').trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<&str>>()
                .join(" ");
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ce_domain::entities::Framework;

    fn request(name: &str, source: &str) -> ExtractionRequest {
        ExtractionRequest {
            name: name.to_string(),
            source_code: source.to_string(),
            stories_code: None,
            framework: Framework::React,
            file_path: Some(format!("src/components/{}.tsx", name.to_lowercase())),
            stories_file_path: None,
            path_aliases: vec!["@/".to_string()],
            known_packages: Vec::new(),
        }
    }

    const BUTTON: &str = r#"
import * as React from "react"
import { cva, type VariantProps } from "class-variance-authority"
import { cn } from "@/lib/utils"

const buttonVariants = cva(
  "inline-flex items-center justify-center",
  {
    variants: {
      variant: {
        default: "bg-primary text-primary-foreground",
        destructive: "bg-destructive text-destructive-foreground",
      },
      size: {
        sm: "h-8 px-3",
        lg: "h-10 px-8",
      },
    },
    defaultVariants: {
      variant: "default",
      size: "sm",
    },
  }
)

export interface ButtonProps {
  variant?: "default" | "destructive"
  size?: "sm" | "lg"
  disabled?: boolean
  children?: React.ReactNode
}

const Button = React.forwardRef<HTMLButtonElement, ButtonProps>(
  ({ variant, size, disabled = false, children }, ref) => {
    return (
      <button className={cn(buttonVariants({ variant, size }))} ref={ref} disabled={disabled}>
        {children}
      </button>
    )
  }
)
Button.displayName = "Button"

export { Button, buttonVariants }
"#;

    #[tokio::test]
    async fn button_extracts_on_the_primary_path() {
        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(request("Button", BUTTON)).await.unwrap();

        assert!(!outcome.diagnostics.fallback_triggered);
        assert_eq!(outcome.diagnostics.method, ExtractionMethod::Primary);
        assert_eq!(outcome.diagnostics.fallback_reason, None);

        let data = outcome.data;
        assert_eq!(
            data.variants["variant"],
            vec!["default".to_string(), "destructive".to_string()]
        );
        assert_eq!(data.variants["size"], vec!["sm".to_string(), "lg".to_string()]);
        assert_eq!(data.default_variants["variant"], "default");
        assert_eq!(data.default_variants["size"], "sm");
        assert!(data.accepts_children);

        let disabled = data.props.iter().find(|p| p.name == "disabled").unwrap();
        assert_eq!(disabled.default_value.as_deref(), Some("false"));
    }

    const DIALOG: &str = r#"
import * as React from "react"
import * as DialogPrimitive from "@radix-ui/react-dialog"

const Dialog = DialogPrimitive.Root
const DialogTrigger = DialogPrimitive.Trigger

const DialogContent = React.forwardRef(({ children, ...props }, ref) => (
  <DialogPrimitive.Content ref={ref} {...props}>{children}</DialogPrimitive.Content>
))

const DialogTitle = (props) => <DialogPrimitive.Title {...props} />
const DialogDescription = (props) => <DialogPrimitive.Description {...props} />

export { Dialog, DialogTrigger, DialogContent, DialogTitle, DialogDescription }
"#;

    #[tokio::test]
    async fn dialog_compound_shape_is_detected() {
        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(request("Dialog", DIALOG)).await.unwrap();
        let data = outcome.data;

        let compound = data.compound_info.unwrap();
        assert!(compound.is_compound);
        assert_eq!(compound.root_component, "Dialog");
        assert_eq!(
            compound.sub_components,
            vec!["DialogTrigger", "DialogContent", "DialogTitle", "DialogDescription"]
        );

        let subs = data.sub_components.unwrap();
        for sub in &subs {
            let primitive = sub.radix_primitive.as_ref().unwrap();
            assert!(
                primitive
                    .docs_url
                    .contains("/primitives/docs/components/dialog#"),
                "unexpected docs url: {}",
                primitive.docs_url
            );
        }

        let base = data.base_library.unwrap();
        assert_eq!(base.component.as_deref(), Some("Dialog"));
    }

    #[tokio::test]
    async fn forward_ref_without_props_reports_the_specific_reason() {
        let source = r#"
import * as React from "react"
const Spacer = React.forwardRef((props, ref) => <div ref={ref} {...props} />)
export { Spacer }
"#;
        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(request("Spacer", source)).await.unwrap();
        assert!(outcome.diagnostics.fallback_triggered);
        assert_eq!(
            outcome.diagnostics.fallback_reason,
            Some(FallbackReason::ForwardRefNoProps)
        );
        assert_eq!(outcome.diagnostics.method, ExtractionMethod::Fallback);
    }

    #[tokio::test]
    async fn empty_source_extracts_empty_data_without_error() {
        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(request("Ghost", "")).await.unwrap();
        assert!(outcome.data.props.is_empty());
        assert!(outcome.data.variants.is_empty());
        assert!(outcome.data.stories.is_empty());
        assert!(outcome.data.compound_info.is_none());
    }

    #[tokio::test]
    async fn styled_components_pattern_triggers_fallback() {
        let source = r#"
import styled from "styled-components"
export const Box = styled.div`
  padding: 8px;
`
"#;
        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(request("Box", source)).await.unwrap();
        assert!(outcome.diagnostics.fallback_triggered);
        assert_eq!(
            outcome.diagnostics.fallback_reason,
            Some(FallbackReason::StyledComponents)
        );
    }

    #[tokio::test]
    async fn stories_flow_into_extraction() {
        let stories = r#"
import { Button } from "./button"
const meta = { component: Button }
export default meta
export const Default = { args: { children: "Hi" } }
"#;
        let mut req = request("Button", BUTTON);
        req.stories_code = Some(stories.to_string());
        req.stories_file_path = Some("src/components/button.stories.tsx".to_string());

        let extractor = TsxExtractor::new();
        let outcome = extractor.extract(req).await.unwrap();
        assert_eq!(outcome.data.stories.len(), 1);
        assert_eq!(outcome.data.stories[0].code, "<Button>Hi</Button>");
        assert_eq!(outcome.data.files.len(), 2);
    }
}
