//! Storybook story extraction
//!
//! Parses a stories file alongside the component source: finds the meta
//! object, walks the exported stories, filters showcase and snapshot-disabled
//! entries, classifies the rest, and synthesizes JSX from args when a story
//! has no render function.

use std::fmt::Write as _;

use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

use ce_domain::value_objects::{StoryComplexity, StoryExample};

use super::ast::{SourceTree, descendants, string_content, unwrap_expression};
use super::variants::object_pairs;

/// Story export names that showcase every state at once; not usage examples
static SHOWCASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(All(Variants|Sizes|States|Modes)|Showcase|Overview|Kitchen ?Sink)$")
        .expect("showcase name pattern is valid")
});

/// Story names that mark the smallest working usage
static MINIMAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Default|Basic|Simple)$").expect("minimal name pattern is valid"));

/// Render-body markers of stateful or async stories
const ADVANCED_MARKERS: &[&str] = &[
    "useState", "useReducer", "useRef", "useEffect", "useCallback", "useMemo", "setTimeout",
    "setInterval", "Promise", "await",
];

/// Extract usage examples from a stories source
pub fn extract_stories(stories_source: &str, component_name: &str) -> Vec<StoryExample> {
    let Some(tree) = SourceTree::parse(stories_source) else {
        return Vec::new();
    };

    let meta = find_meta(&tree);
    let subject = meta
        .as_ref()
        .and_then(|m| m.component.clone())
        .unwrap_or_else(|| component_name.to_string());

    let mut examples = Vec::new();
    for story in find_story_exports(&tree) {
        if SHOWCASE_NAME.is_match(&story.name) {
            continue;
        }
        if story.snapshot_disabled {
            continue;
        }

        let code = match &story.render_body {
            Some(body) => body.trim().to_string(),
            None => synthesize_jsx(&subject, &story.args),
        };
        if code.is_empty() {
            continue;
        }

        let complexity = classify(&story);
        examples.push(StoryExample {
            title: story.name.clone(),
            code,
            complexity,
        });
    }
    examples
}

/// Parsed meta object of a stories file
struct StoriesMeta {
    component: Option<String>,
}

/// One exported story before classification
struct StoryExport {
    name: String,
    args: Vec<(String, ArgValue)>,
    render_body: Option<String>,
    snapshot_disabled: bool,
}

/// An argument value as far as synthesis cares
enum ArgValue {
    Text(String),
    Bool(bool),
    Number(String),
    Jsx(String),
    Dropped,
}

fn classify(story: &StoryExport) -> StoryComplexity {
    if MINIMAL_NAME.is_match(&story.name) {
        return StoryComplexity::Minimal;
    }
    if let Some(body) = &story.render_body {
        if ADVANCED_MARKERS.iter().any(|marker| body.contains(marker)) {
            return StoryComplexity::Advanced;
        }
    }
    StoryComplexity::Common
}

/// Locate the meta object: a variable named `meta` or the default export,
/// either possibly wrapped in `satisfies` / `as`.
fn find_meta(tree: &SourceTree) -> Option<StoriesMeta> {
    let object = tree
        .nodes_of_kind("variable_declarator")
        .into_iter()
        .find(|d| {
            d.child_by_field_name("name")
                .is_some_and(|n| tree.text(n) == "meta")
        })
        .and_then(|d| d.child_by_field_name("value"))
        .map(unwrap_expression)
        .filter(|v| v.kind() == "object")
        .or_else(|| default_export_object(tree))?;

    let mut component = None;
    for (key, value) in object_pairs(tree, object) {
        if key == "component" {
            component = Some(tree.text(value).to_string());
        }
    }
    Some(StoriesMeta { component })
}

fn default_export_object<'t>(tree: &'t SourceTree) -> Option<Node<'t>> {
    for export in tree.nodes_of_kind("export_statement") {
        let text = tree.text(export);
        if !text.starts_with("export default") {
            continue;
        }
        let mut cursor = export.walk();
        for child in export.named_children(&mut cursor) {
            let child = unwrap_expression(child);
            if child.kind() == "object" {
                return Some(child);
            }
        }
    }
    None
}

/// Every `export const StoryName = { ... }` in the file
fn find_story_exports(tree: &SourceTree) -> Vec<StoryExport> {
    let mut stories = Vec::new();
    for export in tree.nodes_of_kind("export_statement") {
        for node in descendants(export) {
            if node.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = node.child_by_field_name("name") else {
                continue;
            };
            let name = tree.text(name_node).to_string();
            if name == "meta" || name == "default" {
                continue;
            }
            let Some(value) = node.child_by_field_name("value").map(unwrap_expression) else {
                continue;
            };
            if value.kind() != "object" {
                continue;
            }
            stories.push(parse_story(tree, name, value));
        }
    }
    stories
}

fn parse_story<'t>(tree: &'t SourceTree, name: String, object: Node<'t>) -> StoryExport {
    let mut story = StoryExport {
        name,
        args: Vec::new(),
        render_body: None,
        snapshot_disabled: false,
    };

    for (key, value) in object_pairs(tree, object) {
        match key.as_str() {
            "args" if value.kind() == "object" => {
                story.args = parse_args(tree, value);
            }
            "render" => {
                story.render_body = Some(render_body_text(tree, value));
            }
            "parameters" if value.kind() == "object" => {
                story.snapshot_disabled = chromatic_snapshot_disabled(tree, value);
            }
            _ => {}
        }
    }
    story
}

/// `parameters.chromatic.disableSnapshot === true` marks interaction-only
/// stories; nothing else does.
fn chromatic_snapshot_disabled(tree: &SourceTree, parameters: Node<'_>) -> bool {
    for (key, value) in object_pairs(tree, parameters) {
        if key == "chromatic" && value.kind() == "object" {
            for (inner_key, inner_value) in object_pairs(tree, value) {
                if inner_key == "disableSnapshot" && tree.text(inner_value) == "true" {
                    return true;
                }
            }
        }
    }
    false
}

fn parse_args(tree: &SourceTree, object: Node<'_>) -> Vec<(String, ArgValue)> {
    let mut args = Vec::new();
    for (key, value) in object_pairs(tree, object) {
        let text = tree.text(value);
        let parsed = match value.kind() {
            "string" => ArgValue::Text(string_content(text).to_string()),
            "true" => ArgValue::Bool(true),
            "false" => ArgValue::Bool(false),
            "number" => ArgValue::Number(text.to_string()),
            "arrow_function" | "function_expression" | "function" => ArgValue::Dropped,
            "jsx_element" | "jsx_self_closing_element" | "jsx_fragment" => {
                ArgValue::Jsx(text.to_string())
            }
            _ => ArgValue::Jsx(text.to_string()),
        };
        args.push((key, parsed));
    }
    args
}

/// The render function's body text (the expression or block after `=>`)
fn render_body_text(tree: &SourceTree, render: Node<'_>) -> String {
    let render = unwrap_expression(render);
    if let Some(body) = render.child_by_field_name("body") {
        return tree.text(body).to_string();
    }
    tree.text(render).to_string()
}

/// Synthesize JSX from story args: strings render as `prop="v"`, `true` as a
/// bare flag, `false`/numbers in braces, JSX markers in braces, `children`
/// inline; function args are dropped.
fn synthesize_jsx(component: &str, args: &[(String, ArgValue)]) -> String {
    let mut attributes = String::new();
    let mut children: Option<String> = None;

    for (name, value) in args {
        match value {
            ArgValue::Dropped => {}
            _ if name == "children" => {
                children = Some(match value {
                    ArgValue::Text(text) => text.clone(),
                    ArgValue::Jsx(code) => code.clone(),
                    ArgValue::Bool(flag) => flag.to_string(),
                    ArgValue::Number(number) => number.clone(),
                    ArgValue::Dropped => String::new(),
                });
            }
            ArgValue::Text(text) => {
                let _ = write!(attributes, " {name}=\"{text}\"");
            }
            ArgValue::Bool(true) => {
                let _ = write!(attributes, " {name}");
            }
            ArgValue::Bool(false) => {
                let _ = write!(attributes, " {name}={{false}}");
            }
            ArgValue::Number(number) => {
                let _ = write!(attributes, " {name}={{{number}}}");
            }
            ArgValue::Jsx(code) => {
                let _ = write!(attributes, " {name}={{{code}}}");
            }
        }
    }

    match children {
        Some(inner) => format!("<{component}{attributes}>{inner}</{component}>"),
        None => format!("<{component}{attributes} />"),
    }
}
