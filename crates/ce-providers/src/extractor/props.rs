//! Prop extraction passes
//!
//! Two layers share this module: the typed-declaration reader (backing the
//! primary analyzer) and the syntactic fallback walker that also reads
//! component parameters and destructuring defaults.

use std::collections::BTreeMap;

use tree_sitter::Node;

use ce_domain::value_objects::PropInfo;

use super::ast::{SourceTree, descendants, string_content, unwrap_expression};

/// Props read from a typed declaration: interface `{Name}Props`, a type alias
/// of the same name (intersections adopt only their literal members), or the
/// props type argument of a `forwardRef` call. `None` when no declaration
/// exists.
pub fn typed_props(tree: &SourceTree, component_name: &str) -> Option<Vec<PropInfo>> {
    let props_name = format!("{component_name}Props");

    if let Some(node) = find_interface(tree, &props_name) {
        return Some(members_of_interface(tree, node));
    }
    if let Some(value) = find_type_alias_value(tree, &props_name) {
        return Some(members_of_type(tree, value));
    }
    if let Some(type_node) = forward_ref_props_type(tree, component_name) {
        if type_node.kind() == "object_type" {
            return Some(members_of_object_type(tree, type_node));
        }
        let referenced = tree.text(type_node).to_string();
        if let Some(node) = find_interface(tree, &referenced) {
            return Some(members_of_interface(tree, node));
        }
        if let Some(value) = find_type_alias_value(tree, &referenced) {
            return Some(members_of_type(tree, value));
        }
    }
    None
}

/// The full fallback pass: typed declaration first, then the component's
/// first parameter; destructuring defaults merged in either way.
pub fn fallback_props(tree: &SourceTree, component_name: &str) -> Vec<PropInfo> {
    let mut props = typed_props(tree, component_name)
        .unwrap_or_else(|| parameter_props(tree, component_name));

    let defaults = parameter_defaults(tree, component_name);
    for prop in &mut props {
        if prop.default_value.is_none() {
            prop.default_value = defaults.get(&prop.name).cloned();
        }
    }

    // Destructured names missing from the typed declaration still count
    for (name, default) in &defaults {
        if !props.iter().any(|p| &p.name == name) {
            let mut prop = PropInfo::new(name.clone(), "unknown".to_string());
            prop.default_value = Some(default.clone());
            props.push(prop);
        }
    }

    props
}

fn find_interface<'t>(tree: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    tree.nodes_of_kind("interface_declaration")
        .into_iter()
        .find(|node| {
            node.child_by_field_name("name")
                .is_some_and(|n| tree.text(n) == name)
        })
}

fn find_type_alias_value<'t>(tree: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    tree.nodes_of_kind("type_alias_declaration")
        .into_iter()
        .find(|node| {
            node.child_by_field_name("name")
                .is_some_and(|n| tree.text(n) == name)
        })
        .and_then(|node| node.child_by_field_name("value"))
}

/// The second type argument of `forwardRef<Element, Props>(...)`
fn forward_ref_props_type<'t>(tree: &'t SourceTree, component_name: &str) -> Option<Node<'t>> {
    let call = component_value(tree, component_name)
        .map(unwrap_expression)
        .filter(|node| node.kind() == "call_expression")
        .filter(|node| {
            node.child_by_field_name("function")
                .is_some_and(|f| tree.text(f).ends_with("forwardRef"))
        })?;
    let type_arguments = call.child_by_field_name("type_arguments")?;
    let mut cursor = type_arguments.walk();
    let types: Vec<Node<'t>> = type_arguments.named_children(&mut cursor).collect();
    types.get(1).copied()
}

fn members_of_interface<'t>(tree: &'t SourceTree, interface: Node<'t>) -> Vec<PropInfo> {
    let body = interface
        .child_by_field_name("body")
        .or_else(|| child_of_kinds(interface, &["interface_body", "object_type"]));
    body.map(|b| members_of_object_type(tree, b)).unwrap_or_default()
}

fn members_of_type<'t>(tree: &'t SourceTree, type_node: Node<'t>) -> Vec<PropInfo> {
    match type_node.kind() {
        "object_type" => members_of_object_type(tree, type_node),
        "intersection_type" => {
            // Only literal members of the intersection are adopted; inherited
            // DOM props from referenced types are not expanded
            let mut cursor = type_node.walk();
            let mut props = Vec::new();
            for child in type_node.named_children(&mut cursor) {
                if child.kind() == "object_type" {
                    props.extend(members_of_object_type(tree, child));
                } else if child.kind() == "intersection_type" {
                    props.extend(members_of_type(tree, child));
                }
            }
            props
        }
        _ => Vec::new(),
    }
}

fn members_of_object_type<'t>(tree: &'t SourceTree, object: Node<'t>) -> Vec<PropInfo> {
    let mut cursor = object.walk();
    let mut props = Vec::new();
    for member in object.named_children(&mut cursor) {
        if member.kind() != "property_signature" {
            continue;
        }
        if let Some(prop) = parse_property_signature(tree, member) {
            props.push(prop);
        }
    }
    props
}

fn parse_property_signature<'t>(tree: &'t SourceTree, member: Node<'t>) -> Option<PropInfo> {
    let name = tree.text(member.child_by_field_name("name")?).to_string();
    let optional = has_token(member, "?");

    let type_node = member
        .child_by_field_name("type")
        .and_then(|annotation| annotation.named_child(0));

    let (prop_type, values) = match type_node {
        Some(node) => simplify_type(tree, node),
        None => ("unknown".to_string(), None),
    };

    let mut prop = PropInfo::new(name, prop_type);
    prop.required = !optional;
    prop.values = values;
    prop.description = tree.doc_comment_before(member);
    Some(prop)
}

/// Render a type node into its simplified form plus union-literal values
pub fn simplify_type<'t>(tree: &'t SourceTree, node: Node<'t>) -> (String, Option<Vec<String>>) {
    match node.kind() {
        "predefined_type" => (tree.text(node).to_string(), None),
        "literal_type" => {
            let text = tree.text(node);
            let value = string_content(text).to_string();
            if text.starts_with('"') || text.starts_with('\'') {
                ("string".to_string(), Some(vec![value]))
            } else {
                (text.to_string(), None)
            }
        }
        "union_type" => {
            let members = union_members(node);
            let mut values = Vec::new();
            let mut all_string_literals = true;
            for member in &members {
                let text = tree.text(*member);
                if member.kind() == "literal_type"
                    && (text.starts_with('"') || text.starts_with('\''))
                {
                    values.push(string_content(text).to_string());
                } else {
                    all_string_literals = false;
                }
            }
            if all_string_literals && !values.is_empty() {
                ("string".to_string(), Some(values))
            } else if !values.is_empty() {
                (tree.text(node).to_string(), Some(values))
            } else {
                (tree.text(node).to_string(), None)
            }
        }
        _ => (tree.text(node).to_string(), None),
    }
}

/// Flatten a union type into its member type nodes
fn union_members(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "union_type" {
            let mut cursor = current.walk();
            let children: Vec<Node<'_>> = current.named_children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        } else {
            out.push(current);
        }
    }
    out
}

/// Props read from the component's first parameter destructuring
pub fn parameter_props(tree: &SourceTree, component_name: &str) -> Vec<PropInfo> {
    let Some(pattern) = first_parameter_pattern(tree, component_name) else {
        return Vec::new();
    };
    let mut props = Vec::new();
    let mut cursor = pattern.walk();
    for entry in pattern.named_children(&mut cursor) {
        match entry.kind() {
            "shorthand_property_identifier_pattern" => {
                props.push(PropInfo::new(tree.text(entry).to_string(), "unknown"));
            }
            "object_assignment_pattern" => {
                if let Some(left) = entry.child_by_field_name("left") {
                    let mut prop = PropInfo::new(tree.text(left).to_string(), "unknown");
                    prop.default_value = entry
                        .child_by_field_name("right")
                        .map(|right| render_default(tree, right));
                    props.push(prop);
                }
            }
            "pair_pattern" => {
                if let Some(key) = entry.child_by_field_name("key") {
                    props.push(PropInfo::new(tree.text(key).to_string(), "unknown"));
                }
            }
            // rest elements pass the remainder through; not a prop
            "rest_pattern" => {}
            _ => {}
        }
    }
    props
}

/// Defaults from object-destructuring in the component's parameter
pub fn parameter_defaults(tree: &SourceTree, component_name: &str) -> BTreeMap<String, String> {
    let mut defaults = BTreeMap::new();
    let Some(pattern) = first_parameter_pattern(tree, component_name) else {
        return defaults;
    };
    for node in descendants(pattern) {
        if node.kind() == "object_assignment_pattern" {
            let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) else {
                continue;
            };
            defaults.insert(tree.text(left).to_string(), render_default(tree, right));
        }
    }
    defaults
}

/// Parse strings, numbers, booleans, null and undefined; keep anything else
/// as raw text
fn render_default(tree: &SourceTree, node: Node<'_>) -> String {
    let text = tree.text(node);
    match node.kind() {
        "string" => string_content(text).to_string(),
        "number" | "true" | "false" | "null" => text.to_string(),
        "identifier" if text == "undefined" => text.to_string(),
        _ => text.to_string(),
    }
}

/// The destructuring pattern of the component's first parameter
fn first_parameter_pattern<'t>(tree: &'t SourceTree, component_name: &str) -> Option<Node<'t>> {
    let callable = component_callable(tree, component_name)?;
    let parameters = callable.child_by_field_name("parameters")?;
    let mut cursor = parameters.walk();
    let first = parameters.named_children(&mut cursor).next()?;
    match first.kind() {
        "object_pattern" => Some(first),
        "required_parameter" | "optional_parameter" => first
            .child_by_field_name("pattern")
            .filter(|p| p.kind() == "object_pattern"),
        _ => None,
    }
}

/// The function node backing a component: a declaration, an arrow, or the
/// callback inside `forwardRef(...)` / `memo(...)`
pub fn component_callable<'t>(tree: &'t SourceTree, component_name: &str) -> Option<Node<'t>> {
    for decl in tree.nodes_of_kind("function_declaration") {
        if decl
            .child_by_field_name("name")
            .is_some_and(|n| tree.text(n) == component_name)
        {
            return Some(decl);
        }
    }

    let value = component_value(tree, component_name).map(unwrap_expression)?;
    callable_within(value)
}

/// The initializer of `const {Name} = ...`
pub fn component_value<'t>(tree: &'t SourceTree, component_name: &str) -> Option<Node<'t>> {
    tree.nodes_of_kind("variable_declarator")
        .into_iter()
        .find(|node| {
            node.child_by_field_name("name")
                .is_some_and(|n| tree.text(n) == component_name)
        })
        .and_then(|node| node.child_by_field_name("value"))
        .map(unwrap_expression)
}

/// Dig a function out of a value: the value itself, or the first callback
/// argument of a wrapper call chain (`forwardRef`, `memo`, nested)
fn callable_within(value: Node<'_>) -> Option<Node<'_>> {
    match value.kind() {
        "arrow_function" | "function_expression" | "function" => Some(value),
        "call_expression" => {
            let arguments = value.child_by_field_name("arguments")?;
            let mut cursor = arguments.walk();
            for argument in arguments.named_children(&mut cursor) {
                let argument = unwrap_expression(argument);
                if let Some(found) = callable_within(argument) {
                    return Some(found);
                }
            }
            None
        }
        _ => None,
    }
}

/// Whether a node carries a given anonymous token child
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    if !cursor.goto_first_child() {
        return false;
    }
    loop {
        if cursor.node().kind() == token {
            return true;
        }
        if !cursor.goto_next_sibling() {
            return false;
        }
    }
}

fn child_of_kinds<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| kinds.contains(&child.kind()));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON: &str = r#"
import * as React from "react"

/** A clickable button. */
export interface ButtonProps {
  /** Visual style of the button. */
  variant?: "default" | "destructive" | "ghost"
  /** Content size. */
  size?: "sm" | "lg"
  disabled?: boolean
  label: string
  children?: React.ReactNode
}

const Button = React.forwardRef<HTMLButtonElement, ButtonProps>(
  ({ variant = "default", size = "sm", disabled = false, label, children }, ref) => {
    return (
      <button ref={ref} disabled={disabled}>
        {label}
        {children}
      </button>
    )
  }
)
"#;

    #[test]
    fn interface_props_are_typed() {
        let tree = SourceTree::parse(BUTTON).unwrap();
        let props = typed_props(&tree, "Button").unwrap();
        let variant = props.iter().find(|p| p.name == "variant").unwrap();
        assert_eq!(variant.prop_type, "string");
        assert_eq!(
            variant.values.as_deref(),
            Some(&["default".to_string(), "destructive".to_string(), "ghost".to_string()][..])
        );
        assert!(!variant.required);
        assert_eq!(variant.description.as_deref(), Some("Visual style of the button."));

        let label = props.iter().find(|p| p.name == "label").unwrap();
        assert!(label.required);
        assert_eq!(label.prop_type, "string");
    }

    #[test]
    fn defaults_come_from_destructuring() {
        let tree = SourceTree::parse(BUTTON).unwrap();
        let props = fallback_props(&tree, "Button");
        let variant = props.iter().find(|p| p.name == "variant").unwrap();
        assert_eq!(variant.default_value.as_deref(), Some("default"));
        let disabled = props.iter().find(|p| p.name == "disabled").unwrap();
        assert_eq!(disabled.default_value.as_deref(), Some("false"));
        let label = props.iter().find(|p| p.name == "label").unwrap();
        assert_eq!(label.default_value, None);
    }

    #[test]
    fn type_alias_intersection_adopts_only_literal_members() {
        let source = r#"
type BadgeProps = React.HTMLAttributes<HTMLDivElement> & {
  tone?: "info" | "warning"
  count: number
}

export function Badge({ tone = "info", count }: BadgeProps) {
  return <span>{count}</span>
}
"#;
        let tree = SourceTree::parse(source).unwrap();
        let props = typed_props(&tree, "Badge").unwrap();
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["tone", "count"]);
        let count = props.iter().find(|p| p.name == "count").unwrap();
        assert_eq!(count.prop_type, "number");
    }

    #[test]
    fn parameter_destructuring_without_types() {
        let source = r#"
export const Tag = ({ label, color = "gray", onRemove }) => {
  return <span>{label}</span>
}
"#;
        let tree = SourceTree::parse(source).unwrap();
        assert!(typed_props(&tree, "Tag").is_none());
        let props = fallback_props(&tree, "Tag");
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["label", "color", "onRemove"]);
        let color = props.iter().find(|p| p.name == "color").unwrap();
        assert_eq!(color.default_value.as_deref(), Some("gray"));
    }

    #[test]
    fn empty_source_yields_nothing() {
        let tree = SourceTree::parse("").unwrap();
        assert!(typed_props(&tree, "Nothing").is_none());
        assert!(fallback_props(&tree, "Nothing").is_empty());
    }
}
