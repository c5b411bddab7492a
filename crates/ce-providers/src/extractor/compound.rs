//! Compound component detection
//!
//! Three patterns, checked in order: an `Object.assign(Base, { Sub })` root,
//! re-export renaming (`export { Root as Dialog, Trigger as DialogTrigger }`),
//! and multiple PascalCase named exports sharing a word-boundary common
//! prefix. The exact-prefix export is the root; the rest are sub-components.

use tree_sitter::Node;

use ce_domain::value_objects::CompoundInfo;

use super::ast::{SourceTree, descendants, unwrap_expression};
use super::props::component_callable;
use super::variants::object_pairs;

/// Detect a compound component shape in the file
pub fn detect_compound(tree: &SourceTree) -> Option<CompoundInfo> {
    object_assign_compound(tree)
        .or_else(|| reexport_compound(tree))
        .or_else(|| prefix_compound(tree))
}

/// `const Root = Object.assign(Base, { Sub1, Sub2 })`
fn object_assign_compound(tree: &SourceTree) -> Option<CompoundInfo> {
    for declarator in tree.nodes_of_kind("variable_declarator") {
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let Some(value) = declarator.child_by_field_name("value").map(unwrap_expression) else {
            continue;
        };
        if value.kind() != "call_expression" {
            continue;
        }
        let is_object_assign = value
            .child_by_field_name("function")
            .is_some_and(|f| tree.text(f) == "Object.assign");
        if !is_object_assign {
            continue;
        }
        let Some(arguments) = value.child_by_field_name("arguments") else {
            continue;
        };
        let mut cursor = arguments.walk();
        let args: Vec<Node<'_>> = arguments.named_children(&mut cursor).collect();
        let Some(object) = args.iter().copied().map(unwrap_expression).find(|a| a.kind() == "object")
        else {
            continue;
        };

        let mut sub_components: Vec<String> = object_pairs(tree, object)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        // Shorthand members ({ Sub }) are not pairs; pick them up too
        let mut shorthand_cursor = object.walk();
        for entry in object.named_children(&mut shorthand_cursor) {
            if entry.kind() == "shorthand_property_identifier" {
                sub_components.push(tree.text(entry).to_string());
            }
        }
        sub_components.retain(|name| is_pascal_case(name));

        if !sub_components.is_empty() {
            return Some(CompoundInfo {
                is_compound: true,
                root_component: tree.text(name_node).to_string(),
                sub_components,
            });
        }
    }
    None
}

/// `export { Root as Dialog, Trigger as DialogTrigger }`
fn reexport_compound(tree: &SourceTree) -> Option<CompoundInfo> {
    let mut aliases = Vec::new();
    for clause in tree.nodes_of_kind("export_clause") {
        let mut cursor = clause.walk();
        for specifier in clause.named_children(&mut cursor) {
            if specifier.kind() != "export_specifier" {
                continue;
            }
            if let Some(alias) = specifier.child_by_field_name("alias") {
                aliases.push(tree.text(alias).to_string());
            }
        }
    }
    compound_from_names(aliases)
}

/// Multiple PascalCase named exports sharing a word-boundary common prefix
fn prefix_compound(tree: &SourceTree) -> Option<CompoundInfo> {
    compound_from_names(exported_names(tree))
}

/// All exported value names: declarations inside `export` statements plus
/// unaliased export-list specifiers.
pub fn exported_names(tree: &SourceTree) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |name: String| {
        if !names.contains(&name) {
            names.push(name);
        }
    };

    for export in tree.nodes_of_kind("export_statement") {
        for node in descendants(export) {
            match node.kind() {
                "variable_declarator" | "function_declaration" | "class_declaration" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        push(tree.text(name).to_string());
                    }
                }
                "export_specifier" => {
                    let shown = node
                        .child_by_field_name("alias")
                        .or_else(|| node.child_by_field_name("name"));
                    if let Some(shown) = shown {
                        push(tree.text(shown).to_string());
                    }
                }
                _ => {}
            }
        }
    }
    names
}

/// Shared prefix rule: the exact-prefix export is root, every export that
/// continues it at a word boundary (next char uppercase) is a sub-component.
fn compound_from_names(names: Vec<String>) -> Option<CompoundInfo> {
    let pascal: Vec<&String> = names.iter().filter(|n| is_pascal_case(n)).collect();
    if pascal.len() < 2 {
        return None;
    }

    let mut best: Option<(String, Vec<String>)> = None;
    for candidate in &pascal {
        let subs: Vec<String> = pascal
            .iter()
            .filter(|other| is_word_boundary_extension(candidate, other))
            .map(|s| (*s).clone())
            .collect();
        if subs.is_empty() {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_subs)) => {
                subs.len() > current_subs.len()
                    || (subs.len() == current_subs.len() && candidate.len() < current.len())
            }
        };
        if better {
            best = Some(((*candidate).clone(), subs));
        }
    }

    best.map(|(root, sub_components)| CompoundInfo {
        is_compound: true,
        root_component: root,
        sub_components,
    })
}

/// `other` extends `prefix` with an uppercase word boundary
/// (`Dialog` -> `DialogTrigger`, but not `Dialog` -> `Dialogs`)
fn is_word_boundary_extension(prefix: &str, other: &str) -> bool {
    if other.len() <= prefix.len() || !other.starts_with(prefix) {
        return false;
    }
    other[prefix.len()..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Whether a sub-component appears as a descendant in the root component's
/// own JSX output (the static composition pass behind
/// `required_in_composition`).
pub fn required_in_composition(tree: &SourceTree, root: &str, sub: &str) -> bool {
    let Some(callable) = component_callable(tree, root) else {
        return false;
    };
    let Some(body) = callable.child_by_field_name("body") else {
        return false;
    };
    for node in descendants(body) {
        if matches!(node.kind(), "jsx_opening_element" | "jsx_self_closing_element") {
            if let Some(name) = node.child_by_field_name("name") {
                if tree.text(name) == sub {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_assign_root_wins() {
        let source = r#"
const CardRoot = (props) => <div {...props} />
const CardHeader = (props) => <div {...props} />
const Card = Object.assign(CardRoot, { Header: CardHeader, Footer: CardFooter })
export { Card }
"#;
        let tree = SourceTree::parse(source).unwrap();
        let compound = detect_compound(&tree).unwrap();
        assert_eq!(compound.root_component, "Card");
        assert_eq!(compound.sub_components, vec!["Header", "Footer"]);
    }

    #[test]
    fn prefix_exports_form_a_compound() {
        let source = r#"
export const Dialog = DialogPrimitive.Root
export const DialogTrigger = DialogPrimitive.Trigger
export const DialogContent = make()
export const DialogTitle = make()
export const DialogDescription = make()
"#;
        let tree = SourceTree::parse(source).unwrap();
        let compound = detect_compound(&tree).unwrap();
        assert!(compound.is_compound);
        assert_eq!(compound.root_component, "Dialog");
        assert_eq!(
            compound.sub_components,
            vec!["DialogTrigger", "DialogContent", "DialogTitle", "DialogDescription"]
        );
    }

    #[test]
    fn reexport_renaming_is_checked_before_prefix() {
        let source = r#"
const Root = make()
const Trigger = make()
export { Root as Accordion, Trigger as AccordionTrigger }
"#;
        let tree = SourceTree::parse(source).unwrap();
        let compound = detect_compound(&tree).unwrap();
        assert_eq!(compound.root_component, "Accordion");
        assert_eq!(compound.sub_components, vec!["AccordionTrigger"]);
    }

    #[test]
    fn unrelated_exports_are_not_compound() {
        let source = r#"
export const Button = make()
export const Card = make()
"#;
        let tree = SourceTree::parse(source).unwrap();
        assert!(detect_compound(&tree).is_none());
    }

    #[test]
    fn plural_is_not_a_word_boundary() {
        assert!(is_word_boundary_extension("Dialog", "DialogTrigger"));
        assert!(!is_word_boundary_extension("Dialog", "Dialogs"));
        assert!(!is_word_boundary_extension("Dialog", "Dialog"));
    }
}
