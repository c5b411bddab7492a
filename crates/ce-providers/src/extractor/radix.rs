//! Radix primitive resolution
//!
//! Given a namespace import `import * as X from '@radix-ui/react-Y'`, each
//! component in the file is mapped to the Radix member it wraps: a direct
//! re-export, a `forwardRef` render of `<X.Member />`, or a plain component
//! returning one.

use tree_sitter::Node;

use ce_domain::value_objects::RadixPrimitiveRef;

use super::ast::{SourceTree, descendants, string_content, unwrap_expression};
use super::props::{component_callable, component_value};

const RADIX_PREFIX: &str = "@radix-ui/react-";
const RADIX_DOCS_BASE: &str = "https://www.radix-ui.com/primitives/docs/components/";

/// A resolved Radix namespace import
#[derive(Debug, Clone)]
pub struct RadixNamespace {
    /// Local alias (`DialogPrimitive`)
    pub alias: String,
    /// Package suffix (`dialog`)
    pub package_slug: String,
}

/// Find the file's Radix namespace import, if any
pub fn find_radix_namespace(tree: &SourceTree) -> Option<RadixNamespace> {
    for import in tree.nodes_of_kind("import_statement") {
        let Some(source_node) = import.child_by_field_name("source") else {
            continue;
        };
        let specifier = string_content(tree.text(source_node));
        let Some(slug) = specifier.strip_prefix(RADIX_PREFIX) else {
            continue;
        };
        for node in descendants(import) {
            if node.kind() == "namespace_import" {
                if let Some(alias) = node.named_child(0) {
                    return Some(RadixNamespace {
                        alias: tree.text(alias).to_string(),
                        package_slug: slug.to_string(),
                    });
                }
            }
        }
    }
    None
}

/// Resolve the Radix member a component wraps
pub fn resolve_primitive(
    tree: &SourceTree,
    namespace: &RadixNamespace,
    component_name: &str,
) -> Option<RadixPrimitiveRef> {
    let member = direct_reexport_member(tree, namespace, component_name)
        .or_else(|| rendered_member(tree, namespace, component_name))?;

    Some(RadixPrimitiveRef {
        docs_url: format!(
            "{RADIX_DOCS_BASE}{}#{}",
            namespace.package_slug,
            member.to_lowercase()
        ),
        primitive: member,
    })
}

/// `const DialogTrigger = DialogPrimitive.Trigger`
fn direct_reexport_member(
    tree: &SourceTree,
    namespace: &RadixNamespace,
    component_name: &str,
) -> Option<String> {
    let value = component_value(tree, component_name)?;
    member_of_namespace(tree, value, &namespace.alias)
}

/// `forwardRef((props, ref) => <DialogPrimitive.Content ... />)` or a plain
/// function/arrow returning the element
fn rendered_member(
    tree: &SourceTree,
    namespace: &RadixNamespace,
    component_name: &str,
) -> Option<String> {
    let callable = component_callable(tree, component_name)?;
    let body = callable.child_by_field_name("body")?;
    let prefix = format!("{}.", namespace.alias);

    for node in descendants(body) {
        let tag = match node.kind() {
            "jsx_opening_element" | "jsx_self_closing_element" => {
                node.child_by_field_name("name")
            }
            _ => None,
        };
        if let Some(tag) = tag {
            let text = tree.text(tag);
            if let Some(member) = text.strip_prefix(&prefix) {
                return Some(member.to_string());
            }
        }
    }
    None
}

/// `X.Member` where `X` is the namespace alias
fn member_of_namespace(tree: &SourceTree, node: Node<'_>, alias: &str) -> Option<String> {
    let node = unwrap_expression(node);
    if !matches!(node.kind(), "member_expression" | "nested_identifier") {
        return None;
    }
    let text = tree.text(node);
    text.strip_prefix(&format!("{alias}.")).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIALOG: &str = r#"
import * as React from "react"
import * as DialogPrimitive from "@radix-ui/react-dialog"

const Dialog = DialogPrimitive.Root

const DialogTrigger = DialogPrimitive.Trigger

const DialogContent = React.forwardRef<
  React.ElementRef<typeof DialogPrimitive.Content>,
  React.ComponentPropsWithoutRef<typeof DialogPrimitive.Content>
>(({ className, children, ...props }, ref) => (
  <DialogPrimitive.Portal>
    <DialogPrimitive.Content ref={ref} {...props}>
      {children}
    </DialogPrimitive.Content>
  </DialogPrimitive.Portal>
))

function DialogTitle(props) {
  return <DialogPrimitive.Title {...props} />
}
"#;

    #[test]
    fn namespace_import_is_found() {
        let tree = SourceTree::parse(DIALOG).unwrap();
        let ns = find_radix_namespace(&tree).unwrap();
        assert_eq!(ns.alias, "DialogPrimitive");
        assert_eq!(ns.package_slug, "dialog");
    }

    #[test]
    fn direct_reexport_resolves() {
        let tree = SourceTree::parse(DIALOG).unwrap();
        let ns = find_radix_namespace(&tree).unwrap();
        let primitive = resolve_primitive(&tree, &ns, "DialogTrigger").unwrap();
        assert_eq!(primitive.primitive, "Trigger");
        assert_eq!(
            primitive.docs_url,
            "https://www.radix-ui.com/primitives/docs/components/dialog#trigger"
        );
    }

    #[test]
    fn forward_ref_render_resolves_first_member() {
        let tree = SourceTree::parse(DIALOG).unwrap();
        let ns = find_radix_namespace(&tree).unwrap();
        let primitive = resolve_primitive(&tree, &ns, "DialogContent").unwrap();
        assert_eq!(primitive.primitive, "Portal");
        assert!(primitive.docs_url.contains("/primitives/docs/components/dialog#"));
    }

    #[test]
    fn function_component_resolves() {
        let tree = SourceTree::parse(DIALOG).unwrap();
        let ns = find_radix_namespace(&tree).unwrap();
        let primitive = resolve_primitive(&tree, &ns, "DialogTitle").unwrap();
        assert_eq!(primitive.primitive, "Title");
    }
}
