//! Variant builder extraction (`cva` / `tv`)
//!
//! Always runs, independent of props. Finds every variable initialized by a
//! variant builder call, records its `variants` and `defaultVariants`
//! objects, then links builders to the component that references them inside
//! its body. Unlinked components fall back to the `{camel(name)}Variants`
//! naming convention.

use std::collections::BTreeMap;

use tree_sitter::Node;

use ce_domain::identity::camel_case;

use super::ast::{SourceTree, descendants, string_content, unwrap_expression};
use super::props::component_callable;

/// A parsed variant builder variable
#[derive(Debug, Clone, Default)]
pub struct VariantBuilder {
    /// variant name -> value names
    pub variants: BTreeMap<String, Vec<String>>,
    /// variant name -> default value
    pub defaults: BTreeMap<String, String>,
}

/// Every variant builder in the file, keyed by variable name
pub fn find_variant_builders(tree: &SourceTree) -> BTreeMap<String, VariantBuilder> {
    let mut builders = BTreeMap::new();

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
        let Some(function) = value.child_by_field_name("function") else {
            continue;
        };
        let callee = tree.text(function);
        if callee != "cva" && callee != "tv" {
            continue;
        }
        if let Some(builder) = parse_builder_call(tree, value) {
            builders.insert(tree.text(name_node).to_string(), builder);
        }
    }

    builders
}

/// Variants and defaults merged from the builders a component actually uses.
///
/// Usage is discovered by walking every call expression inside the
/// component's function body; a builder is linked when it appears as the
/// callee. With no usage link, the `{camel(name)}Variants` convention is
/// tried.
pub fn variants_for_component(
    tree: &SourceTree,
    component_name: &str,
    builders: &BTreeMap<String, VariantBuilder>,
) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, String>) {
    let mut variants = BTreeMap::new();
    let mut defaults = BTreeMap::new();

    let used = builders_used_in_body(tree, component_name, builders);
    let linked: Vec<&VariantBuilder> = if used.is_empty() {
        let conventional = format!("{}Variants", camel_case(component_name));
        builders.get(&conventional).into_iter().collect()
    } else {
        used.iter().filter_map(|name| builders.get(name)).collect()
    };

    for builder in linked {
        for (variant, values) in &builder.variants {
            variants.entry(variant.clone()).or_insert_with(|| values.clone());
        }
        for (variant, value) in &builder.defaults {
            defaults.entry(variant.clone()).or_insert_with(|| value.clone());
        }
    }

    (variants, defaults)
}

fn builders_used_in_body(
    tree: &SourceTree,
    component_name: &str,
    builders: &BTreeMap<String, VariantBuilder>,
) -> Vec<String> {
    let Some(callable) = component_callable(tree, component_name) else {
        return Vec::new();
    };
    let Some(body) = callable.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut used = Vec::new();
    for node in descendants(body) {
        if node.kind() != "call_expression" {
            continue;
        }
        let Some(function) = node.child_by_field_name("function") else {
            continue;
        };
        let callee = tree.text(function);
        if builders.contains_key(callee) && !used.iter().any(|u| u == callee) {
            used.push(callee.to_string());
        }
    }
    used
}

/// Read the `variants` and `defaultVariants` objects out of a builder call's
/// arguments, wherever they sit (`cva(base, config)` or `tv(config)`).
fn parse_builder_call<'t>(tree: &'t SourceTree, call: Node<'t>) -> Option<VariantBuilder> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut builder = VariantBuilder::default();
    let mut cursor = arguments.walk();

    for argument in arguments.named_children(&mut cursor) {
        let argument = unwrap_expression(argument);
        if argument.kind() != "object" {
            continue;
        }
        for (key, value) in object_pairs(tree, argument) {
            match key.as_str() {
                "variants" => {
                    if value.kind() == "object" {
                        builder.variants = parse_variants_object(tree, value);
                    }
                }
                "defaultVariants" => {
                    if value.kind() == "object" {
                        builder.defaults = parse_defaults_object(tree, value);
                    }
                }
                _ => {}
            }
        }
    }

    Some(builder)
}

/// `variants: { variant: { default: ..., ghost: ... }, size: { sm: ... } }`
fn parse_variants_object<'t>(
    tree: &'t SourceTree,
    object: Node<'t>,
) -> BTreeMap<String, Vec<String>> {
    let mut variants = BTreeMap::new();
    for (variant_name, value) in object_pairs(tree, object) {
        if value.kind() != "object" {
            continue;
        }
        // Declaration order of the value names is the order users see
        let values: Vec<String> = object_pairs(tree, value)
            .into_iter()
            .map(|(value_name, _)| value_name)
            .collect();
        variants.insert(variant_name, values);
    }
    variants
}

fn parse_defaults_object<'t>(tree: &'t SourceTree, object: Node<'t>) -> BTreeMap<String, String> {
    let mut defaults = BTreeMap::new();
    for (variant_name, value) in object_pairs(tree, object) {
        defaults.insert(variant_name, string_content(tree.text(value)).to_string());
    }
    defaults
}

/// Key/value pairs of an object literal, declaration order preserved
pub fn object_pairs<'t>(tree: &'t SourceTree, object: Node<'t>) -> Vec<(String, Node<'t>)> {
    let mut pairs = Vec::new();
    let mut cursor = object.walk();
    for entry in object.named_children(&mut cursor) {
        if entry.kind() != "pair" {
            continue;
        }
        let (Some(key), Some(value)) = (
            entry.child_by_field_name("key"),
            entry.child_by_field_name("value"),
        ) else {
            continue;
        };
        let key_text = string_content(tree.text(key)).to_string();
        pairs.push((key_text, unwrap_expression(value)));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUTTON: &str = r#"
import { cva } from "class-variance-authority"

const buttonVariants = cva(
  "inline-flex items-center",
  {
    variants: {
      variant: {
        default: "bg-primary",
        destructive: "bg-destructive",
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

const Button = React.forwardRef<HTMLButtonElement, ButtonProps>(
  ({ className, variant, size, ...props }, ref) => {
    return <button className={cn(buttonVariants({ variant, size, className }))} ref={ref} {...props} />
  }
)
"#;

    #[test]
    fn builder_variants_and_defaults_are_parsed() {
        let tree = SourceTree::parse(BUTTON).unwrap();
        let builders = find_variant_builders(&tree);
        let builder = &builders["buttonVariants"];
        assert_eq!(
            builder.variants["variant"],
            vec!["default".to_string(), "destructive".to_string()]
        );
        assert_eq!(builder.variants["size"], vec!["sm".to_string(), "lg".to_string()]);
        assert_eq!(builder.defaults["variant"], "default");
        assert_eq!(builder.defaults["size"], "sm");
    }

    #[test]
    fn usage_link_resolves_through_the_component_body() {
        let tree = SourceTree::parse(BUTTON).unwrap();
        let builders = find_variant_builders(&tree);
        let (variants, defaults) = variants_for_component(&tree, "Button", &builders);
        assert_eq!(variants.len(), 2);
        assert_eq!(defaults["size"], "sm");
    }

    #[test]
    fn name_convention_links_when_no_usage_is_found() {
        let source = r#"
const alertVariants = cva("base", {
  variants: { tone: { info: "a", danger: "b" } },
  defaultVariants: { tone: "info" },
})

export function Alert(props: AlertProps) {
  return <div role="alert" {...props} />
}
"#;
        let tree = SourceTree::parse(source).unwrap();
        let builders = find_variant_builders(&tree);
        let (variants, defaults) = variants_for_component(&tree, "Alert", &builders);
        assert_eq!(variants["tone"], vec!["info".to_string(), "danger".to_string()]);
        assert_eq!(defaults["tone"], "info");
    }

    #[test]
    fn tv_builders_are_recognized() {
        let source = r#"
const chip = tv({
  variants: { size: { sm: "text-xs", md: "text-sm" } },
})
"#;
        let tree = SourceTree::parse(source).unwrap();
        let builders = find_variant_builders(&tree);
        assert!(builders.contains_key("chip"));
        assert_eq!(builders["chip"].variants["size"].len(), 2);
    }
}
