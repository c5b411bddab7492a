//! Import dependency extraction
//!
//! Always runs. Walks every import statement: relative and alias specifiers
//! are internal, the rest are npm packages. Type-only imports are skipped.
//! Internal imports outside the utility deny-list become PascalCase internal
//! component dependencies. A single `@radix-ui/react-*` external package
//! nominates the base library.

use std::collections::BTreeMap;

use ce_domain::identity::pascal_case;
use ce_domain::value_objects::BaseLibraryRef;

use super::ast::{SourceTree, string_content};

/// Path segments that mark shared utility modules, not components
const UTILITY_SEGMENTS: &[&str] = &[
    "utils", "helpers", "lib", "hooks", "types", "cn", "clsx", "constants",
];

const RADIX_PREFIX: &str = "@radix-ui/react-";

/// Extracted dependency sets
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    /// External package -> version spec
    pub npm: BTreeMap<String, String>,
    /// Internal component names, PascalCase
    pub internal: Vec<String>,
    /// Base library nomination
    pub base_library: Option<BaseLibraryRef>,
}

/// Walk the file's imports into dependency sets
pub fn extract_dependencies(tree: &SourceTree, path_aliases: &[String]) -> Dependencies {
    let mut deps = Dependencies::default();

    for import in tree.nodes_of_kind("import_statement") {
        let statement_text = tree.text(import);
        // `import type { ... }` says nothing about runtime dependencies
        if statement_text.starts_with("import type") {
            continue;
        }
        let Some(source_node) = import.child_by_field_name("source") else {
            continue;
        };
        let specifier = string_content(tree.text(source_node)).to_string();

        if is_internal(&specifier, path_aliases) {
            if let Some(component) = internal_component_name(&specifier) {
                if !deps.internal.contains(&component) {
                    deps.internal.push(component);
                }
            }
        } else if let Some(package) = npm_package_name(&specifier) {
            deps.npm.entry(package).or_insert_with(|| "*".to_string());
        }
    }

    deps.base_library = nominate_base_library(&deps.npm);
    deps
}

fn is_internal(specifier: &str, path_aliases: &[String]) -> bool {
    specifier.starts_with('.')
        || specifier.starts_with('/')
        || path_aliases.iter().any(|alias| specifier.starts_with(alias))
}

/// `@scope/pkg` keeps two segments; anything else keeps the first
fn npm_package_name(specifier: &str) -> Option<String> {
    if specifier.is_empty() {
        return None;
    }
    let mut segments = specifier.split('/');
    let first = segments.next()?;
    if first.starts_with('@') {
        let second = segments.next()?;
        Some(format!("{first}/{second}"))
    } else {
        Some(first.to_string())
    }
}

/// The PascalCase component behind an internal import, unless its last path
/// segment is a utility module
fn internal_component_name(specifier: &str) -> Option<String> {
    let last = specifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())?;
    let stem = last.strip_suffix(".tsx").or_else(|| last.strip_suffix(".ts")).unwrap_or(last);
    if UTILITY_SEGMENTS.contains(&stem.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some(pascal_case(stem))
}

/// Exactly one `@radix-ui/react-*` package nominates the base library
fn nominate_base_library(npm: &BTreeMap<String, String>) -> Option<BaseLibraryRef> {
    let radix: Vec<&String> = npm.keys().filter(|pkg| pkg.starts_with(RADIX_PREFIX)).collect();
    if radix.len() != 1 {
        return None;
    }
    let package = radix[0].clone();
    let suffix = package.strip_prefix(RADIX_PREFIX).unwrap_or_default();
    Some(BaseLibraryRef {
        component: Some(pascal_case(suffix)),
        name: package,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_internal_and_external_imports() {
        let source = r#"
import * as React from "react"
import { Slot } from "@radix-ui/react-slot"
import { cva } from "class-variance-authority"
import { cn } from "@/lib/utils"
import { Badge } from "./badge"
import { Spinner } from "@/components/spinner"
import type { VariantProps } from "class-variance-authority"
"#;
        let tree = SourceTree::parse(source).unwrap();
        let deps = extract_dependencies(&tree, &["@/".to_string()]);

        assert!(deps.npm.contains_key("react"));
        assert!(deps.npm.contains_key("@radix-ui/react-slot"));
        assert!(deps.npm.contains_key("class-variance-authority"));
        assert_eq!(deps.npm.len(), 3);
        assert_eq!(deps.internal, vec!["Badge".to_string(), "Spinner".to_string()]);
    }

    #[test]
    fn utility_imports_are_not_components() {
        let source = r#"
import { cn } from "@/lib/utils"
import { useControlled } from "@/hooks"
import { TOKENS } from "./constants"
"#;
        let tree = SourceTree::parse(source).unwrap();
        let deps = extract_dependencies(&tree, &["@/".to_string()]);
        assert!(deps.internal.is_empty());
    }

    #[test]
    fn single_radix_package_nominates_base_library() {
        let source = r#"
import * as DialogPrimitive from "@radix-ui/react-dialog"
import * as React from "react"
"#;
        let tree = SourceTree::parse(source).unwrap();
        let deps = extract_dependencies(&tree, &[]);
        let base = deps.base_library.unwrap();
        assert_eq!(base.name, "@radix-ui/react-dialog");
        assert_eq!(base.component.as_deref(), Some("Dialog"));
    }

    #[test]
    fn multiple_radix_packages_nominate_nothing() {
        let source = r#"
import * as DialogPrimitive from "@radix-ui/react-dialog"
import * as PopoverPrimitive from "@radix-ui/react-popover"
"#;
        let tree = SourceTree::parse(source).unwrap();
        let deps = extract_dependencies(&tree, &[]);
        assert!(deps.base_library.is_none());
    }
}
