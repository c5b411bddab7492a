//! Component identity, slugs and source hashing

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::Framework;

/// Generate a fresh component identifier (random 128-bit, canonical form)
pub fn new_component_id() -> Uuid {
    Uuid::new_v4()
}

/// Build the per-org unique slug for a component.
///
/// Shape: `{kebab(name)}-{framework}-{first 8 hex of id}` where the id hex is
/// taken with dashes stripped. The same `(name, framework, id)` always yields
/// the same slug.
pub fn slug_for(name: &str, framework: Framework, id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("{}-{}-{}", kebab_case(name), framework, &hex[..8])
}

/// Stable digest of the exact source text.
///
/// Any change to the text, including whitespace, yields a different hash.
pub fn source_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Convert an identifier to kebab-case (`DialogTrigger` -> `dialog-trigger`)
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch == ' ' || ch == '_' {
            if !out.ends_with('-') {
                out.push('-');
            }
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out.trim_matches('-').to_string()
}

/// Convert an identifier to camelCase (`AlertDialog` -> `alertDialog`)
pub fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert an identifier to PascalCase (`alert-dialog` -> `AlertDialog`)
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '-' || ch == '_' || ch == ' ' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_shape_is_stable() {
        let id = Uuid::parse_str("a1b2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c5d").unwrap();
        let slug = slug_for("AlertDialog", Framework::React, id);
        assert_eq!(slug, "alert-dialog-react-a1b2c3d4");
        // Idempotent: same inputs, same slug
        assert_eq!(slug, slug_for("AlertDialog", Framework::React, id));
    }

    #[test]
    fn source_hash_is_whitespace_sensitive() {
        let a = source_hash("const x = 1;");
        let b = source_hash("const x  = 1;");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, source_hash("const x = 1;"));
    }

    #[test]
    fn kebab_case_handles_consecutive_capitals() {
        assert_eq!(kebab_case("Button"), "button");
        assert_eq!(kebab_case("AlertDialog"), "alert-dialog");
        assert_eq!(kebab_case("HTMLInput"), "htmlinput");
        assert_eq!(kebab_case("Dropdown Menu"), "dropdown-menu");
    }

    #[test]
    fn camel_and_pascal_case() {
        assert_eq!(camel_case("AlertDialog"), "alertDialog");
        assert_eq!(camel_case("button"), "button");
        assert_eq!(pascal_case("dropdown-menu"), "DropdownMenu");
        assert_eq!(pascal_case("toggle_group"), "ToggleGroup");
    }
}
