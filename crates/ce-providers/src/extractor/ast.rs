//! Shared typed view over a parsed TSX source file
//!
//! Thin helpers around tree-sitter so the extraction passes stay declarative.
//! All passes operate on one immutable [`SourceTree`]; nothing here mutates
//! the AST.

use tree_sitter::{Node, Parser, Tree};

/// A parsed source file plus its text
pub struct SourceTree {
    tree: Tree,
    source: String,
}

impl SourceTree {
    /// Parse TSX source. Returns `None` only when the parser itself fails;
    /// malformed source still yields a tree with error nodes.
    pub fn parse(source: &str) -> Option<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TSX.into();
        parser.set_language(&language).ok()?;
        let tree = parser.parse(source, None)?;
        Some(Self {
            tree,
            source: source.to_string(),
        })
    }

    /// Root node of the file
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Raw source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Text of a node
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Every named node in the file, preorder
    pub fn named_nodes(&self) -> Vec<Node<'_>> {
        descendants(self.root())
    }

    /// Every named node of a kind
    pub fn nodes_of_kind<'t>(&'t self, kind: &str) -> Vec<Node<'t>> {
        self.named_nodes()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    /// The JSDoc block comment immediately preceding a node, cleaned of
    /// comment markers. Only `/** ... */` blocks count.
    pub fn doc_comment_before(&self, node: Node<'_>) -> Option<String> {
        let mut prev = node.prev_sibling();
        // Skip over decorators and modifiers that sit between doc and node
        while let Some(p) = prev {
            if p.kind() == "comment" {
                let text = self.text(p);
                if text.starts_with("/**") {
                    return Some(clean_doc_comment(text));
                }
                return None;
            }
            if p.is_named() {
                return None;
            }
            prev = p.prev_sibling();
        }
        None
    }
}

/// Preorder traversal of a subtree's named nodes, the start node included
pub fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<Node<'_>> = current.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    out
}

/// Strip quotes from a string literal's text
pub fn string_content(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Unwrap `satisfies` / `as` / parenthesized wrappers down to the inner
/// expression
pub fn unwrap_expression<'t>(node: Node<'t>) -> Node<'t> {
    let mut current = node;
    loop {
        match current.kind() {
            "satisfies_expression" | "as_expression" | "parenthesized_expression"
            | "non_null_expression" => {
                let Some(inner) = current.named_child(0) else {
                    return current;
                };
                current = inner;
            }
            _ => return current,
        }
    }
}

/// Remove `/** */` markers and leading asterisks from a doc comment
fn clean_doc_comment(text: &str) -> String {
    text.trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('@'))
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tsx_and_walks_nodes() {
        let tree = SourceTree::parse("const x = <div className=\"a\" />;").unwrap();
        let kinds: Vec<&str> = tree.named_nodes().iter().map(|n| n.kind()).collect();
        assert!(kinds.contains(&"jsx_self_closing_element"));
    }

    #[test]
    fn doc_comment_cleaning() {
        assert_eq!(
            clean_doc_comment("/**\n * The visual style.\n * @default primary\n */"),
            "The visual style."
        );
    }

    #[test]
    fn string_content_strips_quotes() {
        assert_eq!(string_content("'default'"), "default");
        assert_eq!(string_content("\"lg\""), "lg");
    }
}
