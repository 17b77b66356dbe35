//! Markdown extraction plugin.
//!
//! Document structure maps onto the uniform model as named bindings: headings,
//! fenced code blocks, and link reference definitions.

use tree_sitter::{Node, Tree};
use treescope_contracts::{CodeElement, VariableElement, Visibility};

use super::walker::walk;
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct MarkdownPlugin;

impl LanguagePlugin for MarkdownPlugin {
    fn language(&self) -> &'static str {
        "markdown"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert("headings", ["atx_heading", "setext_heading"].into());
        m.insert(
            "code_blocks",
            ["fenced_code_block", "indented_code_block"].into(),
        );
        m.insert("links", ["link_reference_definition"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["headings", "code_blocks", "links"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "atx_heading" | "setext_heading" => {
                out.get_mut("headings")
                    .unwrap()
                    .push(heading_element(&node, source));
            }
            "fenced_code_block" | "indented_code_block" => {
                out.get_mut("code_blocks")
                    .unwrap()
                    .push(code_block_element(&node, source));
            }
            "link_reference_definition" => {
                out.get_mut("links")
                    .unwrap()
                    .push(link_element(&node, source));
            }
            _ => {}
        });

        out
    }

    fn execute_query_strategy(
        &self,
        tree: &Tree,
        source: &str,
        query_key: &str,
    ) -> Vec<CodeElement> {
        let extracted = self.extract_elements(tree, source);
        extracted
            .get(canonical_key(query_key))
            .cloned()
            .unwrap_or_default()
    }
}

fn heading_element(node: &Node, source: &str) -> CodeElement {
    let text = node_text(node, source);
    let first_line = text.lines().next().unwrap_or("");
    let level = first_line.chars().take_while(|&c| c == '#').count();
    let (level, title) = if level > 0 {
        (level, first_line.trim_start_matches('#').trim().to_string())
    } else {
        // Setext: the title line precedes the underline.
        let underline_level = if text.lines().nth(1).unwrap_or("").starts_with('=') {
            1
        } else {
            2
        };
        (underline_level, first_line.trim().to_string())
    };

    CodeElement::Variable(VariableElement {
        common: element_common(node, source, "markdown", title),
        variable_type: Some("heading".to_string()),
        field_type: Some(format!("h{level}")),
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_static: false,
        is_final: false,
        is_constant: false,
        annotations: Vec::new(),
        docstring: None,
    })
}

fn code_block_element(node: &Node, source: &str) -> CodeElement {
    let mut info = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "info_string" {
            info = node_text(&child, source).trim().to_string();
        }
    }

    CodeElement::Variable(VariableElement {
        common: element_common(node, source, "markdown", info.clone()),
        variable_type: Some("code_block".to_string()),
        field_type: if info.is_empty() { None } else { Some(info) },
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_static: false,
        is_final: false,
        is_constant: false,
        annotations: Vec::new(),
        docstring: None,
    })
}

fn link_element(node: &Node, source: &str) -> CodeElement {
    let mut label = String::new();
    let mut destination = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "link_label" => {
                label = node_text(&child, source)
                    .trim_matches(|c| c == '[' || c == ']' || c == ':')
                    .to_string();
            }
            "link_destination" => {
                destination = Some(node_text(&child, source).to_string());
            }
            _ => {}
        }
    }

    CodeElement::Variable(VariableElement {
        common: element_common(node, source, "markdown", label),
        variable_type: Some("link".to_string()),
        field_type: destination,
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_static: false,
        is_final: false,
        is_constant: false,
        annotations: Vec::new(),
        docstring: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    const DOC: &str = "# Overview\n\nSome prose.\n\n## Usage\n\n```rust\nfn main() {}\n```\n\n[docs]: https://example.com/docs\n";

    fn extract(source: &str) -> ExtractedElements {
        let parsed = parse_source(source.to_string(), "markdown", None).unwrap();
        MarkdownPlugin.extract_elements(&parsed.tree, &parsed.source)
    }

    #[test]
    fn headings_carry_level_and_title() {
        let elements = extract(DOC);
        let headings = &elements["headings"];
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].name(), "Overview");
        match &headings[0] {
            CodeElement::Variable(v) => assert_eq!(v.field_type.as_deref(), Some("h1")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(headings[1].name(), "Usage");
    }

    #[test]
    fn fenced_block_records_language() {
        let elements = extract(DOC);
        let blocks = &elements["code_blocks"];
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "rust");
    }

    #[test]
    fn link_reference_definitions_surface() {
        let elements = extract(DOC);
        let links = &elements["links"];
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name(), "docs");
        match &links[0] {
            CodeElement::Variable(v) => {
                assert_eq!(v.field_type.as_deref(), Some("https://example.com/docs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_document_is_empty_categories() {
        let elements = extract("");
        for bucket in elements.values() {
            assert!(bucket.is_empty());
        }
    }
}
