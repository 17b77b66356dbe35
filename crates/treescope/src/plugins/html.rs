//! HTML extraction plugin.

use tree_sitter::{Node, Tree};
use treescope_contracts::{CodeElement, VariableElement, Visibility};

use super::walker::walk;
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct HtmlPlugin;

impl LanguagePlugin for HtmlPlugin {
    fn language(&self) -> &'static str {
        "html"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert("elements", ["element"].into());
        m.insert("scripts", ["script_element"].into());
        m.insert("styles", ["style_element"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["elements", "scripts", "styles"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "element" => {
                if let Some(element) = tag_element(&node, source, "element") {
                    out.get_mut("elements").unwrap().push(element);
                }
            }
            "script_element" => {
                if let Some(element) = tag_element(&node, source, "script") {
                    out.get_mut("scripts").unwrap().push(element);
                }
            }
            "style_element" => {
                if let Some(element) = tag_element(&node, source, "style") {
                    out.get_mut("styles").unwrap().push(element);
                }
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

fn tag_element(node: &Node, source: &str, construct: &str) -> Option<CodeElement> {
    let mut cursor = node.walk();
    let start_tag = node
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"))?;

    let mut tag_name = String::new();
    let mut id_attr = None;
    let mut inner = start_tag.walk();
    for child in start_tag.children(&mut inner) {
        match child.kind() {
            "tag_name" => tag_name = node_text(&child, source).to_string(),
            "attribute" => {
                let text = node_text(&child, source);
                if let Some(value) = text.strip_prefix("id=") {
                    id_attr = Some(value.trim_matches('"').trim_matches('\'').to_string());
                }
            }
            _ => {}
        }
    }
    if tag_name.is_empty() {
        return None;
    }

    let name = match id_attr {
        Some(id) => format!("{tag_name}#{id}"),
        None => tag_name,
    };

    Some(CodeElement::Variable(VariableElement {
        common: element_common(node, source, "html", name),
        variable_type: Some(construct.to_string()),
        field_type: None,
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_static: false,
        is_final: false,
        is_constant: false,
        annotations: Vec::new(),
        docstring: None,
    }))
}
