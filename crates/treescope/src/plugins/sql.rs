//! SQL extraction plugin.
//!
//! The grammar parses common DDL cleanly but produces ERROR nodes for many
//! vendor-specific stored-procedure dialects; those are recovered textually
//! rather than dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Tree};
use treescope_contracts::{
    ClassElement, ClassKind, CodeElement, FunctionElement, Visibility,
};

use super::walker::walk;
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

static ROUTINE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)create\s+(?:or\s+replace\s+)?(?:procedure|function)\s+([A-Za-z_][A-Za-z0-9_.]*)")
        .unwrap()
});

pub struct SqlPlugin;

impl LanguagePlugin for SqlPlugin {
    fn language(&self) -> &'static str {
        "sql"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["sql"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert("tables", ["create_table"].into());
        m.insert(
            "views",
            ["create_view", "create_materialized_view"].into(),
        );
        m.insert("functions", ["create_function"].into());
        m.insert(
            "procedures",
            ["create_function", "create_procedure", "ERROR"].into(),
        );
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["tables", "views", "functions", "procedures"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "create_table" => {
                if let Some(element) = relation_element(&node, source, ClassKind::Struct) {
                    out.get_mut("tables").unwrap().push(element);
                }
            }
            "create_view" | "create_materialized_view" => {
                if let Some(element) = relation_element(&node, source, ClassKind::Class) {
                    out.get_mut("views").unwrap().push(element);
                }
            }
            "create_function" => {
                if let Some(element) = routine_element(&node, source) {
                    out.get_mut("functions").unwrap().push(element.clone());
                    out.get_mut("procedures").unwrap().push(element);
                }
            }
            "create_procedure" => {
                if let Some(element) = routine_element(&node, source) {
                    out.get_mut("procedures").unwrap().push(element);
                }
            }
            "ERROR" => {
                // Dialect-specific routines the grammar cannot parse cleanly.
                if let Some(element) = error_routine_element(&node, source) {
                    out.get_mut("procedures").unwrap().push(element);
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
        let category = match canonical_key(query_key) {
            "functions" | "methods" => "functions",
            "classes" => "tables",
            other => other,
        };
        extracted.get(category).cloned().unwrap_or_default()
    }
}

fn object_name(node: &Node, source: &str) -> Option<String> {
    let mut found = None;
    walk(*node, |candidate, _| {
        if found.is_none() && candidate.kind() == "object_reference" {
            let name = candidate
                .child_by_field_name("name")
                .map(|n| node_text(&n, source).to_string());
            if name.is_some() {
                found = name;
            }
        }
    });
    found
}

fn relation_element(node: &Node, source: &str, class_type: ClassKind) -> Option<CodeElement> {
    let name = object_name(node, source)?;
    Some(CodeElement::Class(ClassElement {
        common: element_common(node, source, "sql", name.clone()),
        class_type,
        superclass: None,
        interfaces: Vec::new(),
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_nested: false,
        full_qualified_name: Some(name),
        package_name: None,
        annotations: Vec::new(),
    }))
}

fn routine_element(node: &Node, source: &str) -> Option<CodeElement> {
    let name = object_name(node, source)?;
    Some(function_element(node, source, name))
}

fn error_routine_element(node: &Node, source: &str) -> Option<CodeElement> {
    let text = node_text(node, source);
    let name = ROUTINE_NAME.captures(text)?[1].to_string();
    Some(function_element(node, source, name))
}

fn function_element(node: &Node, source: &str, name: String) -> CodeElement {
    CodeElement::Function(FunctionElement {
        common: element_common(node, source, "sql", name),
        parameters: Vec::new(),
        return_type: None,
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_constructor: false,
        is_static: false,
        is_abstract: false,
        is_final: false,
        throws: Vec::new(),
        complexity_score: 1,
        docstring: None,
        annotations: Vec::new(),
    })
}
