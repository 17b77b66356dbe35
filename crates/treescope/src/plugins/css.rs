//! CSS extraction plugin.

use tree_sitter::{Node, Tree};
use treescope_contracts::{CodeElement, ImportElement, VariableElement, Visibility};

use super::walker::walk;
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct CssPlugin;

impl LanguagePlugin for CssPlugin {
    fn language(&self) -> &'static str {
        "css"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["css"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert("rules", ["rule_set"].into());
        m.insert("imports", ["import_statement"].into());
        m.insert(
            "at_rules",
            [
                "media_statement",
                "keyframes_statement",
                "supports_statement",
                "charset_statement",
                "namespace_statement",
                "at_rule",
            ]
            .into(),
        );
        m.insert("declarations", ["declaration"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["rules", "imports", "at_rules", "declarations"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "rule_set" => {
                if let Some(element) = rule_element(&node, source) {
                    out.get_mut("rules").unwrap().push(element);
                }
            }
            "import_statement" => {
                out.get_mut("imports").unwrap().push(import_element(&node, source));
            }
            "media_statement" | "keyframes_statement" | "supports_statement"
            | "charset_statement" | "namespace_statement" | "at_rule" => {
                out.get_mut("at_rules").unwrap().push(at_rule_element(&node, source));
            }
            "declaration" => {
                if let Some(element) = declaration_element(&node, source) {
                    out.get_mut("declarations").unwrap().push(element);
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

fn rule_element(node: &Node, source: &str) -> Option<CodeElement> {
    let mut cursor = node.walk();
    let selectors = node
        .children(&mut cursor)
        .find(|c| c.kind() == "selectors")?;
    let name = node_text(&selectors, source).trim().to_string();

    Some(CodeElement::Variable(VariableElement {
        common: element_common(node, source, "css", name),
        variable_type: Some("rule".to_string()),
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

fn import_element(node: &Node, source: &str) -> CodeElement {
    let module = node
        .named_child(0)
        .map(|target| {
            node_text(&target, source)
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .unwrap_or_default();

    CodeElement::Import(ImportElement {
        common: element_common(node, source, "css", module.clone()),
        module,
        is_static: false,
        is_wildcard: false,
        aliased_as: None,
    })
}

/// Named after its prelude: the at-keyword plus everything before the block.
fn at_rule_element(node: &Node, source: &str) -> CodeElement {
    let text = node_text(node, source);
    let name = text
        .split(['{', ';'])
        .next()
        .unwrap_or(text)
        .trim()
        .to_string();

    CodeElement::Variable(VariableElement {
        common: element_common(node, source, "css", name),
        variable_type: Some("at_rule".to_string()),
        field_type: None,
        modifiers: Vec::new(),
        visibility: Visibility::Public,
        is_static: false,
        is_final: false,
        is_constant: false,
        annotations: Vec::new(),
        docstring: None,
    })
}

fn declaration_element(node: &Node, source: &str) -> Option<CodeElement> {
    let mut cursor = node.walk();
    let property = node
        .children(&mut cursor)
        .find(|c| c.kind() == "property_name")?;
    let name = node_text(&property, source).to_string();
    let construct = if name.starts_with("--") {
        "custom_property"
    } else {
        "declaration"
    };

    Some(CodeElement::Variable(VariableElement {
        common: element_common(node, source, "css", name),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    const SHEET: &str = r#"@import "base.css";

:root {
  --accent: #336699;
}

.card, .panel {
  color: var(--accent);
  padding: 4px;
}

@media (max-width: 600px) {
  .card {
    padding: 2px;
  }
}

@keyframes fade {
  from { opacity: 0; }
  to { opacity: 1; }
}
"#;

    fn extract(source: &str) -> ExtractedElements {
        let parsed = parse_source(source.to_string(), "css", None).unwrap();
        CssPlugin.extract_elements(&parsed.tree, &parsed.source)
    }

    #[test]
    fn rules_use_selector_lists_as_names() {
        let elements = extract(SHEET);
        let rules = &elements["rules"];
        // :root, the selector list, and the rule nested in the media block.
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].name(), ".card, .panel");
    }

    #[test]
    fn at_rules_are_extracted_with_their_preludes() {
        let elements = extract(SHEET);
        let at_rules = &elements["at_rules"];
        assert_eq!(at_rules.len(), 2);
        assert_eq!(at_rules[0].name(), "@media (max-width: 600px)");
        assert_eq!(at_rules[1].name(), "@keyframes fade");
        for at_rule in at_rules {
            match at_rule {
                CodeElement::Variable(v) => {
                    assert_eq!(v.variable_type.as_deref(), Some("at_rule"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn imports_are_import_elements() {
        let elements = extract(SHEET);
        let imports = &elements["imports"];
        assert_eq!(imports.len(), 1);
        match &imports[0] {
            CodeElement::Import(i) => assert_eq!(i.module, "base.css"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_properties_are_distinguished() {
        let elements = extract(SHEET);
        let custom = elements["declarations"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Variable(v) if v.common.name == "--accent" => Some(v),
                _ => None,
            })
            .unwrap();
        assert_eq!(custom.variable_type.as_deref(), Some("custom_property"));
    }
}
