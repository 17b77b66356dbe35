//! Python extraction plugin.

use tree_sitter::{Node, Tree};
use treescope_contracts::{
    AnnotationElement, AnnotationRef, ClassElement, ClassKind, CodeElement, FunctionElement,
    ImportElement, Param, VariableElement, Visibility,
};

use super::walker::{walk, ExtractionCaches};
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct PythonPlugin;

impl LanguagePlugin for PythonPlugin {
    fn language(&self) -> &'static str {
        "python"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert("functions", ["function_definition"].into());
        m.insert("classes", ["class_definition"].into());
        m.insert("variables", ["assignment"].into());
        m.insert(
            "imports",
            ["import_statement", "import_from_statement"].into(),
        );
        m.insert("annotations", ["decorator"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        PythonExtractor::new(source).run(tree)
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
            "fields" | "variables" => "variables",
            other => other,
        };
        extracted.get(category).cloned().unwrap_or_default()
    }
}

struct PythonExtractor<'a> {
    source: &'a str,
    caches: ExtractionCaches,
}

impl<'a> PythonExtractor<'a> {
    fn new(source: &'a str) -> Self {
        let mut caches = ExtractionCaches::new();
        caches.clear();
        PythonExtractor { source, caches }
    }

    fn run(mut self, tree: &Tree) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["functions", "classes", "variables", "imports", "annotations"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "function_definition" => match self.handle_function(&node) {
                Some(element) => out.get_mut("functions").unwrap().push(element),
                None => tracing::warn!(
                    line = node.start_position().row + 1,
                    "skipping malformed function definition"
                ),
            },
            "class_definition" => {
                if let Some(element) = self.handle_class(&node) {
                    out.get_mut("classes").unwrap().push(element);
                }
            }
            "assignment" => {
                if let Some(element) = self.handle_assignment(&node) {
                    out.get_mut("variables").unwrap().push(element);
                }
            }
            "import_statement" | "import_from_statement" => {
                out.get_mut("imports").unwrap().extend(self.handle_import(&node));
            }
            "decorator" => {
                if let Some(element) = self.handle_decorator(&node) {
                    out.get_mut("annotations").unwrap().push(element);
                }
            }
            _ => {}
        });

        out
    }

    fn handle_function(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();

        let parameters = self.parameters_of(node);
        let return_type = node
            .child_by_field_name("return_type")
            .map(|t| node_text(&t, self.source).to_string());

        let decorators = self.decorators_of(node);
        let decorator_names: Vec<String> = decorators.iter().map(|d| d.name.clone()).collect();

        let mut modifiers: Vec<String> = Vec::new();
        if has_keyword_child(node, "async") {
            modifiers.push("async".to_string());
        }
        for known in ["staticmethod", "classmethod", "abstractmethod", "property"] {
            if decorator_names.iter().any(|d| d == known || d.ends_with(&format!(".{known}"))) {
                modifiers.push(known.to_string());
            }
        }

        let in_class = self.enclosing_class_names(node).len() > 0;
        let is_constructor = in_class && name == "__init__";
        let is_static = modifiers.iter().any(|m| m == "staticmethod");
        let is_abstract = modifiers.iter().any(|m| m == "abstractmethod");

        let return_type = if is_constructor {
            // Python's constructor never returns a value.
            Some("None".to_string())
        } else {
            return_type
        };

        let body = node.child_by_field_name("body");
        let complexity_score = body.map(|b| self.complexity_of(&b)).unwrap_or(1);
        let docstring = body.and_then(|b| self.docstring_of(&b));

        Some(CodeElement::Function(FunctionElement {
            common: element_common(node, self.source, "python", name.clone()),
            parameters,
            return_type,
            modifiers,
            visibility: python_visibility(&name),
            is_constructor,
            is_static,
            is_abstract,
            is_final: false,
            throws: Vec::new(),
            complexity_score,
            docstring,
            annotations: decorators,
        }))
    }

    fn handle_class(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if let Some(bases) = node.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            for (i, base) in bases.named_children(&mut cursor).enumerate() {
                let text = node_text(&base, self.source).to_string();
                if i == 0 {
                    superclass = Some(text);
                } else {
                    interfaces.push(text);
                }
            }
        }

        let enclosing = self.enclosing_class_names(node);
        let is_nested = !enclosing.is_empty();
        let mut qualified: Vec<String> = enclosing;
        qualified.push(name.clone());

        Some(CodeElement::Class(ClassElement {
            common: element_common(node, self.source, "python", name.clone()),
            class_type: ClassKind::Class,
            superclass,
            interfaces,
            modifiers: Vec::new(),
            visibility: python_visibility(&name),
            is_nested,
            full_qualified_name: Some(qualified.join(".")),
            package_name: None,
            annotations: self.decorators_of(node),
        }))
    }

    /// Module-level and class-level bindings only; local assignments inside
    /// functions are not part of the structural view.
    fn handle_assignment(&mut self, node: &Node) -> Option<CodeElement> {
        let left = node.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        if !self.is_structural_scope(node) {
            return None;
        }
        let name = node_text(&left, self.source).to_string();
        let declared_type = node
            .child_by_field_name("type")
            .map(|t| node_text(&t, self.source).to_string());

        Some(CodeElement::Variable(VariableElement {
            common: element_common(node, self.source, "python", name.clone()),
            variable_type: declared_type.clone(),
            field_type: declared_type,
            modifiers: Vec::new(),
            visibility: python_visibility(&name),
            is_static: false,
            is_final: false,
            // Python has no final/static concept, so never a constant here.
            is_constant: false,
            annotations: Vec::new(),
            docstring: None,
        }))
    }

    fn handle_import(&mut self, node: &Node) -> Vec<CodeElement> {
        let mut elements = Vec::new();

        if node.kind() == "import_statement" {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "dotted_name" => {
                        let module = node_text(&child, self.source).to_string();
                        elements.push(self.import_element(node, module, false, None));
                    }
                    "aliased_import" => {
                        let module = child
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, self.source).to_string())
                            .unwrap_or_default();
                        let alias = child
                            .child_by_field_name("alias")
                            .map(|a| node_text(&a, self.source).to_string());
                        elements.push(self.import_element(node, module, false, alias));
                    }
                    _ => {}
                }
            }
            return elements;
        }

        // from M import a, b as c, *
        let module = node
            .child_by_field_name("module_name")
            .map(|m| node_text(&m, self.source).to_string())
            .unwrap_or_default();
        let mut cursor = node.walk();
        let mut imported_any = false;
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "wildcard_import" => {
                    elements.push(self.import_element(node, format!("{module}.*"), true, None));
                    imported_any = true;
                }
                "dotted_name" if node_text(&child, self.source) != module => {
                    let symbol = node_text(&child, self.source).to_string();
                    elements.push(self.import_element(node, format!("{module}.{symbol}"), false, None));
                    imported_any = true;
                }
                "aliased_import" => {
                    let symbol = child
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, self.source).to_string())
                        .unwrap_or_default();
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|a| node_text(&a, self.source).to_string());
                    elements.push(self.import_element(node, format!("{module}.{symbol}"), false, alias));
                    imported_any = true;
                }
                _ => {}
            }
        }
        if !imported_any && !module.is_empty() {
            elements.push(self.import_element(node, module, false, None));
        }
        elements
    }

    fn import_element(
        &mut self,
        node: &Node,
        module: String,
        is_wildcard: bool,
        aliased_as: Option<String>,
    ) -> CodeElement {
        CodeElement::Import(ImportElement {
            common: element_common(node, self.source, "python", module.clone()),
            module,
            is_static: false,
            is_wildcard,
            aliased_as,
        })
    }

    fn handle_decorator(&mut self, node: &Node) -> Option<CodeElement> {
        let reference = decorator_ref(node, self.source)?;
        Some(CodeElement::Annotation(AnnotationElement {
            common: element_common(node, self.source, "python", reference.name.clone()),
            arguments: reference.arguments,
        }))
    }

    fn parameters_of(&mut self, node: &Node) -> Vec<Param> {
        let Some(params_node) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut parameters = Vec::new();
        let mut cursor = params_node.walk();
        for param in params_node.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => parameters.push(Param {
                    name: node_text(&param, self.source).to_string(),
                    type_name: None,
                }),
                "typed_parameter" => {
                    let name = param
                        .named_child(0)
                        .map(|n| node_text(&n, self.source).to_string())
                        .unwrap_or_default();
                    let type_name = param
                        .child_by_field_name("type")
                        .map(|t| node_text(&t, self.source).to_string());
                    parameters.push(Param { name, type_name });
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = param
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, self.source).to_string())
                        .unwrap_or_default();
                    let type_name = param
                        .child_by_field_name("type")
                        .map(|t| node_text(&t, self.source).to_string());
                    parameters.push(Param { name, type_name });
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => parameters.push(Param {
                    name: node_text(&param, self.source).to_string(),
                    type_name: None,
                }),
                _ => {}
            }
        }
        parameters
    }

    fn decorators_of(&mut self, node: &Node) -> Vec<AnnotationRef> {
        let Some(parent) = node.parent() else {
            return Vec::new();
        };
        if parent.kind() != "decorated_definition" {
            return Vec::new();
        }
        let mut decorators = Vec::new();
        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            if child.kind() == "decorator" {
                if let Some(reference) = decorator_ref(&child, self.source) {
                    decorators.push(reference);
                }
            }
        }
        decorators
    }

    fn docstring_of(&mut self, body: &Node) -> Option<String> {
        let first = body.named_child(0)?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let string = first.named_child(0)?;
        if string.kind() != "string" {
            return None;
        }
        let text = self.caches.node_text(&string, self.source);
        Some(strip_string_quotes(&text).trim().to_string())
    }

    fn complexity_of(&mut self, body: &Node) -> u32 {
        let mut score: u32 = 1;
        walk(*body, |node, _| match node.kind() {
            "if_statement" | "elif_clause" | "for_statement" | "while_statement"
            | "except_clause" | "conditional_expression" | "case_clause" => score += 1,
            "boolean_operator" => score += 1,
            _ => {}
        });
        score
    }

    fn enclosing_class_names(&mut self, node: &Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if ancestor.kind() == "class_definition" {
                if let Some(name_node) = ancestor.child_by_field_name("name") {
                    names.push(node_text(&name_node, self.source).to_string());
                }
            }
            current = ancestor.parent();
        }
        names.reverse();
        names
    }

    /// True when the assignment sits at module scope or directly in a class
    /// body.
    fn is_structural_scope(&self, node: &Node) -> bool {
        let Some(stmt) = node.parent() else {
            return false;
        };
        if stmt.kind() != "expression_statement" {
            return false;
        }
        match stmt.parent().map(|p| p.kind()) {
            Some("module") => true,
            Some("block") => stmt
                .parent()
                .and_then(|block| block.parent())
                .map(|owner| owner.kind() == "class_definition")
                .unwrap_or(false),
            _ => false,
        }
    }
}

fn decorator_ref(node: &Node, source: &str) -> Option<AnnotationRef> {
    let expr = node.named_child(0)?;
    match expr.kind() {
        "call" => {
            let name = expr
                .child_by_field_name("function")
                .map(|f| node_text(&f, source).to_string())?;
            let arguments = expr
                .child_by_field_name("arguments")
                .map(|a| node_text(&a, source).to_string());
            Some(AnnotationRef { name, arguments })
        }
        _ => Some(AnnotationRef {
            name: node_text(&expr, source).to_string(),
            arguments: None,
        }),
    }
}

fn python_visibility(name: &str) -> Visibility {
    if name.starts_with("__") && name.ends_with("__") {
        // Dunders are part of the public protocol.
        Visibility::Public
    } else if name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn strip_string_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if trimmed.len() >= quote.len() * 2
            && trimmed.starts_with(quote)
            && trimmed.ends_with(quote)
        {
            return trimmed[quote.len()..trimmed.len() - quote.len()].to_string();
        }
    }
    trimmed.to_string()
}

fn has_keyword_child(node: &Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == keyword);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn extract(source: &str) -> ExtractedElements {
        let parsed = parse_source(source.to_string(), "python", None).unwrap();
        PythonPlugin.extract_elements(&parsed.tree, &parsed.source)
    }

    const PIPELINE: &str = r#"import os
from pathlib import Path
from typing import Any as AnyType
from collections import *

RETRY_LIMIT = 3

class Processor:
    """Processes batches of records."""

    default_batch = 100

    def __init__(self, size: int = 10):
        self.size = size

    @staticmethod
    def parse(raw: str) -> dict:
        """Parse one raw record."""
        if not raw:
            return {}
        return {"raw": raw}

    def _validate(self, record) -> bool:
        return record is not None and record != {}

async def drain(queue):
    while True:
        item = await queue.get()
        if item is None:
            break
"#;

    #[test]
    fn functions_and_constructor_detection() {
        let elements = extract(PIPELINE);
        let functions = &elements["functions"];
        assert_eq!(functions.len(), 4);

        let init = functions
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "__init__" => Some(f),
                _ => None,
            })
            .unwrap();
        assert!(init.is_constructor);
        assert_eq!(init.return_type.as_deref(), Some("None"));
        assert_eq!(init.visibility, Visibility::Public);
        assert_eq!(init.parameters.len(), 2);
        assert_eq!(init.parameters[1].name, "size");
        assert_eq!(init.parameters[1].type_name.as_deref(), Some("int"));
    }

    #[test]
    fn static_decorator_and_docstring() {
        let elements = extract(PIPELINE);
        let parse = elements["functions"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "parse" => Some(f),
                _ => None,
            })
            .unwrap();
        assert!(parse.is_static);
        assert_eq!(parse.docstring.as_deref(), Some("Parse one raw record."));
        assert_eq!(parse.return_type.as_deref(), Some("dict"));
        assert_eq!(parse.annotations.len(), 1);
        assert_eq!(parse.annotations[0].name, "staticmethod");
        // 1 + the `if`.
        assert_eq!(parse.complexity_score, 2);
    }

    #[test]
    fn underscore_names_are_private() {
        let elements = extract(PIPELINE);
        let validate = elements["functions"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "_validate" => Some(f),
                _ => None,
            })
            .unwrap();
        assert_eq!(validate.visibility, Visibility::Private);
        // 1 + `and`.
        assert_eq!(validate.complexity_score, 2);
    }

    #[test]
    fn async_modifier_and_loop_complexity() {
        let elements = extract(PIPELINE);
        let drain = elements["functions"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "drain" => Some(f),
                _ => None,
            })
            .unwrap();
        assert!(drain.modifiers.contains(&"async".to_string()));
        // 1 + while + if.
        assert_eq!(drain.complexity_score, 3);
    }

    #[test]
    fn class_docstring_is_not_a_variable() {
        let elements = extract(PIPELINE);
        let classes = &elements["classes"];
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name(), "Processor");

        let variables = &elements["variables"];
        let names: Vec<_> = variables.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["RETRY_LIMIT", "default_batch"]);
    }

    #[test]
    fn constants_stay_unflagged_without_language_support() {
        let elements = extract(PIPELINE);
        let retry = elements["variables"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Variable(v) if v.common.name == "RETRY_LIMIT" => Some(v),
                _ => None,
            })
            .unwrap();
        assert!(!retry.is_constant);
        assert!(!retry.is_final);
    }

    #[test]
    fn import_forms_are_distinguished() {
        let elements = extract(PIPELINE);
        let imports = &elements["imports"];
        assert_eq!(imports.len(), 4);

        let aliased = imports
            .iter()
            .find_map(|e| match e {
                CodeElement::Import(i) if i.aliased_as.is_some() => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(aliased.module, "typing.Any");
        assert_eq!(aliased.aliased_as.as_deref(), Some("AnyType"));

        let wildcard = imports
            .iter()
            .find_map(|e| match e {
                CodeElement::Import(i) if i.is_wildcard => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(wildcard.module, "collections.*");
    }

    #[test]
    fn local_assignments_are_not_structural() {
        let elements = extract("def f():\n    x = 1\n");
        assert!(elements["variables"].is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let parsed = parse_source(PIPELINE.to_string(), "python", None).unwrap();
        let first = PythonPlugin.extract_elements(&parsed.tree, &parsed.source);
        let second = PythonPlugin.extract_elements(&parsed.tree, &parsed.source);
        assert_eq!(first, second);
    }
}
