//! JavaScript extraction plugin.

use tree_sitter::{Node, Tree};
use treescope_contracts::{
    ClassElement, ClassKind, CodeElement, FunctionElement, ImportElement, Param, VariableElement,
    Visibility,
};

use super::walker::{walk, ExtractionCaches};
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct JavaScriptPlugin;

impl LanguagePlugin for JavaScriptPlugin {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs", "jsx"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert(
            "functions",
            [
                "function_declaration",
                "generator_function_declaration",
                "method_definition",
                "arrow_function",
            ]
            .into(),
        );
        m.insert("classes", ["class_declaration"].into());
        m.insert("fields", ["field_definition"].into());
        m.insert(
            "variables",
            ["lexical_declaration", "variable_declaration"].into(),
        );
        m.insert("imports", ["import_statement"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        JsExtractor::new(source, "javascript").run(tree)
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
            other => other,
        };
        extracted.get(category).cloned().unwrap_or_default()
    }
}

pub(super) struct JsExtractor<'a> {
    source: &'a str,
    language: &'static str,
    caches: ExtractionCaches,
}

impl<'a> JsExtractor<'a> {
    pub(super) fn new(source: &'a str, language: &'static str) -> Self {
        let mut caches = ExtractionCaches::new();
        caches.clear();
        JsExtractor {
            source,
            language,
            caches,
        }
    }

    pub(super) fn run(mut self, tree: &Tree) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["functions", "classes", "fields", "variables", "imports"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(element) = self.handle_named_function(&node) {
                    out.get_mut("functions").unwrap().push(element);
                }
            }
            "method_definition" => {
                if let Some(element) = self.handle_method(&node) {
                    out.get_mut("functions").unwrap().push(element);
                }
            }
            "variable_declarator" => {
                if let Some(element) = self.handle_declarator(&node) {
                    let bucket = if matches!(element, CodeElement::Function(_)) {
                        "functions"
                    } else {
                        "variables"
                    };
                    out.get_mut(bucket).unwrap().push(element);
                }
            }
            "class_declaration" => {
                if let Some(element) = self.handle_class(&node) {
                    out.get_mut("classes").unwrap().push(element);
                }
            }
            "field_definition" => {
                if let Some(element) = self.handle_field(&node) {
                    out.get_mut("fields").unwrap().push(element);
                }
            }
            "import_statement" => {
                out.get_mut("imports").unwrap().extend(self.handle_import(&node));
            }
            _ => {}
        });

        out
    }

    fn handle_named_function(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();
        Some(self.function_element(node, node, name, false))
    }

    fn handle_method(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();
        let is_constructor = name == "constructor";
        let mut element = self.function_element(node, node, name, is_constructor);
        if let CodeElement::Function(f) = &mut element {
            if name_node.kind() == "private_property_identifier" {
                f.visibility = Visibility::Private;
            }
            f.is_static = has_keyword_child(node, "static");
            if f.is_static {
                f.modifiers.push("static".to_string());
            }
            if is_constructor {
                f.return_type = Some("undefined".to_string());
            }
        }
        Some(element)
    }

    /// `const f = () => {}` and friends become functions; everything else is
    /// a top-level variable binding.
    fn handle_declarator(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.kind() != "identifier" {
            return None;
        }
        let name = node_text(&name_node, self.source).to_string();
        let declaration = node.parent()?;
        if !matches!(
            declaration.kind(),
            "lexical_declaration" | "variable_declaration"
        ) {
            return None;
        }

        if let Some(value) = node.child_by_field_name("value") {
            if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                return Some(self.function_element(node, &value, name, false));
            }
        }

        // Only top-level bindings are part of the structural view.
        if declaration.parent().map(|p| p.kind()) != Some("program") {
            return None;
        }

        let is_final = declaration
            .child(0)
            .map(|kw| kw.kind() == "const")
            .unwrap_or(false);
        let mut modifiers = Vec::new();
        if is_final {
            modifiers.push("const".to_string());
        }

        Some(CodeElement::Variable(VariableElement {
            common: element_common(node, self.source, self.language, name),
            variable_type: None,
            field_type: None,
            modifiers,
            visibility: Visibility::Public,
            is_static: false,
            is_final,
            // No static bindings at module scope, so never a constant.
            is_constant: false,
            annotations: Vec::new(),
            docstring: None,
        }))
    }

    fn function_element(
        &mut self,
        span_node: &Node,
        callable_node: &Node,
        name: String,
        is_constructor: bool,
    ) -> CodeElement {
        let parameters = self.parameters_of(callable_node);
        let mut modifiers = Vec::new();
        if has_keyword_child(callable_node, "async") || has_keyword_child(span_node, "async") {
            modifiers.push("async".to_string());
        }
        if callable_node.kind() == "generator_function_declaration" {
            modifiers.push("generator".to_string());
        }

        let body = callable_node.child_by_field_name("body");
        let complexity_score = body.map(|b| self.complexity_of(&b)).unwrap_or(1);
        let docstring = self.docstring_for(span_node);

        CodeElement::Function(FunctionElement {
            common: element_common(span_node, self.source, self.language, name),
            parameters,
            return_type: None,
            modifiers,
            visibility: Visibility::Public,
            is_constructor,
            is_static: false,
            is_abstract: false,
            is_final: false,
            throws: Vec::new(),
            complexity_score,
            docstring,
            annotations: Vec::new(),
        })
    }

    fn handle_class(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();

        let mut superclass = None;
        let mut cursor = node.walk();
        if let Some(heritage) = node
            .children(&mut cursor)
            .find(|c| c.kind() == "class_heritage")
        {
            let mut inner = heritage.walk();
            let first_child = heritage.named_children(&mut inner).next();
            if let Some(parent_expr) = first_child {
                superclass = Some(node_text(&parent_expr, self.source).to_string());
            }
        }

        let is_nested = self.has_class_ancestor(node);

        Some(CodeElement::Class(ClassElement {
            common: element_common(node, self.source, self.language, name.clone()),
            class_type: ClassKind::Class,
            superclass,
            interfaces: Vec::new(),
            modifiers: Vec::new(),
            visibility: Visibility::Public,
            is_nested,
            full_qualified_name: Some(name),
            package_name: None,
            annotations: Vec::new(),
        }))
    }

    fn handle_field(&mut self, node: &Node) -> Option<CodeElement> {
        let property = node.child_by_field_name("property")?;
        let name = node_text(&property, self.source).to_string();
        let is_static = has_keyword_child(node, "static");
        let visibility = if property.kind() == "private_property_identifier" {
            Visibility::Private
        } else {
            Visibility::Public
        };
        let mut modifiers = Vec::new();
        if is_static {
            modifiers.push("static".to_string());
        }

        Some(CodeElement::Variable(VariableElement {
            common: element_common(node, self.source, self.language, name),
            variable_type: None,
            field_type: None,
            modifiers,
            visibility,
            is_static,
            is_final: false,
            is_constant: false,
            annotations: Vec::new(),
            docstring: None,
        }))
    }

    fn handle_import(&mut self, node: &Node) -> Vec<CodeElement> {
        let module = node
            .child_by_field_name("source")
            .map(|s| strip_quotes(node_text(&s, self.source)))
            .unwrap_or_default();

        let mut elements = Vec::new();
        let mut cursor = node.walk();
        let clause = node
            .children(&mut cursor)
            .find(|c| c.kind() == "import_clause");

        let Some(clause) = clause else {
            // Side-effect import: `import "./polyfill";`
            elements.push(self.import_element(node, module, false, None, None));
            return elements;
        };

        let mut inner = clause.walk();
        for child in clause.named_children(&mut inner) {
            match child.kind() {
                "identifier" => {
                    let alias = node_text(&child, self.source).to_string();
                    elements.push(self.import_element(node, module.clone(), false, Some(alias), None));
                }
                "namespace_import" => {
                    let mut ns = child.walk();
                    let alias = child
                        .named_children(&mut ns)
                        .next()
                        .map(|n| node_text(&n, self.source).to_string());
                    elements.push(self.import_element(node, module.clone(), true, alias, None));
                }
                "named_imports" => {
                    let mut named = child.walk();
                    for spec in child.named_children(&mut named) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let symbol = spec
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, self.source).to_string())
                            .unwrap_or_default();
                        let alias = spec
                            .child_by_field_name("alias")
                            .map(|a| node_text(&a, self.source).to_string());
                        elements.push(self.import_element(
                            node,
                            module.clone(),
                            false,
                            alias,
                            Some(symbol),
                        ));
                    }
                }
                _ => {}
            }
        }
        if elements.is_empty() {
            elements.push(self.import_element(node, module, false, None, None));
        }
        elements
    }

    fn import_element(
        &mut self,
        node: &Node,
        module: String,
        is_wildcard: bool,
        aliased_as: Option<String>,
        symbol: Option<String>,
    ) -> CodeElement {
        let name = match &symbol {
            Some(sym) => format!("{module}.{sym}"),
            None => module.clone(),
        };
        CodeElement::Import(ImportElement {
            common: element_common(node, self.source, self.language, name.clone()),
            module: name,
            is_static: false,
            is_wildcard,
            aliased_as,
        })
    }

    pub(super) fn parameters_of(&mut self, node: &Node) -> Vec<Param> {
        let params_node = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"));
        let Some(params_node) = params_node else {
            return Vec::new();
        };
        if params_node.kind() == "identifier" {
            // Single-parameter arrow function without parentheses.
            return vec![Param {
                name: node_text(&params_node, self.source).to_string(),
                type_name: None,
            }];
        }
        let mut parameters = Vec::new();
        let mut cursor = params_node.walk();
        for param in params_node.named_children(&mut cursor) {
            match param.kind() {
                "identifier" | "rest_pattern" | "object_pattern" | "array_pattern" => {
                    parameters.push(Param {
                        name: node_text(&param, self.source).to_string(),
                        type_name: None,
                    });
                }
                "assignment_pattern" => {
                    let name = param
                        .child_by_field_name("left")
                        .map(|l| node_text(&l, self.source).to_string())
                        .unwrap_or_default();
                    parameters.push(Param {
                        name,
                        type_name: None,
                    });
                }
                "required_parameter" | "optional_parameter" => {
                    // TypeScript parameter wrappers share this extractor.
                    let name = param
                        .child_by_field_name("pattern")
                        .map(|p| node_text(&p, self.source).to_string())
                        .unwrap_or_default();
                    let type_name = param
                        .child_by_field_name("type")
                        .map(|t| strip_type_annotation(node_text(&t, self.source)));
                    parameters.push(Param { name, type_name });
                }
                _ => {}
            }
        }
        parameters
    }

    pub(super) fn complexity_of(&mut self, body: &Node) -> u32 {
        let mut score: u32 = 1;
        walk(*body, |node, _| match node.kind() {
            "if_statement" | "for_statement" | "for_in_statement" | "while_statement"
            | "do_statement" | "catch_clause" | "ternary_expression" => score += 1,
            "switch_case" => score += 1,
            "optional_chain" => score += 1,
            "binary_expression" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    if matches!(op.kind(), "&&" | "||" | "??") {
                        score += 1;
                    }
                }
            }
            _ => {}
        });
        score
    }

    pub(super) fn docstring_for(&mut self, node: &Node) -> Option<String> {
        let anchor = match node.parent() {
            // For declarators the comment precedes the whole declaration.
            Some(parent)
                if matches!(parent.kind(), "lexical_declaration" | "variable_declaration") =>
            {
                parent
            }
            _ => *node,
        };
        let prev = anchor.prev_sibling()?;
        if prev.kind() != "comment" {
            return None;
        }
        let text = self.caches.node_text(&prev, self.source);
        if !text.starts_with("/**") {
            return None;
        }
        let comment_end = prev.end_position().row + 1;
        let decl_start = anchor.start_position().row + 1;
        if comment_end + 1 != decl_start {
            return None;
        }
        Some(strip_block_comment(&text))
    }

    fn has_class_ancestor(&self, node: &Node) -> bool {
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if ancestor.kind() == "class_declaration" {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }
}

pub(super) fn has_keyword_child(node: &Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == keyword);
    result
}

pub(super) fn strip_quotes(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

pub(super) fn strip_type_annotation(text: &str) -> String {
    text.trim_start_matches(':').trim().to_string()
}

pub(super) fn strip_block_comment(comment: &str) -> String {
    comment
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
