//! TypeScript extraction plugin.
//!
//! Shares the JavaScript plugin's helpers where the grammars agree and adds
//! the TS-only surfaces: interfaces, enums, accessibility modifiers, typed
//! fields, and decorators.

use tree_sitter::{Node, Tree};
use treescope_contracts::{
    AnnotationElement, AnnotationRef, ClassElement, ClassKind, CodeElement, FunctionElement,
    ImportElement, VariableElement, Visibility,
};

use super::javascript::{has_keyword_child, strip_quotes, strip_type_annotation, JsExtractor};
use super::walker::walk;
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::queries::canonical_key;

pub struct TypeScriptPlugin;

impl LanguagePlugin for TypeScriptPlugin {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert(
            "functions",
            [
                "function_declaration",
                "method_definition",
                "arrow_function",
            ]
            .into(),
        );
        m.insert(
            "classes",
            [
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
            ]
            .into(),
        );
        m.insert(
            "fields",
            ["public_field_definition", "property_signature"].into(),
        );
        m.insert("imports", ["import_statement"].into());
        m.insert("annotations", ["decorator"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        TsExtractor::new(source).run(tree)
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
            "variables" => "fields",
            other => other,
        };
        extracted.get(category).cloned().unwrap_or_default()
    }
}

struct TsExtractor<'a> {
    source: &'a str,
}

impl<'a> TsExtractor<'a> {
    fn new(source: &'a str) -> Self {
        TsExtractor { source }
    }

    fn run(mut self, tree: &Tree) -> ExtractedElements {
        let mut out = ExtractedElements::new();
        for category in ["functions", "classes", "fields", "imports", "annotations"] {
            out.insert(category, Vec::new());
        }

        walk(tree.root_node(), |node, _| match node.kind() {
            "function_declaration" | "method_definition" => {
                if let Some(element) = self.handle_function(&node) {
                    out.get_mut("functions").unwrap().push(element);
                }
            }
            "variable_declarator" => {
                if let Some(element) = self.handle_arrow_binding(&node) {
                    out.get_mut("functions").unwrap().push(element);
                }
            }
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                match self.handle_type_declaration(&node) {
                    Some(element) => out.get_mut("classes").unwrap().push(element),
                    None => tracing::warn!(
                        node_type = node.kind(),
                        line = node.start_position().row + 1,
                        "skipping malformed type declaration"
                    ),
                }
            }
            "public_field_definition" | "property_signature" => {
                if let Some(element) = self.handle_field(&node) {
                    out.get_mut("fields").unwrap().push(element);
                }
            }
            "import_statement" => {
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
        let is_constructor = name == "constructor";

        let mut js = JsExtractor::new(self.source, "typescript");
        let parameters = js.parameters_of(node);
        let docstring = js.docstring_for(node);
        let body = node.child_by_field_name("body");
        let complexity_score = body.map(|b| js.complexity_of(&b)).unwrap_or(1);

        let return_type = if is_constructor {
            Some("undefined".to_string())
        } else {
            node.child_by_field_name("return_type")
                .map(|t| strip_type_annotation(node_text(&t, self.source)))
        };

        let visibility = self.accessibility_of(node);
        let is_static = has_keyword_child(node, "static");
        let is_abstract = has_keyword_child(node, "abstract");

        let mut modifiers = Vec::new();
        if has_keyword_child(node, "async") {
            modifiers.push("async".to_string());
        }
        if is_static {
            modifiers.push("static".to_string());
        }
        if is_abstract {
            modifiers.push("abstract".to_string());
        }

        Some(CodeElement::Function(FunctionElement {
            common: element_common(node, self.source, "typescript", name),
            parameters,
            return_type,
            modifiers,
            visibility,
            is_constructor,
            is_static,
            is_abstract,
            is_final: false,
            throws: Vec::new(),
            complexity_score,
            docstring,
            annotations: self.decorators_before(node),
        }))
    }

    fn handle_arrow_binding(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.kind() != "identifier" {
            return None;
        }
        let value = node.child_by_field_name("value")?;
        if !matches!(value.kind(), "arrow_function" | "function_expression") {
            return None;
        }
        let name = node_text(&name_node, self.source).to_string();

        let mut js = JsExtractor::new(self.source, "typescript");
        let parameters = js.parameters_of(&value);
        let docstring = js.docstring_for(node);
        let complexity_score = value
            .child_by_field_name("body")
            .map(|b| js.complexity_of(&b))
            .unwrap_or(1);

        let mut modifiers = Vec::new();
        if has_keyword_child(&value, "async") {
            modifiers.push("async".to_string());
        }

        Some(CodeElement::Function(FunctionElement {
            common: element_common(node, self.source, "typescript", name),
            parameters,
            return_type: value
                .child_by_field_name("return_type")
                .map(|t| strip_type_annotation(node_text(&t, self.source))),
            modifiers,
            visibility: Visibility::Public,
            is_constructor: false,
            is_static: false,
            is_abstract: false,
            is_final: false,
            throws: Vec::new(),
            complexity_score,
            docstring,
            annotations: Vec::new(),
        }))
    }

    fn handle_type_declaration(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();

        let class_type = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            _ => ClassKind::Class,
        };

        let mut superclass = None;
        let mut interfaces = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_heritage" => {
                    let mut inner = child.walk();
                    for clause in child.children(&mut inner) {
                        match clause.kind() {
                            "extends_clause" => {
                                let mut c = clause.walk();
                                let first_child = clause.named_children(&mut c).next();
                                if let Some(base) = first_child {
                                    superclass =
                                        Some(node_text(&base, self.source).to_string());
                                }
                            }
                            "implements_clause" => {
                                let mut c = clause.walk();
                                for ty in clause.named_children(&mut c) {
                                    interfaces.push(node_text(&ty, self.source).to_string());
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "extends_type_clause" | "extends_clause" => {
                    // Interface inheritance.
                    let mut c = child.walk();
                    for ty in child.named_children(&mut c) {
                        interfaces.push(node_text(&ty, self.source).to_string());
                    }
                }
                _ => {}
            }
        }

        let mut modifiers = Vec::new();
        if has_keyword_child(node, "abstract") {
            modifiers.push("abstract".to_string());
        }

        Some(CodeElement::Class(ClassElement {
            common: element_common(node, self.source, "typescript", name.clone()),
            class_type,
            superclass,
            interfaces,
            modifiers,
            visibility: Visibility::Public,
            is_nested: self.has_type_ancestor(node),
            full_qualified_name: Some(name),
            package_name: None,
            annotations: self.decorators_before(node),
        }))
    }

    fn handle_field(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();
        let field_type = node
            .child_by_field_name("type")
            .map(|t| strip_type_annotation(node_text(&t, self.source)));

        let is_static = has_keyword_child(node, "static");
        let is_final = has_keyword_child(node, "readonly");
        let visibility = self.accessibility_of(node);

        let mut modifiers = Vec::new();
        if is_static {
            modifiers.push("static".to_string());
        }
        if is_final {
            modifiers.push("readonly".to_string());
        }

        let is_constant = is_static && is_final && is_screaming_case(&name);

        Some(CodeElement::Variable(VariableElement {
            common: element_common(node, self.source, "typescript", name),
            variable_type: field_type.clone(),
            field_type,
            modifiers,
            visibility,
            is_static,
            is_final,
            is_constant,
            annotations: self.decorators_before(node),
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
        if let Some(clause) = node
            .children(&mut cursor)
            .find(|c| c.kind() == "import_clause")
        {
            let mut inner = clause.walk();
            for child in clause.named_children(&mut inner) {
                match child.kind() {
                    "identifier" => {
                        elements.push(self.import_element(
                            node,
                            module.clone(),
                            false,
                            Some(node_text(&child, self.source).to_string()),
                        ));
                    }
                    "namespace_import" => {
                        let mut ns = child.walk();
                        let alias = child
                            .named_children(&mut ns)
                            .next()
                            .map(|n| node_text(&n, self.source).to_string());
                        elements.push(self.import_element(node, module.clone(), true, alias));
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
                                format!("{module}.{symbol}"),
                                false,
                                alias,
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
        if elements.is_empty() {
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
            common: element_common(node, self.source, "typescript", module.clone()),
            module,
            is_static: false,
            is_wildcard,
            aliased_as,
        })
    }

    fn handle_decorator(&mut self, node: &Node) -> Option<CodeElement> {
        let reference = decorator_ref(node, self.source)?;
        Some(CodeElement::Annotation(AnnotationElement {
            common: element_common(node, self.source, "typescript", reference.name.clone()),
            arguments: reference.arguments,
        }))
    }

    /// Decorators attach as leading children of the declaration node, or (for
    /// some member positions) as preceding siblings; check both.
    fn decorators_before(&mut self, node: &Node) -> Vec<AnnotationRef> {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "decorator" {
                if let Some(reference) = decorator_ref(&child, self.source) {
                    decorators.push(reference);
                }
            }
        }
        if !decorators.is_empty() {
            return decorators;
        }

        let mut prev = node.prev_sibling();
        while let Some(sibling) = prev {
            if sibling.kind() != "decorator" {
                break;
            }
            if let Some(reference) = decorator_ref(&sibling, self.source) {
                decorators.push(reference);
            }
            prev = sibling.prev_sibling();
        }
        decorators.reverse();
        decorators
    }

    fn accessibility_of(&mut self, node: &Node) -> Visibility {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "accessibility_modifier" {
                return match node_text(&child, self.source) {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                };
            }
        }
        Visibility::Public
    }

    fn has_type_ancestor(&self, node: &Node) -> bool {
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if matches!(
                ancestor.kind(),
                "class_declaration" | "interface_declaration" | "enum_declaration"
            ) {
                return true;
            }
            current = ancestor.parent();
        }
        false
    }
}

fn decorator_ref(node: &Node, source: &str) -> Option<AnnotationRef> {
    let expr = node.named_child(0)?;
    match expr.kind() {
        "call_expression" => {
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

fn is_screaming_case(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
