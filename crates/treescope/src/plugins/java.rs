//! Java extraction plugin.
//!
//! Covers the full extractor contract: signature parsing with overload
//! disambiguation, visibility and modifier analysis, complexity scoring,
//! javadoc attachment, annotation resolution (with a batched line index for
//! field-heavy classes), grouped field declarations, and nested-class
//! detection with package-qualified names.

use std::collections::HashMap;

use tree_sitter::{Node, Tree};
use treescope_contracts::{
    AnnotationElement, AnnotationRef, ClassElement, ClassKind, CodeElement, FunctionElement,
    ImportElement, PackageElement, Param, VariableElement, Visibility,
};

use super::walker::{walk, ExtractionCaches, Signature};
use super::{element_common, node_text, CategoryMap, ExtractedElements, LanguagePlugin};
use crate::limits::FIELD_BATCH_THRESHOLD;
use crate::queries::canonical_key;

const CLASS_NODE_TYPES: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
    "strictfp",
    "transient",
    "volatile",
    "default",
    "sealed",
];

pub struct JavaPlugin;

impl LanguagePlugin for JavaPlugin {
    fn language(&self) -> &'static str {
        "java"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn element_categories(&self) -> CategoryMap {
        let mut m = CategoryMap::new();
        m.insert(
            "functions",
            ["method_declaration", "constructor_declaration"].into(),
        );
        m.insert("classes", CLASS_NODE_TYPES.iter().copied().collect());
        m.insert("fields", ["field_declaration"].into());
        m.insert("imports", ["import_declaration"].into());
        m.insert("packages", ["package_declaration"].into());
        m.insert("annotations", ["marker_annotation", "annotation"].into());
        m
    }

    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements {
        JavaExtractor::new(source).run(tree)
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
        let mut elements = extracted.get(category).cloned().unwrap_or_default();
        if canonical_key(query_key) == "methods" {
            elements.retain(|e| match e {
                CodeElement::Function(f) => !f.is_constructor,
                _ => true,
            });
        }
        elements
    }
}

struct JavaExtractor<'a> {
    source: &'a str,
    caches: ExtractionCaches,
    package: Option<String>,
}

impl<'a> JavaExtractor<'a> {
    fn new(source: &'a str) -> Self {
        let mut caches = ExtractionCaches::new();
        caches.clear();
        JavaExtractor {
            source,
            caches,
            package: None,
        }
    }

    fn run(mut self, tree: &Tree) -> ExtractedElements {
        let root = tree.root_node();
        let mut out = ExtractedElements::new();
        for category in ["functions", "classes", "fields", "imports", "packages", "annotations"] {
            out.insert(category, Vec::new());
        }

        // The package name qualifies every class, so resolve it up front.
        self.package = self.find_package(root);

        walk(root, |node, _| match node.kind() {
            "package_declaration" => {
                if let Some(element) = self.handle_package(&node) {
                    out.get_mut("packages").unwrap().push(element);
                }
            }
            "import_declaration" => {
                if let Some(element) = self.handle_import(&node) {
                    out.get_mut("imports").unwrap().push(element);
                }
            }
            "class_declaration" | "interface_declaration" | "enum_declaration"
            | "record_declaration" => {
                self.maybe_prime_field_batch(&node);
                match self.handle_class(&node) {
                    Some(element) => out.get_mut("classes").unwrap().push(element),
                    None => tracing::warn!(
                        node_type = node.kind(),
                        line = node.start_position().row + 1,
                        "skipping malformed type declaration"
                    ),
                }
            }
            "method_declaration" | "constructor_declaration" => {
                match self.handle_function(&node) {
                    Some(element) => out.get_mut("functions").unwrap().push(element),
                    None => tracing::warn!(
                        line = node.start_position().row + 1,
                        "skipping malformed method declaration"
                    ),
                }
            }
            "field_declaration" => {
                let fields = self.handle_field(&node);
                out.get_mut("fields").unwrap().extend(fields);
            }
            "marker_annotation" | "annotation" => {
                if let Some(element) = self.handle_annotation(&node) {
                    out.get_mut("annotations").unwrap().push(element);
                }
            }
            _ => {}
        });

        out
    }

    fn find_package(&mut self, root: Node) -> Option<String> {
        let mut cursor = root.walk();
        let package = root
            .children(&mut cursor)
            .find(|child| child.kind() == "package_declaration")?;
        let mut inner = package.walk();
        let name_node = package
            .children(&mut inner)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
        Some(node_text(&name_node, self.source).to_string())
    }

    fn handle_package(&mut self, node: &Node) -> Option<CodeElement> {
        let mut cursor = node.walk();
        let name_node = node
            .children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?;
        let name = node_text(&name_node, self.source).to_string();
        Some(CodeElement::Package(PackageElement {
            common: element_common(node, self.source, "java", name),
        }))
    }

    fn handle_import(&mut self, node: &Node) -> Option<CodeElement> {
        let mut is_static = false;
        let mut is_wildcard = false;
        let mut module = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => is_wildcard = true,
                "scoped_identifier" | "identifier" => {
                    module = node_text(&child, self.source).to_string();
                }
                _ => {}
            }
        }
        if module.is_empty() {
            return None;
        }
        if is_wildcard {
            module.push_str(".*");
        }
        Some(CodeElement::Import(ImportElement {
            common: element_common(node, self.source, "java", module.clone()),
            module,
            is_static,
            is_wildcard,
            aliased_as: None,
        }))
    }

    fn handle_class(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();

        let class_type = match node.kind() {
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ => ClassKind::Class,
        };

        let modifiers = self.modifier_keywords(node);
        let visibility = visibility_from(&modifiers);
        let annotations = self.annotations_from_modifiers(node);

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|sc| sc.named_child(0))
            .map(|t| node_text(&t, self.source).to_string());

        let mut interfaces = Vec::new();
        if let Some(list) = node
            .child_by_field_name("interfaces")
            .and_then(|n| n.named_child(0))
        {
            let mut cursor = list.walk();
            for child in list.named_children(&mut cursor) {
                interfaces.push(node_text(&child, self.source).to_string());
            }
        }

        let enclosing = self.enclosing_class_names(node);
        let is_nested = !enclosing.is_empty();
        let mut qualified_parts: Vec<String> = Vec::new();
        if let Some(pkg) = &self.package {
            qualified_parts.push(pkg.clone());
        }
        qualified_parts.extend(enclosing);
        qualified_parts.push(name.clone());

        Some(CodeElement::Class(ClassElement {
            common: element_common(node, self.source, "java", name),
            class_type,
            superclass,
            interfaces,
            modifiers,
            visibility,
            is_nested,
            full_qualified_name: Some(qualified_parts.join(".")),
            package_name: self.package.clone(),
            annotations,
        }))
    }

    fn handle_function(&mut self, node: &Node) -> Option<CodeElement> {
        let signature = self.parse_signature(node)?;
        let is_constructor = node.kind() == "constructor_declaration";

        let visibility = visibility_from(&signature.modifiers);
        let is_static = signature.modifiers.iter().any(|m| m == "static");
        let is_abstract = signature.modifiers.iter().any(|m| m == "abstract");
        let is_final = signature.modifiers.iter().any(|m| m == "final");

        let return_type = if is_constructor {
            Some("void".to_string())
        } else {
            signature.return_type.clone()
        };

        let complexity_score = node
            .child_by_field_name("body")
            .map(|body| self.complexity_of(&body))
            .unwrap_or(1);

        let docstring = self.docstring_for(node);
        let annotations = self.annotations_from_modifiers(node);

        Some(CodeElement::Function(FunctionElement {
            common: element_common(node, self.source, "java", signature.name.clone()),
            parameters: signature.parameters.clone(),
            return_type,
            modifiers: signature.modifiers.clone(),
            visibility,
            is_constructor,
            is_static,
            is_abstract,
            is_final,
            throws: signature.throws.clone(),
            complexity_score,
            docstring,
            annotations,
        }))
    }

    /// One element per declarator, so `private String a, b, c;` yields three.
    fn handle_field(&mut self, node: &Node) -> Vec<CodeElement> {
        let Some(type_node) = node.child_by_field_name("type") else {
            tracing::warn!(
                line = node.start_position().row + 1,
                "skipping field declaration without a type"
            );
            return Vec::new();
        };
        let field_type = node_text(&type_node, self.source).to_string();

        let modifiers = self.modifier_keywords(node);
        let visibility = visibility_from(&modifiers);
        let is_static = modifiers.iter().any(|m| m == "static");
        let is_final = modifiers.iter().any(|m| m == "final");
        let annotations = self.field_annotations(node, &type_node);
        let docstring = self.docstring_for(node);

        let mut elements = Vec::new();
        let mut cursor = node.walk();
        for child in node.children_by_field_name("declarator", &mut cursor) {
            let Some(name_node) = child.child_by_field_name("name") else {
                continue;
            };
            let name = node_text(&name_node, self.source).to_string();
            let is_constant = is_final && is_static && is_screaming_case(&name);
            elements.push(CodeElement::Variable(VariableElement {
                common: element_common(node, self.source, "java", name),
                variable_type: Some(field_type.clone()),
                field_type: Some(field_type.clone()),
                modifiers: modifiers.clone(),
                visibility,
                is_static,
                is_final,
                is_constant,
                annotations: annotations.clone(),
                docstring: docstring.clone(),
            }));
        }
        elements
    }

    fn handle_annotation(&mut self, node: &Node) -> Option<CodeElement> {
        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();
        let arguments = node
            .child_by_field_name("arguments")
            .map(|args| node_text(&args, self.source).to_string());
        Some(CodeElement::Annotation(AnnotationElement {
            common: element_common(node, self.source, "java", name),
            arguments,
        }))
    }

    /// Parse and cache a method/constructor signature. Overloads are told
    /// apart downstream by the recorded line.
    fn parse_signature(&mut self, node: &Node) -> Option<Signature> {
        if let Some(cached) = self.caches.cached_signature(node) {
            return Some(cached.clone());
        }

        let name_node = node.child_by_field_name("name")?;
        let name = node_text(&name_node, self.source).to_string();
        let return_type = node
            .child_by_field_name("type")
            .map(|t| node_text(&t, self.source).to_string());

        let mut parameters = Vec::new();
        if let Some(params_node) = node.child_by_field_name("parameters") {
            let mut cursor = params_node.walk();
            for param in params_node.named_children(&mut cursor) {
                if !matches!(param.kind(), "formal_parameter" | "spread_parameter") {
                    continue;
                }
                let type_name = param
                    .child_by_field_name("type")
                    .map(|t| node_text(&t, self.source).to_string());
                let param_name = param
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, self.source).to_string())
                    .unwrap_or_default();
                parameters.push(Param {
                    name: param_name,
                    type_name,
                });
            }
        }

        let mut throws = Vec::new();
        let mut cursor = node.walk();
        if let Some(throws_node) = node.children(&mut cursor).find(|c| c.kind() == "throws") {
            let mut inner = throws_node.walk();
            for child in throws_node.named_children(&mut inner) {
                throws.push(node_text(&child, self.source).to_string());
            }
        }

        let signature = Signature {
            name,
            return_type,
            parameters,
            modifiers: self.modifier_keywords(node),
            throws,
            line: node.start_position().row + 1,
        };
        Some(self.caches.store_signature(node, signature))
    }

    /// Decision-point count: one, plus one per branch construct.
    fn complexity_of(&mut self, body: &Node) -> u32 {
        let mut score: u32 = 1;
        walk(*body, |node, _| match node.kind() {
            "if_statement" | "for_statement" | "enhanced_for_statement" | "while_statement"
            | "do_statement" | "catch_clause" | "ternary_expression" => score += 1,
            "switch_label" => {
                if node_text(&node, self.source).trim_start().starts_with("case") {
                    score += 1;
                }
            }
            "binary_expression" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    if matches!(op.kind(), "&&" | "||") {
                        score += 1;
                    }
                }
            }
            "catch_type" => {
                // Each extra type in a multi-catch is its own decision point.
                let mut cursor = node.walk();
                let pipes = node
                    .children(&mut cursor)
                    .filter(|c| c.kind() == "|")
                    .count();
                score += pipes as u32;
            }
            _ => {}
        });
        score
    }

    /// Javadoc attaches when the immediately preceding sibling is a block
    /// comment ending on the line above the declaration (annotations are part
    /// of the declaration's span, so they are skipped implicitly).
    fn docstring_for(&mut self, node: &Node) -> Option<String> {
        let prev = node.prev_sibling()?;
        if prev.kind() != "block_comment" {
            return None;
        }
        let comment_end = prev.end_position().row + 1;
        let decl_start = node.start_position().row + 1;
        if comment_end + 1 != decl_start {
            return None;
        }
        let text = self.caches.node_text(&prev, self.source);
        Some(strip_javadoc(&text))
    }

    fn modifier_keywords(&mut self, node: &Node) -> Vec<String> {
        let Some(modifiers) = self.modifiers_child(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = modifiers.walk();
        for child in modifiers.children(&mut cursor) {
            if MODIFIER_KEYWORDS.contains(&child.kind()) {
                out.push(child.kind().to_string());
            }
        }
        out
    }

    fn annotations_from_modifiers(&mut self, node: &Node) -> Vec<AnnotationRef> {
        let Some(modifiers) = self.modifiers_child(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = modifiers.walk();
        for child in modifiers.children(&mut cursor) {
            if matches!(child.kind(), "marker_annotation" | "annotation") {
                if let Some(annotation) = self.annotation_ref(&child) {
                    out.push(annotation);
                }
            }
        }
        out
    }

    /// Field annotation lookup. In batch mode the primed line index answers
    /// without rescanning modifiers per field.
    fn field_annotations(&mut self, node: &Node, type_node: &Node) -> Vec<AnnotationRef> {
        if self.caches.annotation_lines_primed() {
            let start = node.start_position().row + 1;
            let end = type_node.start_position().row + 1;
            let mut out = Vec::new();
            for line in start..=end {
                if let Some(annotations) = self.caches.annotations_on_line(line) {
                    out.extend(annotations.iter().cloned());
                }
            }
            out
        } else {
            self.annotations_from_modifiers(node)
        }
    }

    /// Switch to batch mode for field-heavy class bodies: build the line ->
    /// annotations index once so per-field lookups stop rescanning.
    fn maybe_prime_field_batch(&mut self, class_node: &Node) {
        if self.caches.annotation_lines_primed() {
            return;
        }
        let Some(body) = class_node.child_by_field_name("body") else {
            return;
        };
        let mut cursor = body.walk();
        let field_count = body
            .children(&mut cursor)
            .filter(|c| c.kind() == "field_declaration")
            .count();
        if field_count <= FIELD_BATCH_THRESHOLD {
            return;
        }

        let mut index: HashMap<usize, Vec<AnnotationRef>> = HashMap::new();
        walk(body, |node, _| {
            if matches!(node.kind(), "marker_annotation" | "annotation") {
                if let Some(annotation) = annotation_ref_from(&node, self.source) {
                    index
                        .entry(node.start_position().row + 1)
                        .or_default()
                        .push(annotation);
                }
            }
        });
        self.caches.prime_annotation_lines(index);
    }

    fn annotation_ref(&mut self, node: &Node) -> Option<AnnotationRef> {
        annotation_ref_from(node, self.source)
    }

    fn modifiers_child<'t>(&self, node: &Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let result = node.children(&mut cursor).find(|c| c.kind() == "modifiers");
        result
    }

    fn enclosing_class_names(&mut self, node: &Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if CLASS_NODE_TYPES.contains(&ancestor.kind()) {
                if let Some(name_node) = ancestor.child_by_field_name("name") {
                    names.push(node_text(&name_node, self.source).to_string());
                }
            }
            current = ancestor.parent();
        }
        names.reverse();
        names
    }
}

fn annotation_ref_from(node: &Node, source: &str) -> Option<AnnotationRef> {
    let name_node = node.child_by_field_name("name")?;
    let arguments = node
        .child_by_field_name("arguments")
        .map(|args| node_text(&args, source).to_string());
    Some(AnnotationRef {
        name: node_text(&name_node, source).to_string(),
        arguments,
    })
}

fn visibility_from(modifiers: &[String]) -> Visibility {
    if modifiers.iter().any(|m| m == "public") {
        Visibility::Public
    } else if modifiers.iter().any(|m| m == "protected") {
        Visibility::Protected
    } else if modifiers.iter().any(|m| m == "private") {
        Visibility::Private
    } else {
        Visibility::Package
    }
}

fn is_screaming_case(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn strip_javadoc(comment: &str) -> String {
    let inner = comment
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");
    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn extract(source: &str) -> ExtractedElements {
        let parsed = parse_source(source.to_string(), "java", None).unwrap();
        JavaPlugin.extract_elements(&parsed.tree, &parsed.source)
    }

    const USER_SERVICE: &str = r#"package com.example.service;

import java.util.List;
import static java.util.Objects.requireNonNull;
import java.util.concurrent.*;

/**
 * Looks up and persists users.
 */
public class UserService {

    private static final int MAX_RETRIES = 3;
    private String table, index;

    @Deprecated
    public UserService() {
        this.table = "users";
    }

    /**
     * Finds a user by id.
     */
    public User findById(long id) throws NotFoundException {
        if (id <= 0) {
            throw new NotFoundException();
        }
        return repository.find(id);
    }

    protected User createUser(String name, int age) {
        return new User(name, age);
    }

    boolean validateUser(User user) {
        return user != null && user.age() > 0 || user.isAdmin();
    }

    static class Builder {
    }
}
"#;

    #[test]
    fn extracts_expected_function_set() {
        let elements = extract(USER_SERVICE);
        let functions = &elements["functions"];
        assert_eq!(functions.len(), 4);

        let constructors: Vec<_> = functions
            .iter()
            .filter_map(|e| match e {
                CodeElement::Function(f) if f.is_constructor => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(constructors.len(), 1);
        assert_eq!(constructors[0].common.name, "UserService");
        assert_eq!(constructors[0].return_type.as_deref(), Some("void"));

        let mut names: Vec<_> = functions
            .iter()
            .filter_map(|e| match e {
                CodeElement::Function(f) if !f.is_constructor => Some(f.common.name.clone()),
                _ => None,
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["createUser", "findById", "validateUser"]);
    }

    #[test]
    fn signature_details_are_parsed() {
        let elements = extract(USER_SERVICE);
        let find_by_id = elements["functions"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "findById" => Some(f),
                _ => None,
            })
            .unwrap();

        assert_eq!(find_by_id.return_type.as_deref(), Some("User"));
        assert_eq!(find_by_id.parameters.len(), 1);
        assert_eq!(find_by_id.parameters[0].name, "id");
        assert_eq!(find_by_id.parameters[0].type_name.as_deref(), Some("long"));
        assert_eq!(find_by_id.throws, vec!["NotFoundException"]);
        assert_eq!(find_by_id.visibility, Visibility::Public);
        assert_eq!(find_by_id.docstring.as_deref(), Some("Finds a user by id."));
        // One base point plus the `if`.
        assert_eq!(find_by_id.complexity_score, 2);
    }

    #[test]
    fn package_default_visibility_and_boolean_complexity() {
        let elements = extract(USER_SERVICE);
        let validate = elements["functions"]
            .iter()
            .find_map(|e| match e {
                CodeElement::Function(f) if f.common.name == "validateUser" => Some(f),
                _ => None,
            })
            .unwrap();
        assert_eq!(validate.visibility, Visibility::Package);
        // 1 + `&&` + `||`.
        assert_eq!(validate.complexity_score, 3);
    }

    #[test]
    fn grouped_field_declaration_yields_one_element_per_declarator() {
        let elements = extract(USER_SERVICE);
        let fields = &elements["fields"];
        let names: Vec<_> = fields.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["MAX_RETRIES", "table", "index"]);

        let constant = fields
            .iter()
            .find_map(|e| match e {
                CodeElement::Variable(v) if v.common.name == "MAX_RETRIES" => Some(v),
                _ => None,
            })
            .unwrap();
        assert!(constant.is_constant);
        assert!(constant.is_static);
        assert!(constant.is_final);
        assert_eq!(constant.field_type.as_deref(), Some("int"));
    }

    #[test]
    fn imports_carry_static_and_wildcard_flags() {
        let elements = extract(USER_SERVICE);
        let imports = &elements["imports"];
        assert_eq!(imports.len(), 3);

        let static_import = imports
            .iter()
            .find_map(|e| match e {
                CodeElement::Import(i) if i.is_static => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(static_import.module, "java.util.Objects.requireNonNull");

        let wildcard = imports
            .iter()
            .find_map(|e| match e {
                CodeElement::Import(i) if i.is_wildcard => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(wildcard.module, "java.util.concurrent.*");
    }

    #[test]
    fn nested_class_is_flagged_and_qualified() {
        let elements = extract(USER_SERVICE);
        let classes = &elements["classes"];
        assert_eq!(classes.len(), 2);

        let builder = classes
            .iter()
            .find_map(|e| match e {
                CodeElement::Class(c) if c.common.name == "Builder" => Some(c),
                _ => None,
            })
            .unwrap();
        assert!(builder.is_nested);
        assert_eq!(
            builder.full_qualified_name.as_deref(),
            Some("com.example.service.UserService.Builder")
        );

        let service = classes
            .iter()
            .find_map(|e| match e {
                CodeElement::Class(c) if c.common.name == "UserService" => Some(c),
                _ => None,
            })
            .unwrap();
        assert!(!service.is_nested);
        assert_eq!(
            service.full_qualified_name.as_deref(),
            Some("com.example.service.UserService")
        );
        assert_eq!(service.package_name.as_deref(), Some("com.example.service"));
    }

    #[test]
    fn package_element_has_dotted_name() {
        let elements = extract(USER_SERVICE);
        let packages = &elements["packages"];
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "com.example.service");
    }

    #[test]
    fn annotations_lose_their_sigil() {
        let elements = extract(USER_SERVICE);
        let annotations = &elements["annotations"];
        assert!(annotations.iter().any(|e| e.name() == "Deprecated"));
        for annotation in annotations {
            assert!(!annotation.name().starts_with('@'));
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let parsed = parse_source(USER_SERVICE.to_string(), "java", None).unwrap();
        let first = JavaPlugin.extract_elements(&parsed.tree, &parsed.source);
        let second = JavaPlugin.extract_elements(&parsed.tree, &parsed.source);
        assert_eq!(first, second);
    }

    #[test]
    fn line_ranges_stay_inside_the_file() {
        let elements = extract(USER_SERVICE);
        let total_lines = USER_SERVICE.lines().count();
        for bucket in elements.values() {
            for element in bucket {
                let common = element.common();
                assert!(common.start_line >= 1);
                assert!(common.start_line <= common.end_line);
                assert!(common.end_line <= total_lines);
            }
        }
    }

    #[test]
    fn empty_source_yields_empty_categories() {
        let elements = extract("");
        for bucket in elements.values() {
            assert!(bucket.is_empty());
        }
    }

    #[test]
    fn batch_mode_matches_direct_annotation_resolution() {
        // Twelve annotated fields push the class into batch mode; the results
        // must be indistinguishable from the per-field path.
        let mut body = String::new();
        for i in 0..12 {
            body.push_str(&format!("    @Column\n    private String field{i};\n"));
        }
        let source = format!("public class Wide {{\n{body}}}\n");

        let elements = extract(&source);
        let fields = &elements["fields"];
        assert_eq!(fields.len(), 12);
        for field in fields {
            match field {
                CodeElement::Variable(v) => {
                    assert_eq!(v.annotations.len(), 1, "field {}", v.common.name);
                    assert_eq!(v.annotations[0].name, "Column");
                }
                other => panic!("unexpected element {other:?}"),
            }
        }
    }

    #[test]
    fn methods_strategy_excludes_constructors() {
        let parsed = parse_source(USER_SERVICE.to_string(), "java", None).unwrap();
        let methods = JavaPlugin.execute_query_strategy(&parsed.tree, &parsed.source, "methods");
        assert_eq!(methods.len(), 3);
        let functions =
            JavaPlugin.execute_query_strategy(&parsed.tree, &parsed.source, "functions");
        assert_eq!(functions.len(), 4);
    }
}
