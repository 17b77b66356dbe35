//! Depth-limited iterative tree traversal and per-extraction caches.

use std::collections::HashMap;

use tree_sitter::Node;
use treescope_contracts::{AnnotationRef, CodeElement, Param};

use crate::limits::MAX_TRAVERSAL_DEPTH;

/// Visit every node reachable within the depth cap, pre-order, left to right.
///
/// An explicit stack keeps hostile inputs from exhausting the call stack; the
/// depth is carried per entry. Nodes past the cap are skipped with a single
/// warning for the whole walk.
pub fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>, usize)) {
    let mut stack: Vec<(Node<'t>, usize)> = vec![(root, 0)];
    let mut depth_warned = false;

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_TRAVERSAL_DEPTH {
            if !depth_warned {
                tracing::warn!(
                    max_depth = MAX_TRAVERSAL_DEPTH,
                    node_type = node.kind(),
                    "syntax tree exceeds traversal depth cap; deeper nodes skipped"
                );
                depth_warned = true;
            }
            continue;
        }

        visit(node, depth);

        // Reverse push so children pop in left-to-right order.
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push((child, depth + 1));
            }
        }
    }
}

/// A parsed declaration signature, cached per node.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub name: String,
    pub return_type: Option<String>,
    pub parameters: Vec<Param>,
    pub modifiers: Vec<String>,
    pub throws: Vec<String>,
    /// Line disambiguates overloads; consumers key on `(name, line)`.
    pub line: usize,
}

/// Short-lived caches owned by one `extract_elements` call.
///
/// Never hoisted to a long-lived object: that would need locking and would
/// leak entries across files.
#[derive(Default)]
pub struct ExtractionCaches {
    node_text: HashMap<usize, String>,
    elements: HashMap<(usize, &'static str), Vec<CodeElement>>,
    annotation_lines: Option<HashMap<usize, Vec<AnnotationRef>>>,
    signatures: HashMap<usize, Signature>,
}

impl ExtractionCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all caches; call at the start of each extraction.
    pub fn clear(&mut self) {
        self.node_text.clear();
        self.elements.clear();
        self.annotation_lines = None;
        self.signatures.clear();
    }

    /// Owned node text, cached by node id.
    pub fn node_text(&mut self, node: &Node, source: &str) -> String {
        self.node_text
            .entry(node.id())
            .or_insert_with(|| super::node_text(node, source).to_string())
            .clone()
    }

    pub fn cached_elements(&self, node: &Node, category: &'static str) -> Option<&Vec<CodeElement>> {
        self.elements.get(&(node.id(), category))
    }

    pub fn store_elements(
        &mut self,
        node: &Node,
        category: &'static str,
        elements: Vec<CodeElement>,
    ) -> Vec<CodeElement> {
        self.elements.insert((node.id(), category), elements.clone());
        elements
    }

    pub fn cached_signature(&self, node: &Node) -> Option<&Signature> {
        self.signatures.get(&node.id())
    }

    pub fn store_signature(&mut self, node: &Node, signature: Signature) -> Signature {
        self.signatures.insert(node.id(), signature.clone());
        signature
    }

    /// True once the annotation line index has been built.
    pub fn annotation_lines_primed(&self) -> bool {
        self.annotation_lines.is_some()
    }

    /// Install the line -> annotations index built by the plugin.
    pub fn prime_annotation_lines(&mut self, index: HashMap<usize, Vec<AnnotationRef>>) {
        self.annotation_lines = Some(index);
    }

    /// Annotations starting on `line`, if the index has been primed.
    pub fn annotations_on_line(&self, line: usize) -> Option<&[AnnotationRef]> {
        self.annotation_lines
            .as_ref()
            .map(|index| index.get(&line).map(Vec::as_slice).unwrap_or(&[]))
    }
}
