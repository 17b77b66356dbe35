//! Source parsing against the grammar registry.

use std::path::Path;

use tree_sitter::{Parser, Tree};

use crate::error::{Error, Result};
use crate::language;

/// A successfully parsed file: the tree, the grammar it was parsed with, and
/// the source text retained for slicing.
///
/// Slices handed to callers are always materialized as owned strings; nothing
/// outside this struct borrows from the tree's buffer.
#[derive(Debug)]
pub struct ParsedFile {
    pub tree: Tree,
    pub language: &'static tree_sitter::Language,
    pub language_tag: String,
    pub source: String,
}

impl ParsedFile {
    /// Owned text of a node, sliced out of the retained source.
    pub fn node_text(&self, node: &tree_sitter::Node) -> String {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
            .to_string()
    }
}

/// Parse `source` as `language_tag`. The optional path only flavors error
/// messages.
pub fn parse_source(
    source: String,
    language_tag: &str,
    path: Option<&Path>,
) -> Result<ParsedFile> {
    let tag = language_tag.to_lowercase();
    let handle = language::language_handle(&tag)?;

    let mut parser = Parser::new();
    parser
        .set_language(handle)
        .map_err(|err| Error::ParseFailed(format!("failed to set language '{tag}': {err}")))?;

    let tree = parser.parse(&source, None).ok_or_else(|| {
        let location = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        Error::ParseFailed(format!("tree-sitter produced no tree for {location}"))
    })?;

    Ok(ParsedFile {
        tree,
        language: handle,
        language_tag: tag,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_java_source() {
        let parsed = parse_source("class A {}".to_string(), "java", None).unwrap();
        assert_eq!(parsed.tree.root_node().kind(), "program");
        assert_eq!(parsed.language_tag, "java");
    }

    #[test]
    fn tag_is_case_insensitive() {
        let parsed = parse_source("x = 1".to_string(), "Python", None).unwrap();
        assert_eq!(parsed.language_tag, "python");
    }

    #[test]
    fn empty_source_parses_to_empty_root() {
        let parsed = parse_source(String::new(), "python", None).unwrap();
        assert_eq!(parsed.tree.root_node().child_count(), 0);
    }

    #[test]
    fn unknown_language_surfaces() {
        let err = parse_source("x".to_string(), "fortran", None).unwrap_err();
        assert!(matches!(err, Error::UnknownLanguage(_)));
    }

    #[test]
    fn node_text_is_owned_slice() {
        let parsed = parse_source("class Widget {}".to_string(), "java", None).unwrap();
        let root = parsed.tree.root_node();
        let class_node = root.child(0).unwrap();
        assert_eq!(parsed.node_text(&class_node), "class Widget {}");
    }
}
