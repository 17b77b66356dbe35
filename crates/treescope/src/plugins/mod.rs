//! Per-language extraction plugins.
//!
//! One plugin per grammar, registered once in a process-wide table of trait
//! objects. Each plugin knows how to walk a parsed tree and emit the uniform
//! element model; nothing outside a plugin hard-codes language syntax.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use tree_sitter::{Node, Tree};
use treescope_contracts::{CodeElement, ElementCommon};

pub mod walker;

mod css;
mod html;
mod java;
mod javascript;
mod markdown;
mod python;
mod sql;
mod typescript;

/// Category name -> node types belonging to it.
pub type CategoryMap = HashMap<&'static str, HashSet<&'static str>>;

/// Extraction output: category name -> elements in source order.
pub type ExtractedElements = BTreeMap<&'static str, Vec<CodeElement>>;

/// The capability every language plugin implements.
pub trait LanguagePlugin: Send + Sync {
    /// Lowercase canonical language tag.
    fn language(&self) -> &'static str;

    fn supported_extensions(&self) -> &'static [&'static str];

    /// Which node types feed which element category.
    fn element_categories(&self) -> CategoryMap;

    /// The hot path: walk the tree and produce the uniform element model.
    fn extract_elements(&self, tree: &Tree, source: &str) -> ExtractedElements;

    /// Query-service fallback: elements for a named query key.
    fn execute_query_strategy(&self, tree: &Tree, source: &str, query_key: &str)
        -> Vec<CodeElement>;
}

static REGISTRY: Lazy<HashMap<&'static str, Box<dyn LanguagePlugin>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Box<dyn LanguagePlugin>> = HashMap::new();
    m.insert("java", Box::new(java::JavaPlugin));
    m.insert("python", Box::new(python::PythonPlugin));
    m.insert("javascript", Box::new(javascript::JavaScriptPlugin));
    m.insert("typescript", Box::new(typescript::TypeScriptPlugin));
    m.insert("markdown", Box::new(markdown::MarkdownPlugin));
    m.insert("html", Box::new(html::HtmlPlugin));
    m.insert("css", Box::new(css::CssPlugin));
    m.insert("sql", Box::new(sql::SqlPlugin));
    m
});

/// Look up the plugin for a language tag.
pub fn get_plugin(language: &str) -> Option<&'static dyn LanguagePlugin> {
    REGISTRY.get(language).map(|b| b.as_ref())
}

/// All registered plugins, sorted by language tag.
pub fn list_plugins() -> Vec<&'static dyn LanguagePlugin> {
    let mut plugins: Vec<_> = REGISTRY.values().map(|b| b.as_ref()).collect();
    plugins.sort_by_key(|p| p.language());
    plugins
}

/// Build the shared header for an element at `node`.
pub(crate) fn element_common(node: &Node, source: &str, language: &str, name: String) -> ElementCommon {
    ElementCommon {
        name,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        raw_text: node_text(node, source).to_string(),
        language: language.to_string(),
    }
}

/// Borrowed source slice for a node; empty on out-of-range (malformed trees).
pub(crate) fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_language_has_a_plugin() {
        for tag in crate::language::supported_languages() {
            assert!(get_plugin(tag).is_some(), "no plugin for {tag}");
        }
    }

    #[test]
    fn plugin_extensions_round_trip_through_language_detection() {
        for plugin in list_plugins() {
            for ext in plugin.supported_extensions() {
                assert_eq!(
                    crate::language::language_for_extension(ext),
                    Some(plugin.language()),
                    "extension {ext} does not map back to {}",
                    plugin.language()
                );
            }
        }
    }

    #[test]
    fn categories_are_nonempty() {
        for plugin in list_plugins() {
            let categories = plugin.element_categories();
            assert!(!categories.is_empty(), "{} has no categories", plugin.language());
            for (category, node_types) in categories {
                assert!(!node_types.is_empty(), "{category} has no node types");
            }
        }
    }
}
