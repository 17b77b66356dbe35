//! Named tree-sitter queries, per language.
//!
//! Each language module contributes a table of `key -> (pattern, description)`
//! entries. Keys are plural (`functions`, `classes`); singular aliases resolve
//! to the same entry.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

mod css;
mod html;
mod java;
mod javascript;
mod markdown;
mod python;
mod sql;
mod typescript;

/// A named query: the tree-sitter pattern plus a one-line description.
#[derive(Debug)]
pub struct QueryEntry {
    pub pattern: &'static str,
    pub description: &'static str,
}

pub struct LanguageQueries {
    queries: HashMap<&'static str, QueryEntry>,
}

impl LanguageQueries {
    pub(super) fn new(queries: HashMap<&'static str, QueryEntry>) -> Self {
        LanguageQueries { queries }
    }

    fn get(&self, key: &str) -> Option<&QueryEntry> {
        self.queries.get(key)
    }
}

static TABLES: Lazy<HashMap<&'static str, LanguageQueries>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("java", java::create_java_queries());
    m.insert("python", python::create_python_queries());
    m.insert("javascript", javascript::create_javascript_queries());
    m.insert("typescript", typescript::create_typescript_queries());
    m.insert("markdown", markdown::create_markdown_queries());
    m.insert("html", html::create_html_queries());
    m.insert("css", css::create_css_queries());
    m.insert("sql", sql::create_sql_queries());
    m
});

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("function", "functions");
    m.insert("method", "methods");
    m.insert("class", "classes");
    m.insert("field", "fields");
    m.insert("import", "imports");
    m.insert("package", "packages");
    m.insert("annotation", "annotations");
    m.insert("variable", "variables");
    m.insert("heading", "headings");
    m.insert("code_block", "code_blocks");
    m.insert("link", "links");
    m.insert("element", "elements");
    m.insert("script", "scripts");
    m.insert("style", "styles");
    m.insert("rule", "rules");
    m.insert("at_rule", "at_rules");
    m.insert("declaration", "declarations");
    m.insert("table", "tables");
    m.insert("view", "views");
    m.insert("procedure", "procedures");
    m
});

/// Resolve singular aliases to the canonical plural key.
pub fn canonical_key(key: &str) -> &str {
    ALIASES.get(key).copied().unwrap_or(key)
}

/// Inverse of [`canonical_key`]: the singular form of a query key.
pub fn singular_key(key: &str) -> &str {
    if ALIASES.contains_key(key) {
        return key;
    }
    ALIASES
        .iter()
        .find(|(_, plural)| **plural == key)
        .map(|(singular, _)| *singular)
        .unwrap_or(key)
}

/// Look up a named query for a language.
pub fn get_query(language: &str, key: &str) -> Result<&'static QueryEntry> {
    let table = TABLES
        .get(language)
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))?;
    table.get(canonical_key(key)).ok_or_else(|| Error::QueryNotFound {
        language: language.to_string(),
        key: key.to_string(),
    })
}

/// List available query keys with descriptions, sorted by key.
pub fn list_queries(language: &str) -> Result<Vec<(&'static str, &'static str)>> {
    let table = TABLES
        .get(language)
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))?;
    let mut entries: Vec<_> = table
        .queries
        .iter()
        .map(|(key, entry)| (*key, entry.description))
        .collect();
    entries.sort_by_key(|(key, _)| *key);
    Ok(entries)
}

/// Description for a single query key, if it exists.
pub fn describe_query(language: &str, key: &str) -> Option<&'static str> {
    get_query(language, key).ok().map(|entry| entry.description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_and_plural_resolve_to_same_entry() {
        let plural = get_query("java", "functions").unwrap();
        let singular = get_query("java", "function").unwrap();
        assert_eq!(plural.pattern, singular.pattern);

        let methods = get_query("java", "methods").unwrap();
        let method = get_query("java", "method").unwrap();
        assert_eq!(methods.pattern, method.pattern);
    }

    #[test]
    fn singular_key_inverts_canonical_key() {
        assert_eq!(singular_key("classes"), "class");
        assert_eq!(singular_key("functions"), "function");
        assert_eq!(singular_key("class"), "class");
        assert_eq!(singular_key("unmapped"), "unmapped");
    }

    #[test]
    fn missing_key_yields_query_not_found() {
        let err = get_query("java", "widgets").unwrap_err();
        assert!(matches!(err, Error::QueryNotFound { .. }));
    }

    #[test]
    fn unknown_language_yields_unknown_language() {
        assert!(matches!(
            get_query("cobol", "functions"),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn every_language_lists_queries() {
        for language in crate::language::supported_languages() {
            let queries = list_queries(language).unwrap();
            assert!(!queries.is_empty(), "{language} has no queries");
            for (_, description) in queries {
                assert!(!description.is_empty());
            }
        }
    }

    #[test]
    fn all_query_patterns_compile() {
        for language in crate::language::supported_languages() {
            let handle = crate::language::language_handle(language).unwrap();
            for (key, _) in list_queries(language).unwrap() {
                let entry = get_query(language, key).unwrap();
                tree_sitter::Query::new(handle, entry.pattern)
                    .unwrap_or_else(|err| panic!("{language}/{key} does not compile: {err}"));
            }
        }
    }
}
