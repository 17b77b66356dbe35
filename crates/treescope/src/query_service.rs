//! Query execution over parsed files.
//!
//! Runs a named or ad-hoc tree-sitter query against one file and returns
//! capture records. When the native query engine comes back empty or fails to
//! compile, the service falls back to the language plugin, and as a last
//! resort to a bare category walk, so callers still get structural answers on
//! grammars whose node names have drifted.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};
use treescope_contracts::CaptureRecord;

use crate::encoding::read_file_safe;
use crate::error::{Error, Result};
use crate::filter::ResultFilter;
use crate::parser::{parse_source, ParsedFile};
use crate::plugins;
use crate::queries;

/// Execute a query against `path`.
///
/// Exactly one of `query_key` and `query_string` must be provided. Results
/// are in tree pre-order; `filter` applies predicate post-filtering.
pub fn execute_query(
    path: &Path,
    language: &str,
    query_key: Option<&str>,
    query_string: Option<&str>,
    filter: Option<&str>,
) -> Result<Vec<CaptureRecord>> {
    match (query_key, query_string) {
        (None, None) => {
            return Err(Error::InvalidQueryRequest(
                "either query_key or query_string is required".to_string(),
            ))
        }
        (Some(_), Some(_)) => {
            return Err(Error::InvalidQueryRequest(
                "query_key and query_string are mutually exclusive".to_string(),
            ))
        }
        _ => {}
    }

    let language = language.to_lowercase();
    if !crate::language::is_supported(&language) {
        return Err(Error::UnknownLanguage(language));
    }

    let (text, _encoding) = read_file_safe(path)?;
    let parsed = parse_source(text, &language, Some(path))?;

    let pattern: String = match query_key {
        Some(key) => queries::get_query(&language, key)?.pattern.to_string(),
        None => query_string.unwrap_or_default().to_string(),
    };

    let records = match run_native_query(&parsed, &pattern) {
        Ok(records) if !records.is_empty() => records,
        Ok(_) => {
            tracing::debug!(language, "native query yielded nothing; using plugin fallback");
            plugin_fallback(&parsed, &language, query_key)?
        }
        Err(err) => {
            tracing::warn!(
                language,
                error = %err,
                "query compilation failed; using plugin fallback"
            );
            plugin_fallback_or(&parsed, &language, query_key, err)?
        }
    };

    match filter {
        Some(expression) => {
            let filter = ResultFilter::parse(expression)?;
            Ok(filter.apply(records))
        }
        None => Ok(records),
    }
}

/// Available query keys for a language, with descriptions.
pub fn available_queries(language: &str) -> Result<Vec<(&'static str, &'static str)>> {
    queries::list_queries(language)
}

/// Description of one query key, if present.
pub fn query_description(language: &str, key: &str) -> Option<&'static str> {
    queries::describe_query(language, key)
}

fn run_native_query(parsed: &ParsedFile, pattern: &str) -> Result<Vec<CaptureRecord>> {
    let query = Query::new(parsed.language, pattern)
        .map_err(|err| Error::QueryCompileFailed(err.to_string()))?;

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, parsed.tree.root_node(), parsed.source.as_bytes());

    let capture_names = query.capture_names();
    let mut records = Vec::new();
    while let Some(matched) = matches.next() {
        for capture in matched.captures {
            let node = capture.node;
            records.push(CaptureRecord {
                capture_name: capture_names[capture.index as usize].to_string(),
                node_type: node.kind().to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                content: parsed.node_text(&node),
            });
        }
    }
    Ok(records)
}

/// Plugin fallback; if no plugin is registered the original error surfaces.
fn plugin_fallback_or(
    parsed: &ParsedFile,
    language: &str,
    query_key: Option<&str>,
    original: Error,
) -> Result<Vec<CaptureRecord>> {
    if plugins::get_plugin(language).is_none() {
        return Err(original);
    }
    plugin_fallback(parsed, language, query_key)
}

fn plugin_fallback(
    parsed: &ParsedFile,
    language: &str,
    query_key: Option<&str>,
) -> Result<Vec<CaptureRecord>> {
    let key = query_key.unwrap_or("functions");

    let Some(plugin) = plugins::get_plugin(language) else {
        tracing::warn!(language, "no plugin registered; using basic node-type walk");
        return Ok(basic_walk(parsed, key));
    };

    let elements = plugin.execute_query_strategy(&parsed.tree, &parsed.source, key);
    if !elements.is_empty() {
        return Ok(elements
            .into_iter()
            .map(|element| {
                let common = element.common();
                CaptureRecord {
                    capture_name: queries::canonical_key(key).to_string(),
                    node_type: element.kind_label().to_string(),
                    start_line: common.start_line,
                    end_line: common.end_line,
                    content: common.raw_text.clone(),
                }
            })
            .collect());
    }

    // Second stage: match raw node types from the plugin's category table.
    let categories = plugin.element_categories();
    if let Some(node_types) = categories.get(queries::canonical_key(key)) {
        let mut records = Vec::new();
        crate::plugins::walker::walk(parsed.tree.root_node(), |node, _| {
            if node_types.contains(node.kind()) {
                records.push(capture_from_node(parsed, &node, key));
            }
        });
        if !records.is_empty() {
            return Ok(records);
        }
    }

    Ok(basic_walk(parsed, key))
}

/// Last-resort walk: substring-match the query key against node kinds.
fn basic_walk(parsed: &ParsedFile, key: &str) -> Vec<CaptureRecord> {
    let needle = queries::singular_key(queries::canonical_key(key)).to_string();
    let mut records = Vec::new();
    crate::plugins::walker::walk(parsed.tree.root_node(), |node, _| {
        if !needle.is_empty() && node.kind().contains(&needle) {
            records.push(capture_from_node(parsed, &node, key));
        }
    });
    records
}

fn capture_from_node(parsed: &ParsedFile, node: &Node, key: &str) -> CaptureRecord {
    CaptureRecord {
        capture_name: queries::canonical_key(key).to_string(),
        node_type: node.kind().to_string(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        content: parsed.node_text(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn requires_exactly_one_query_source() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "A.java", "class A {}");

        let neither = execute_query(&path, "java", None, None, None);
        assert!(matches!(neither, Err(Error::InvalidQueryRequest(_))));

        let both = execute_query(&path, "java", Some("functions"), Some("(x) @x"), None);
        assert!(matches!(both, Err(Error::InvalidQueryRequest(_))));
    }

    #[test]
    fn named_query_returns_native_captures() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "Svc.java",
            "class Svc { void a() {} void b() {} }",
        );
        let records = execute_query(&path, "java", Some("functions"), None, None).unwrap();
        assert_eq!(records.len(), 2);
        // Native captures carry grammar node types, proving the plugin
        // fallback was not consulted.
        assert!(records.iter().all(|r| r.node_type == "method_declaration"));
        assert!(records[0].content.contains("void a()"));
        assert!(records[1].content.contains("void b()"));
    }

    #[test]
    fn singular_alias_resolves() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "Svc.java", "class Svc { void a() {} }");
        let singular = execute_query(&path, "java", Some("function"), None, None).unwrap();
        let plural = execute_query(&path, "java", Some("functions"), None, None).unwrap();
        assert_eq!(singular, plural);
    }

    #[test]
    fn ad_hoc_query_string_works() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "Svc.java", "class Svc {}");
        let records = execute_query(
            &path,
            "java",
            None,
            Some("(class_declaration name: (identifier) @name)"),
            None,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].capture_name, "name");
        assert_eq!(records[0].content, "Svc");
    }

    #[test]
    fn unknown_key_is_query_not_found() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "Svc.java", "class Svc {}");
        let err = execute_query(&path, "java", Some("gadgets"), None, None).unwrap_err();
        assert!(matches!(err, Error::QueryNotFound { .. }));
    }

    #[test]
    fn unknown_language_is_rejected_before_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.xyz");
        let err = execute_query(&path, "xyz", Some("functions"), None, None).unwrap_err();
        assert!(matches!(err, Error::UnknownLanguage(_)));
    }

    #[test]
    fn bad_query_string_falls_back_to_plugin() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "Svc.java", "class Svc { void a() {} }");
        // Node type that does not exist in the grammar: compile fails, plugin
        // fallback answers with extracted functions.
        let records = execute_query(
            &path,
            "java",
            None,
            Some("(no_such_node_kind) @x"),
            None,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node_type, "function");
    }

    #[test]
    fn filter_applies_to_results() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "Svc.java",
            "class Svc { void findById() {} void createUser() {} }",
        );
        let records = execute_query(
            &path,
            "java",
            Some("functions"),
            None,
            Some("name=~create.*"),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].content.contains("createUser"));
    }

    #[test]
    fn zero_byte_file_returns_empty() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "Empty.java", "");
        let records = execute_query(&path, "java", Some("functions"), None, None).unwrap();
        assert!(records.is_empty());
    }
}
