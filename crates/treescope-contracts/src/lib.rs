//! Shared wire types for treescope surfaces (CLI, SDK, server fronts).
//!
//! Everything in this crate is plain data: serializable, schema-friendly, and
//! free of any parsing or process-spawning machinery. The core crate produces
//! these types; front-ends consume them.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Visibility of a declaration, normalized across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
    /// The language's implicit default (e.g. package-private in Java).
    Default,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
            Visibility::Default => "default",
        }
    }
}

/// The kind of type-like declaration a [`ClassElement`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Trait,
    Struct,
}

/// A single formal parameter of a function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Param {
    pub name: String,
    /// Declared type, if the language has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// An annotation or decorator attached to another element.
///
/// The name never carries the `@` / `#` sigil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Fields shared by every element variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ElementCommon {
    /// Source identifier; empty for anonymous constructs.
    pub name: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive; always >= start_line.
    pub end_line: usize,
    /// The original source slice, owned (never borrowed from a parse tree).
    pub raw_text: String,
    /// Lowercase canonical language tag.
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub parameters: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub modifiers: Vec<String>,
    pub visibility: Visibility,
    pub is_constructor: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Declared thrown types, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<String>,
    /// Decision-point count; always >= 1.
    pub complexity_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    pub class_type: ClassKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    pub modifiers: Vec<String>,
    pub visibility: Visibility,
    pub is_nested: bool,
    /// Package-qualified name, when a package is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    /// The construct this binding represents when the language has no plain
    /// variables (e.g. "heading" for Markdown, "rule" for CSS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    /// Declared field type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    pub modifiers: Vec<String>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    /// True only when the language supports constants and this binding is one
    /// (all-caps and final).
    pub is_constant: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImportElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    /// The imported module or symbol path.
    pub module: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliased_as: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PackageElement {
    #[serde(flatten)]
    pub common: ElementCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationElement {
    #[serde(flatten)]
    pub common: ElementCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// The uniform code element carried between extraction, query, and format
/// layers. Variants share [`ElementCommon`]; each carries its own payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CodeElement {
    Function(FunctionElement),
    Class(ClassElement),
    Variable(VariableElement),
    Import(ImportElement),
    Package(PackageElement),
    Annotation(AnnotationElement),
}

impl CodeElement {
    pub fn common(&self) -> &ElementCommon {
        match self {
            CodeElement::Function(e) => &e.common,
            CodeElement::Class(e) => &e.common,
            CodeElement::Variable(e) => &e.common,
            CodeElement::Import(e) => &e.common,
            CodeElement::Package(e) => &e.common,
            CodeElement::Annotation(e) => &e.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn start_line(&self) -> usize {
        self.common().start_line
    }

    pub fn end_line(&self) -> usize {
        self.common().end_line
    }

    /// Short label for the variant, used as a synthesized capture name.
    pub fn kind_label(&self) -> &'static str {
        match self {
            CodeElement::Function(_) => "function",
            CodeElement::Class(_) => "class",
            CodeElement::Variable(_) => "variable",
            CodeElement::Import(_) => "import",
            CodeElement::Package(_) => "package",
            CodeElement::Annotation(_) => "annotation",
        }
    }
}

/// One captured node from a query execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaptureRecord {
    /// The capture label from the query, or a name synthesized by the plugin
    /// fallback.
    pub capture_name: String,
    /// The parser's symbolic node type.
    pub node_type: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    /// Owned source slice at the node.
    pub content: String,
}

/// A single content-search match as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchMatch {
    pub file: String,
    /// 1-based line number.
    pub line: u64,
    /// The matching line with interior whitespace runs collapsed.
    pub text: String,
    /// Byte offsets `[start, end)` into `text` for each submatch.
    pub matches: Vec<[usize; 2]>,
}

/// The bundle returned by `analyze_file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub path: String,
    pub language: String,
    pub elements: Vec<CodeElement>,
    pub line_count: usize,
    pub encoding: String,
}

/// Metadata attached to search responses for silent recoveries and other
/// decisions the strategies made on the caller's behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchMeta {
    /// True when gitignore-interference detection enabled `--no-ignore`.
    #[serde(default)]
    pub auto_no_ignore: bool,
}

/// Standard match-list response (normal and path-optimized modes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchListResponse {
    pub success: bool,
    pub count: usize,
    pub truncated: bool,
    pub elapsed_ms: u64,
    pub results: Vec<SearchMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SearchMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_saved: Option<String>,
}

/// Per-file count response for `count_only_matches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CountOnlyResponse {
    pub success: bool,
    pub count_only: bool,
    pub total_matches: u64,
    pub file_counts: BTreeMap<String, u64>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SearchMeta>,
}

/// One file group in a grouped response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileGroup {
    pub file: String,
    pub matches: Vec<GroupedMatch>,
    pub match_count: usize,
}

/// A match inside a [`FileGroup`], with the file path factored out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupedMatch {
    pub line: u64,
    pub text: String,
    pub positions: Vec<[usize; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupedResponse {
    pub success: bool,
    pub count: usize,
    pub files: Vec<FileGroup>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SearchMeta>,
}

/// One entry in a summary's top-files list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileSummary {
    pub file: String,
    pub match_count: usize,
    pub sample_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchSummary {
    pub total_matches: usize,
    pub total_files: usize,
    pub summary: String,
    pub top_files: Vec<FileSummary>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResponse {
    pub success: bool,
    pub count: usize,
    pub truncated: bool,
    pub elapsed_ms: u64,
    pub summary: SearchSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SearchMeta>,
}

/// Minimal acknowledgment returned when `suppress_output` is combined with
/// `output_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuppressedResponse {
    pub success: bool,
    pub count: usize,
    pub output_file: String,
    pub file_saved: String,
}

/// The outcome of a content search: exactly one shape per output mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SearchOutcome {
    Total(u64),
    Counts(CountOnlyResponse),
    Grouped(GroupedResponse),
    Summary(SummaryResponse),
    Matches(MatchListResponse),
    Suppressed(SuppressedResponse),
}

impl SearchOutcome {
    /// Total number of matches represented by this outcome.
    pub fn total_matches(&self) -> u64 {
        match self {
            SearchOutcome::Total(n) => *n,
            SearchOutcome::Counts(r) => r.total_matches,
            SearchOutcome::Grouped(r) => r.count as u64,
            SearchOutcome::Summary(r) => r.count as u64,
            SearchOutcome::Matches(r) => r.count as u64,
            SearchOutcome::Suppressed(r) => r.count as u64,
        }
    }
}

/// File-listing response (fd wrapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListFilesResponse {
    pub success: bool,
    pub count: usize,
    pub files: Vec<String>,
    pub elapsed_ms: u64,
}

/// Count-only file-listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileCountResponse {
    pub success: bool,
    pub count_only: bool,
    pub total_count: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ListFilesOutcome {
    Files(ListFilesResponse),
    Count(FileCountResponse),
}

fn default_true() -> bool {
    true
}

/// The loosely-typed argument bag accepted by `search_content`.
///
/// Validation (ranges, enums, exclusivity, path bounds) happens in the core's
/// search validator, not here; serde only enforces shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchArguments {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub roots: Option<Vec<String>>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub case: Option<String>,
    #[serde(default)]
    pub fixed_strings: bool,
    #[serde(default)]
    pub word: bool,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub include_globs: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_globs: Option<Vec<String>>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub no_ignore: bool,
    #[serde(default)]
    pub max_filesize: Option<String>,
    #[serde(default)]
    pub context_before: Option<i64>,
    #[serde(default)]
    pub context_after: Option<i64>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub max_count: Option<i64>,
    #[serde(default)]
    pub timeout_ms: Option<i64>,
    #[serde(default)]
    pub total_only: bool,
    #[serde(default)]
    pub count_only_matches: bool,
    #[serde(default)]
    pub summary_only: bool,
    #[serde(default)]
    pub group_by_file: bool,
    #[serde(default)]
    pub optimize_paths: bool,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub suppress_output: bool,
    #[serde(default = "default_true")]
    pub enable_parallel: bool,
}

/// The loosely-typed argument bag accepted by `list_files`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListFilesArguments {
    #[serde(default)]
    pub roots: Option<Vec<String>>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub glob: bool,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub depth: Option<i64>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub no_ignore: bool,
    #[serde(default)]
    pub size: Option<Vec<String>>,
    #[serde(default)]
    pub changed_within: Option<String>,
    #[serde(default)]
    pub changed_before: Option<String>,
    #[serde(default)]
    pub full_path_match: bool,
    #[serde(default = "default_true")]
    pub absolute: bool,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub count_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_serializes_with_kind_tag() {
        let element = CodeElement::Package(PackageElement {
            common: ElementCommon {
                name: "com.example".to_string(),
                start_line: 1,
                end_line: 1,
                raw_text: "package com.example;".to_string(),
                language: "java".to_string(),
            },
        });
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["kind"], "package");
        assert_eq!(json["name"], "com.example");
    }

    #[test]
    fn search_arguments_default_to_parallel() {
        let args: SearchArguments = serde_json::from_str(r#"{"query": "TODO"}"#).unwrap();
        assert!(args.enable_parallel);
        assert!(!args.total_only);
    }

    #[test]
    fn search_arguments_reject_unknown_fields() {
        let result = serde_json::from_str::<SearchArguments>(r#"{"query": "x", "bogus": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn outcome_total_matches_is_consistent() {
        let outcome = SearchOutcome::Counts(CountOnlyResponse {
            success: true,
            count_only: true,
            total_matches: 8,
            file_counts: BTreeMap::new(),
            elapsed_ms: 3,
            meta: None,
        });
        assert_eq!(outcome.total_matches(), 8);
    }
}
