//! Process-wide grammar registry.
//!
//! Language handles are loaded once, on first use, and shared read-only for
//! the lifetime of the process. Everything downstream (parser, query
//! compiler, plugins) borrows from here.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use tree_sitter::Language;

use crate::error::{Error, Result};

static LANGUAGES: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("java", Language::from(tree_sitter_java::LANGUAGE));
    m.insert("python", Language::from(tree_sitter_python::LANGUAGE));
    m.insert("javascript", Language::from(tree_sitter_javascript::LANGUAGE));
    m.insert(
        "typescript",
        Language::from(tree_sitter_typescript::LANGUAGE_TYPESCRIPT),
    );
    m.insert("markdown", Language::from(tree_sitter_md::LANGUAGE));
    m.insert("html", Language::from(tree_sitter_html::LANGUAGE));
    m.insert("css", Language::from(tree_sitter_css::LANGUAGE));
    m.insert("sql", Language::from(tree_sitter_sequel::LANGUAGE));
    m
});

static EXTENSIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("java", "java");
    m.insert("py", "python");
    m.insert("pyi", "python");
    m.insert("js", "javascript");
    m.insert("mjs", "javascript");
    m.insert("cjs", "javascript");
    m.insert("jsx", "javascript");
    m.insert("ts", "typescript");
    m.insert("tsx", "typescript");
    m.insert("md", "markdown");
    m.insert("markdown", "markdown");
    m.insert("html", "html");
    m.insert("htm", "html");
    m.insert("css", "css");
    m.insert("sql", "sql");
    m
});

/// Look up the grammar handle for a lowercase language tag.
pub fn language_handle(tag: &str) -> Result<&'static Language> {
    LANGUAGES
        .get(tag)
        .ok_or_else(|| Error::UnknownLanguage(tag.to_string()))
}

/// True if the tag names a supported grammar.
pub fn is_supported(tag: &str) -> bool {
    LANGUAGES.contains_key(tag)
}

/// All supported language tags, sorted.
pub fn supported_languages() -> Vec<&'static str> {
    let mut tags: Vec<_> = LANGUAGES.keys().copied().collect();
    tags.sort_unstable();
    tags
}

/// Infer the language tag from a file extension.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    EXTENSIONS.get(ext.to_lowercase().as_str()).copied()
}

/// Infer the language tag from a path, by extension.
pub fn detect_language(path: &Path) -> Result<&'static str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(language_for_extension)
        .ok_or_else(|| Error::UnknownLanguage(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn known_tags_resolve() {
        for tag in ["java", "python", "javascript", "typescript", "markdown", "html", "css", "sql"]
        {
            assert!(language_handle(tag).is_ok(), "missing grammar for {tag}");
        }
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert!(matches!(
            language_handle("cobol"),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn extensions_map_to_tags() {
        assert_eq!(language_for_extension("java"), Some("java"));
        assert_eq!(language_for_extension("TSX"), Some("typescript"));
        assert_eq!(language_for_extension("exe"), None);
    }

    #[test]
    fn detect_language_uses_extension() {
        assert_eq!(detect_language(&PathBuf::from("a/b/Main.java")).unwrap(), "java");
        assert!(detect_language(&PathBuf::from("README")).is_err());
    }
}
