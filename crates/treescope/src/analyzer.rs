//! File-level structural analysis.

use std::path::Path;

use treescope_contracts::{AnalysisResult, CodeElement};

use crate::encoding::read_file_safe;
use crate::error::{Error, Result};
use crate::language;
use crate::parser::parse_source;
use crate::plugins;

/// Analyze one file and return its uniform element view.
///
/// When `language` is not given it is inferred from the file extension.
pub fn analyze_file(path: &Path, language: Option<&str>) -> Result<AnalysisResult> {
    let language = match language {
        Some(tag) => {
            let tag = tag.to_lowercase();
            if !crate::language::is_supported(&tag) {
                return Err(Error::UnknownLanguage(tag));
            }
            tag
        }
        None => language::detect_language(path)?.to_string(),
    };

    let (text, encoding) = read_file_safe(path)?;
    let line_count = text.lines().count();
    let parsed = parse_source(text, &language, Some(path))?;

    let plugin = plugins::get_plugin(&language)
        .ok_or_else(|| Error::UnknownLanguage(language.clone()))?;
    let extracted = plugin.extract_elements(&parsed.tree, &parsed.source);

    // Flatten categories back into one source-ordered list.
    let mut elements: Vec<CodeElement> = extracted.into_values().flatten().collect();
    elements.sort_by_key(|e| (e.start_line(), e.end_line()));

    Ok(AnalysisResult {
        path: path.display().to_string(),
        language,
        elements,
        line_count,
        encoding: encoding.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn analyzes_java_file_with_detected_language() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Point.java");
        fs::write(&path, "class Point { int x; int y; }\n").unwrap();

        let result = analyze_file(&path, None).unwrap();
        assert_eq!(result.language, "java");
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.line_count, 1);
        assert!(result.elements.iter().any(|e| e.name() == "Point"));
        assert!(result.elements.iter().any(|e| e.name() == "x"));
    }

    #[test]
    fn elements_are_in_source_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mod.py");
        fs::write(&path, "import os\n\nclass A:\n    pass\n\ndef later():\n    pass\n").unwrap();

        let result = analyze_file(&path, None).unwrap();
        let lines: Vec<_> = result.elements.iter().map(|e| e.start_line()).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn explicit_language_overrides_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippet.txt");
        fs::write(&path, "def f():\n    pass\n").unwrap();

        let result = analyze_file(&path, Some("python")).unwrap();
        assert_eq!(result.language, "python");
        assert!(result.elements.iter().any(|e| e.name() == "f"));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            analyze_file(&path, None),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = analyze_file(&dir.path().join("Gone.java"), None).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
