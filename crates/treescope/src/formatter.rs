//! Pluggable element formatters.
//!
//! Formatters are pure: elements in, string out. The core never picks one on
//! its own; callers name one (`full`, `compact`, `csv`, `json`, `toon`) or
//! inject their own implementation.

use serde_json::Value;
use treescope_contracts::{CodeElement, Param};

/// The formatter capability. Implementations must be pure functions of their
/// input.
pub trait Formatter: Send + Sync {
    fn format(&self, elements: &[CodeElement]) -> String;
}

/// Resolve a formatter by name.
pub fn formatter_for(name: &str) -> Option<Box<dyn Formatter>> {
    match name {
        "full" => Some(Box::new(FullFormatter)),
        "compact" => Some(Box::new(CompactFormatter)),
        "csv" => Some(Box::new(CsvFormatter)),
        "json" => Some(Box::new(JsonFormatter)),
        "toon" => Some(Box::new(ToonFormatter)),
        _ => None,
    }
}

/// Names accepted by [`formatter_for`].
pub fn formatter_names() -> &'static [&'static str] {
    &["full", "compact", "csv", "json", "toon"]
}

/// Render an arbitrary JSON value in the named format (`json` or `toon`).
/// Used for response serialization when writing output files.
pub fn render_json_value(format: &str, value: &Value) -> String {
    match format {
        "toon" => render_toon(value, 0),
        _ => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, elements: &[CodeElement]) -> String {
        serde_json::to_string_pretty(elements).unwrap_or_default()
    }
}

pub struct CompactFormatter;

impl Formatter for CompactFormatter {
    fn format(&self, elements: &[CodeElement]) -> String {
        elements
            .iter()
            .map(|element| {
                let common = element.common();
                format!(
                    "{:<10} {} L{}-{}",
                    element.kind_label(),
                    common.name,
                    common.start_line,
                    common.end_line
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, elements: &[CodeElement]) -> String {
        let mut lines = vec!["kind,name,start_line,end_line,visibility,parameters".to_string()];
        for element in elements {
            let common = element.common();
            let (visibility, parameters) = match element {
                CodeElement::Function(f) => {
                    (f.visibility.as_str(), csv_parameters(&f.parameters))
                }
                CodeElement::Class(c) => (c.visibility.as_str(), String::new()),
                CodeElement::Variable(v) => (v.visibility.as_str(), String::new()),
                _ => ("", String::new()),
            };
            lines.push(format!(
                "{},{},{},{},{},{}",
                element.kind_label(),
                csv_escape(&common.name),
                common.start_line,
                common.end_line,
                visibility,
                csv_escape(&parameters)
            ));
        }
        lines.join("\n")
    }
}

// CSV convention: `name:type;name:type`.
fn csv_parameters(parameters: &[Param]) -> String {
    parameters
        .iter()
        .map(|p| match &p.type_name {
            Some(t) => format!("{}:{}", p.name, t),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub struct FullFormatter;

impl Formatter for FullFormatter {
    fn format(&self, elements: &[CodeElement]) -> String {
        let mut lines = vec![
            "| Kind | Name | Lines | Signature |".to_string(),
            "|------|------|-------|-----------|".to_string(),
        ];
        for element in elements {
            let common = element.common();
            let signature = match element {
                CodeElement::Function(f) => {
                    // Markdown convention: `type name` per parameter.
                    let params = f
                        .parameters
                        .iter()
                        .map(|p| match &p.type_name {
                            Some(t) => format!("{t} {}", p.name),
                            None => p.name.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    let ret = f.return_type.as_deref().unwrap_or("");
                    format!("{ret} {}({params})", common.name).trim().to_string()
                }
                CodeElement::Class(c) => format!("{:?}", c.class_type).to_lowercase(),
                CodeElement::Variable(v) => v.field_type.clone().unwrap_or_default(),
                CodeElement::Import(i) => i.module.clone(),
                _ => String::new(),
            };
            lines.push(format!(
                "| {} | {} | {}-{} | {} |",
                element.kind_label(),
                common.name,
                common.start_line,
                common.end_line,
                signature.replace('|', "\\|")
            ));
        }
        lines.join("\n")
    }
}

pub struct ToonFormatter;

impl Formatter for ToonFormatter {
    fn format(&self, elements: &[CodeElement]) -> String {
        let value = serde_json::to_value(elements).unwrap_or(Value::Null);
        render_toon(&value, 0)
    }
}

/// Token-lean rendering: indentation instead of braces, tabular arrays when
/// every row is a flat object with the same keys.
fn render_toon(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, val)| match val {
                Value::Object(_) | Value::Array(_) if !is_scalar_array(val) => {
                    format!("{pad}{key}:\n{}", render_toon(val, indent + 1))
                }
                _ => format!("{pad}{key}: {}", render_scalar(val)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Array(items) => {
            if let Some(keys) = uniform_object_keys(items) {
                let mut lines = vec![format!("{pad}[{}]{{{}}}", items.len(), keys.join(","))];
                for item in items {
                    let row = keys
                        .iter()
                        .map(|k| render_scalar(item.get(k.as_str()).unwrap_or(&Value::Null)))
                        .collect::<Vec<_>>()
                        .join(",");
                    lines.push(format!("{pad}  {row}"));
                }
                lines.join("\n")
            } else {
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(_) | Value::Array(_) => {
                            format!("{pad}-\n{}", render_toon(item, indent + 1))
                        }
                        _ => format!("{pad}- {}", render_scalar(item)),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        scalar => format!("{pad}{}", render_scalar(scalar)),
    }
}

fn is_scalar_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().all(|i| !i.is_object() && !i.is_array()))
}

fn uniform_object_keys(items: &[Value]) -> Option<Vec<String>> {
    if items.is_empty() {
        return None;
    }
    let first = items.first()?.as_object()?;
    if first.values().any(|v| v.is_object() || v.is_array()) {
        return None;
    }
    let keys: Vec<String> = first.keys().cloned().collect();
    for item in items {
        let object = item.as_object()?;
        if object.keys().cloned().collect::<Vec<_>>() != keys {
            return None;
        }
        if object.values().any(|v| v.is_object() || v.is_array()) {
            return None;
        }
    }
    Some(keys)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treescope_contracts::{ElementCommon, FunctionElement, Visibility};

    fn sample_function() -> CodeElement {
        CodeElement::Function(FunctionElement {
            common: ElementCommon {
                name: "findById".to_string(),
                start_line: 10,
                end_line: 14,
                raw_text: "public User findById(long id) {}".to_string(),
                language: "java".to_string(),
            },
            parameters: vec![Param {
                name: "id".to_string(),
                type_name: Some("long".to_string()),
            }],
            return_type: Some("User".to_string()),
            modifiers: vec!["public".to_string()],
            visibility: Visibility::Public,
            is_constructor: false,
            is_static: false,
            is_abstract: false,
            is_final: false,
            throws: Vec::new(),
            complexity_score: 1,
            docstring: None,
            annotations: Vec::new(),
        })
    }

    #[test]
    fn known_names_resolve() {
        for name in formatter_names() {
            assert!(formatter_for(name).is_some(), "missing formatter {name}");
        }
        assert!(formatter_for("xml").is_none());
    }

    #[test]
    fn csv_uses_name_colon_type_parameters() {
        let output = CsvFormatter.format(&[sample_function()]);
        assert!(output.contains("id:long"));
        assert!(output.lines().next().unwrap().starts_with("kind,name"));
    }

    #[test]
    fn full_uses_type_space_name_parameters() {
        let output = FullFormatter.format(&[sample_function()]);
        assert!(output.contains("long id"));
        assert!(output.contains("| function | findById |"));
    }

    #[test]
    fn json_round_trips() {
        let output = JsonFormatter.format(&[sample_function()]);
        let parsed: Vec<CodeElement> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name(), "findById");
    }

    #[test]
    fn compact_is_one_line_per_element() {
        let output = CompactFormatter.format(&[sample_function()]);
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("L10-14"));
    }

    #[test]
    fn toon_tabulates_uniform_rows() {
        let value = serde_json::json!({
            "count": 2,
            "results": [
                {"file": "a.rs", "line": 1},
                {"file": "b.rs", "line": 2},
            ],
        });
        let rendered = render_json_value("toon", &value);
        assert!(rendered.contains("count: 2"));
        assert!(rendered.contains("[2]{file,line}"));
        assert!(rendered.contains("a.rs,1"));
    }

    #[test]
    fn formatters_are_pure() {
        let elements = [sample_function()];
        assert_eq!(
            CompactFormatter.format(&elements),
            CompactFormatter.format(&elements)
        );
    }
}
