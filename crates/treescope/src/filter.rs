//! Post-filtering of capture records by predicate expressions.
//!
//! Expressions are comma-separated predicates, conjoined with implicit AND:
//! `name=main`, `name=~get.*,public=true`, `line>100`. Predicates over
//! attributes a record does not have evaluate to false.

use once_cell::sync::Lazy;
use regex::Regex;
use treescope_contracts::CaptureRecord;

use crate::error::{Error, Result};

#[derive(Debug)]
enum Predicate {
    Eq { key: String, value: String },
    Ne { key: String, value: String },
    Matches { key: String, regex: Regex },
    NotMatches { key: String, regex: Regex },
    Gt { key: String, value: f64 },
    Lt { key: String, value: f64 },
    Bool { key: String, value: bool },
}

/// A parsed filter expression.
#[derive(Debug)]
pub struct ResultFilter {
    predicates: Vec<Predicate>,
}

impl ResultFilter {
    pub fn parse(expression: &str) -> Result<ResultFilter> {
        let mut predicates = Vec::new();
        for raw in expression.split(',') {
            let part = raw.trim();
            if part.is_empty() {
                continue;
            }
            predicates.push(parse_predicate(part)?);
        }
        if predicates.is_empty() {
            return Err(Error::invalid_argument("filter", "empty filter expression"));
        }
        Ok(ResultFilter { predicates })
    }

    /// True when every predicate holds for the record.
    pub fn matches(&self, record: &CaptureRecord) -> bool {
        self.predicates.iter().all(|p| evaluate(p, record))
    }

    pub fn apply(&self, records: Vec<CaptureRecord>) -> Vec<CaptureRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn parse_predicate(part: &str) -> Result<Predicate> {
    // Two-character operators must be tried before their one-character
    // prefixes.
    for (op, build) in OPERATORS {
        if let Some(idx) = part.find(op) {
            let key = part[..idx].trim().to_string();
            let value = part[idx + op.len()..].trim().to_string();
            if key.is_empty() || value.is_empty() {
                return Err(Error::invalid_argument(
                    "filter",
                    format!("malformed predicate '{part}'"),
                ));
            }
            return build(key, value);
        }
    }
    Err(Error::invalid_argument(
        "filter",
        format!("no operator in predicate '{part}'"),
    ))
}

type Builder = fn(String, String) -> Result<Predicate>;

const OPERATORS: [(&str, Builder); 6] = [
    ("!~", |key, value| {
        Ok(Predicate::NotMatches {
            key,
            regex: compile_regex(&value)?,
        })
    }),
    ("=~", |key, value| {
        Ok(Predicate::Matches {
            key,
            regex: compile_regex(&value)?,
        })
    }),
    ("!=", |key, value| Ok(Predicate::Ne { key, value })),
    (">", |key, value| {
        Ok(Predicate::Gt {
            key,
            value: parse_number(&value)?,
        })
    }),
    ("<", |key, value| {
        Ok(Predicate::Lt {
            key,
            value: parse_number(&value)?,
        })
    }),
    ("=", |key, value| match value.as_str() {
        "true" => Ok(Predicate::Bool { key, value: true }),
        "false" => Ok(Predicate::Bool { key, value: false }),
        _ => Ok(Predicate::Eq { key, value }),
    }),
];

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| Error::invalid_argument("filter", format!("bad regex '{pattern}': {err}")))
}

fn parse_number(value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| Error::invalid_argument("filter", format!("'{value}' is not a number")))
}

fn evaluate(predicate: &Predicate, record: &CaptureRecord) -> bool {
    match predicate {
        Predicate::Eq { key, value } => {
            string_attribute(record, key).is_some_and(|attr| attr == *value)
        }
        Predicate::Ne { key, value } => {
            string_attribute(record, key).is_some_and(|attr| attr != *value)
        }
        Predicate::Matches { key, regex } => {
            string_attribute(record, key).is_some_and(|attr| regex.is_match(&attr))
        }
        Predicate::NotMatches { key, regex } => {
            string_attribute(record, key).is_some_and(|attr| !regex.is_match(&attr))
        }
        Predicate::Gt { key, value } => {
            numeric_attribute(record, key).is_some_and(|n| n > *value)
        }
        Predicate::Lt { key, value } => {
            numeric_attribute(record, key).is_some_and(|n| n < *value)
        }
        Predicate::Bool { key, value } => {
            bool_attribute(record, key).is_some_and(|b| b == *value)
        }
    }
}

fn string_attribute(record: &CaptureRecord, key: &str) -> Option<String> {
    match key {
        "name" => derive_name(&record.content),
        "node_type" | "type" => Some(record.node_type.clone()),
        "capture_name" | "capture" => Some(record.capture_name.clone()),
        "visibility" => Some(derive_visibility(&record.content).to_string()),
        "content" => Some(record.content.clone()),
        _ => None,
    }
}

fn numeric_attribute(record: &CaptureRecord, key: &str) -> Option<f64> {
    match key {
        "line" | "start_line" => Some(record.start_line as f64),
        "end_line" => Some(record.end_line as f64),
        _ => None,
    }
}

fn bool_attribute(record: &CaptureRecord, key: &str) -> Option<bool> {
    match key {
        "static" | "final" | "abstract" | "public" | "private" | "protected" => {
            Some(has_modifier_word(&record.content, key))
        }
        _ => None,
    }
}

static DECLARATION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:class|interface|enum|trait|struct|def|function)\s+([A-Za-z_$][A-Za-z0-9_$]*)")
        .unwrap()
});

static CALLABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").unwrap());

const NAME_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "super", "assert", "synchronized",
];

/// Best-effort identifier recovery from a captured slice. A bare identifier
/// is its own name; declarations with a leading keyword win next; otherwise
/// the first call-shaped identifier that is not itself a keyword.
fn derive_name(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !trimmed.chars().next().unwrap().is_ascii_digit()
    {
        return Some(trimmed.to_string());
    }
    if let Some(caps) = DECLARATION_NAME.captures(content) {
        return Some(caps[1].to_string());
    }
    for caps in CALLABLE_NAME.captures_iter(content) {
        let candidate = &caps[1];
        if !NAME_KEYWORDS.contains(&candidate) {
            return Some(candidate.to_string());
        }
    }
    None
}

fn derive_visibility(content: &str) -> &'static str {
    let head = content.lines().next().unwrap_or(content);
    if has_modifier_word(head, "public") {
        "public"
    } else if has_modifier_word(head, "protected") {
        "protected"
    } else if has_modifier_word(head, "private") {
        "private"
    } else {
        "default"
    }
}

fn has_modifier_word(content: &str, word: &str) -> bool {
    content
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|token| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, line: usize) -> CaptureRecord {
        CaptureRecord {
            capture_name: "function".to_string(),
            node_type: "method_declaration".to_string(),
            start_line: line,
            end_line: line + 2,
            content: content.to_string(),
        }
    }

    #[test]
    fn exact_name_match() {
        let filter = ResultFilter::parse("name=createUser").unwrap();
        assert!(filter.matches(&record("public User createUser(String name) {", 10)));
        assert!(!filter.matches(&record("public User findById(long id) {", 14)));
    }

    #[test]
    fn regex_name_match() {
        let filter = ResultFilter::parse("name=~get.*").unwrap();
        assert!(filter.matches(&record("private String getName() {", 3)));
        assert!(!filter.matches(&record("private void setName(String n) {", 7)));
    }

    #[test]
    fn negated_regex() {
        let filter = ResultFilter::parse("name!~^set").unwrap();
        assert!(filter.matches(&record("String getName() {", 3)));
        assert!(!filter.matches(&record("void setName(String n) {", 7)));
    }

    #[test]
    fn conjunction_of_predicates() {
        let filter = ResultFilter::parse("name=~.*User,public=true").unwrap();
        assert!(filter.matches(&record("public void createUser() {", 5)));
        assert!(!filter.matches(&record("private void createUser() {", 5)));
    }

    #[test]
    fn numeric_comparisons_on_line() {
        let filter = ResultFilter::parse("line>10").unwrap();
        assert!(filter.matches(&record("void x() {", 11)));
        assert!(!filter.matches(&record("void x() {", 10)));

        let filter = ResultFilter::parse("line<5").unwrap();
        assert!(filter.matches(&record("void x() {", 4)));
    }

    #[test]
    fn boolean_modifier_predicates() {
        let filter = ResultFilter::parse("static=true").unwrap();
        assert!(filter.matches(&record("public static void main(String[] args) {", 1)));
        assert!(!filter.matches(&record("public void main(String[] args) {", 1)));

        let filter = ResultFilter::parse("static=false").unwrap();
        assert!(filter.matches(&record("public void run() {", 1)));
    }

    #[test]
    fn unknown_attribute_evaluates_false() {
        let filter = ResultFilter::parse("flavor=vanilla").unwrap();
        assert!(!filter.matches(&record("public void run() {", 1)));
    }

    #[test]
    fn visibility_attribute() {
        let filter = ResultFilter::parse("visibility=default").unwrap();
        assert!(filter.matches(&record("void run() {", 1)));
        assert!(!filter.matches(&record("public void run() {", 1)));
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(ResultFilter::parse("").is_err());
        assert!(ResultFilter::parse("name").is_err());
        assert!(ResultFilter::parse("=value").is_err());
        assert!(ResultFilter::parse("line>abc").is_err());
        assert!(ResultFilter::parse("name=~[").is_err());
    }

    #[test]
    fn keyword_call_shapes_are_skipped_for_names() {
        // `if (` must not be mistaken for the method name.
        let content = "void retry() { if (failed) { run(); } }";
        assert_eq!(derive_name(content).as_deref(), Some("retry"));
    }
}
