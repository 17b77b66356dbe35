use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for CSS.
pub(super) fn create_css_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "rules",
        QueryEntry {
            pattern: "(rule_set) @rule",
            description: "Style rule sets",
        },
    );
    queries.insert(
        "imports",
        QueryEntry {
            pattern: "(import_statement) @import",
            description: "@import statements",
        },
    );
    queries.insert(
        "at_rules",
        QueryEntry {
            pattern: "[ (media_statement) @at_rule (keyframes_statement) @at_rule (supports_statement) @at_rule (charset_statement) @at_rule (namespace_statement) @at_rule (at_rule) @at_rule ]",
            description: "Conditional, keyframes, and other at-rules",
        },
    );
    queries.insert(
        "declarations",
        QueryEntry {
            pattern: "(declaration) @declaration",
            description: "Property declarations",
        },
    );

    LanguageQueries::new(queries)
}
