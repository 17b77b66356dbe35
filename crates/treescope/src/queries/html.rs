use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for HTML.
pub(super) fn create_html_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "elements",
        QueryEntry {
            pattern: "(element) @element",
            description: "Document elements",
        },
    );
    queries.insert(
        "scripts",
        QueryEntry {
            pattern: "(script_element) @script",
            description: "Inline and external script elements",
        },
    );
    queries.insert(
        "styles",
        QueryEntry {
            pattern: "(style_element) @style",
            description: "Inline style elements",
        },
    );

    LanguageQueries::new(queries)
}
