use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for Markdown (block grammar).
pub(super) fn create_markdown_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "headings",
        QueryEntry {
            pattern: "[ (atx_heading) @heading (setext_heading) @heading ]",
            description: "ATX and Setext headings",
        },
    );
    queries.insert(
        "code_blocks",
        QueryEntry {
            pattern: "[ (fenced_code_block) @code_block (indented_code_block) @code_block ]",
            description: "Fenced and indented code blocks",
        },
    );
    queries.insert(
        "links",
        QueryEntry {
            pattern: "(link_reference_definition) @link",
            description: "Link reference definitions",
        },
    );

    LanguageQueries::new(queries)
}
