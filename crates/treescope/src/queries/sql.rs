use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for SQL.
///
/// The grammar routinely emits ERROR nodes for vendor-specific stored
/// procedure syntax, so the `procedures` query matches those too instead of
/// silently dropping them.
pub(super) fn create_sql_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "tables",
        QueryEntry {
            pattern: "(create_table (object_reference name: (identifier))) @table",
            description: "CREATE TABLE statements",
        },
    );
    queries.insert(
        "views",
        QueryEntry {
            pattern: "[ (create_view) @view (create_materialized_view) @view ]",
            description: "CREATE VIEW statements, materialized or not",
        },
    );
    queries.insert(
        "functions",
        QueryEntry {
            pattern: "(create_function) @function",
            description: "CREATE FUNCTION statements",
        },
    );
    queries.insert(
        "procedures",
        QueryEntry {
            pattern: "[ (create_function) @procedure (ERROR) @procedure ]",
            description: "Stored routines, including dialect syntax the grammar cannot parse cleanly",
        },
    );

    LanguageQueries::new(queries)
}
