use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for JavaScript.
pub(super) fn create_javascript_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "functions",
        QueryEntry {
            // Arrow functions only count when bound to a name.
            pattern: "[ (function_declaration) @function (generator_function_declaration) @function (variable_declarator value: (arrow_function) @function) (method_definition) @function ]",
            description: "Function declarations, named arrow functions, and methods",
        },
    );
    queries.insert(
        "methods",
        QueryEntry {
            pattern: "(method_definition) @method",
            description: "Class method definitions",
        },
    );
    queries.insert(
        "classes",
        QueryEntry {
            pattern: "(class_declaration) @class",
            description: "Class declarations",
        },
    );
    queries.insert(
        "fields",
        QueryEntry {
            pattern: "(field_definition property: (property_identifier) @field)",
            description: "Class field definitions",
        },
    );
    queries.insert(
        "imports",
        QueryEntry {
            pattern: "(import_statement) @import",
            description: "ES module imports",
        },
    );
    queries.insert(
        "variables",
        QueryEntry {
            pattern: "(program [ (lexical_declaration) @variable (variable_declaration) @variable ])",
            description: "Top-level variable bindings",
        },
    );

    LanguageQueries::new(queries)
}
