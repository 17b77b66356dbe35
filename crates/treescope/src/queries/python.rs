use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for Python.
pub(super) fn create_python_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "functions",
        QueryEntry {
            pattern: "(function_definition) @function",
            description: "Function and method definitions",
        },
    );
    queries.insert(
        "methods",
        QueryEntry {
            // Functions directly inside a class body, decorated or not.
            pattern: "[ (class_definition body: (block (function_definition) @method)) (class_definition body: (block (decorated_definition definition: (function_definition) @method))) ]",
            description: "Methods defined inside a class body",
        },
    );
    queries.insert(
        "classes",
        QueryEntry {
            pattern: "(class_definition) @class",
            description: "Class definitions",
        },
    );
    queries.insert(
        "fields",
        QueryEntry {
            pattern: "(class_definition body: (block (expression_statement (assignment) @field)))",
            description: "Class-level attribute assignments",
        },
    );
    queries.insert(
        "imports",
        QueryEntry {
            pattern: "[ (import_statement) @import (import_from_statement) @import ]",
            description: "import and from-import statements",
        },
    );
    queries.insert(
        "annotations",
        QueryEntry {
            pattern: "(decorator) @annotation",
            description: "Decorators",
        },
    );

    LanguageQueries::new(queries)
}
