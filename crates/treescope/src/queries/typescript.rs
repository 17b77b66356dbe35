use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for TypeScript.
pub(super) fn create_typescript_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "functions",
        QueryEntry {
            pattern: "[ (function_declaration) @function (variable_declarator value: (arrow_function) @function) (method_definition) @function ]",
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
            pattern: "[ (class_declaration) @class (interface_declaration) @class (enum_declaration) @class ]",
            description: "Class, interface, and enum declarations",
        },
    );
    queries.insert(
        "fields",
        QueryEntry {
            pattern: "[ (public_field_definition) @field (property_signature) @field ]",
            description: "Class fields and interface property signatures",
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
        "annotations",
        QueryEntry {
            pattern: "(decorator) @annotation",
            description: "Decorators",
        },
    );

    LanguageQueries::new(queries)
}
