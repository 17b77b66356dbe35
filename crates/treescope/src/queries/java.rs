use std::collections::HashMap;

use super::{LanguageQueries, QueryEntry};

/// Creates the query table for Java.
pub(super) fn create_java_queries() -> LanguageQueries {
    let mut queries = HashMap::new();

    queries.insert(
        "functions",
        QueryEntry {
            pattern: "[ (method_declaration) @function (constructor_declaration) @function ]",
            description: "Methods and constructors",
        },
    );
    queries.insert(
        "methods",
        QueryEntry {
            pattern: "(method_declaration) @method",
            description: "Method declarations only",
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
            pattern: "(field_declaration) @field",
            description: "Field declarations",
        },
    );
    queries.insert(
        "imports",
        QueryEntry {
            pattern: "(import_declaration) @import",
            description: "Import declarations",
        },
    );
    queries.insert(
        "packages",
        QueryEntry {
            pattern: "(package_declaration) @package",
            description: "Package declaration",
        },
    );
    queries.insert(
        "annotations",
        QueryEntry {
            pattern: "[ (marker_annotation) @annotation (annotation) @annotation ]",
            description: "Annotations, with and without arguments",
        },
    );

    LanguageQueries::new(queries)
}
