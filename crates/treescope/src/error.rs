use std::path::PathBuf;

use thiserror::Error;

/// Typed error kinds surfaced by the core API.
///
/// Front-ends map these onto their own conventions (CLI exit-code families,
/// server error-code ranges) without string matching.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("could not determine a text encoding for {0}")]
    EncodingUndetectable(PathBuf),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("parse failed: {0}")]
    ParseFailed(String),

    #[error("query '{key}' not found for language '{language}'")]
    QueryNotFound { language: String, key: String },

    #[error("query compilation failed: {0}")]
    QueryCompileFailed(String),

    #[error("invalid query request: {0}")]
    InvalidQueryRequest(String),

    #[error("invalid argument '{field}': {reason}")]
    InvalidArguments { field: String, reason: String },

    #[error("required external command '{0}' was not found on PATH")]
    MissingExternalCommand(String),

    #[error("command timed out after {0} ms")]
    CommandTimedOut(u64),

    #[error("command failed with exit code {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    #[error("path escapes the project root: {0}")]
    PathOutsideProject(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit code family for the CLI front: 2 for argument errors, 3 for
    /// analysis errors, 124 for timeouts, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArguments { .. }
            | Error::InvalidQueryRequest(_)
            | Error::PathOutsideProject(_) => 2,
            Error::FileNotFound(_)
            | Error::PermissionDenied(_)
            | Error::EncodingUndetectable(_)
            | Error::UnknownLanguage(_)
            | Error::ParseFailed(_)
            | Error::QueryNotFound { .. }
            | Error::QueryCompileFailed(_) => 3,
            Error::CommandTimedOut(_) => 124,
            _ => 1,
        }
    }

    pub(crate) fn invalid_argument(field: &str, reason: impl Into<String>) -> Error {
        Error::InvalidArguments {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_families() {
        assert_eq!(Error::invalid_argument("query", "missing").exit_code(), 2);
        assert_eq!(Error::UnknownLanguage("brainfuck".into()).exit_code(), 3);
        assert_eq!(Error::CommandTimedOut(50).exit_code(), 124);
        assert_eq!(
            Error::CommandFailed {
                exit_code: 2,
                stderr: "bad glob".into()
            }
            .exit_code(),
            1
        );
    }
}
