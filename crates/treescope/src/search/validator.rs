//! Argument validation: loose bags in, immutable search contexts out.

use std::path::{Path, PathBuf};

use treescope_contracts::SearchArguments;

use super::rg::CaseMode;
use crate::error::{Error, Result};
use crate::limits::parse_size_to_bytes;

/// Output shaping mode, decided once here so strategies never re-check
/// mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    TotalOnly,
    CountOnly,
    OptimizedPaths,
    Grouped,
    Summary,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Toon,
}

/// Everything a strategy needs, validated and normalized.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub query: String,
    /// Resolved roots or files, absolute.
    pub targets: Vec<String>,
    pub files_mode: bool,
    pub mode: OutputMode,
    pub case: CaseMode,
    pub fixed_strings: bool,
    pub word: bool,
    pub multiline: bool,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
    pub hidden: bool,
    pub no_ignore: bool,
    pub max_filesize: Option<String>,
    pub context_before: Option<u64>,
    pub context_after: Option<u64>,
    pub encoding: Option<String>,
    pub max_count: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub enable_parallel: bool,
    pub output_format: OutputFormat,
    pub output_file: Option<String>,
    pub suppress_output: bool,
    pub project_root: PathBuf,
}

/// Validate `arguments` against `project_root` and build a [`SearchContext`].
pub fn validate(arguments: &SearchArguments, project_root: &Path) -> Result<SearchContext> {
    let query = arguments
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::invalid_argument("query", "required and must be non-empty"))?
        .to_string();

    if arguments.roots.is_some() && arguments.files.is_some() {
        return Err(Error::invalid_argument(
            "roots",
            "'roots' and 'files' are mutually exclusive",
        ));
    }
    if arguments.roots.is_none() && arguments.files.is_none() {
        return Err(Error::invalid_argument(
            "roots",
            "either 'roots' or 'files' must be provided",
        ));
    }

    let mode = output_mode(arguments)?;

    let case = match arguments.case.as_deref() {
        None => CaseMode::Smart,
        Some(value) => CaseMode::parse(value).ok_or_else(|| {
            Error::invalid_argument(
                "case",
                format!("'{value}' is not one of smart, insensitive, sensitive"),
            )
        })?,
    };

    let output_format = match arguments.output_format.as_deref() {
        None => OutputFormat::Json,
        Some("json") => OutputFormat::Json,
        Some("toon") => OutputFormat::Toon,
        Some(other) => {
            return Err(Error::invalid_argument(
                "output_format",
                format!("'{other}' is not one of json, toon"),
            ))
        }
    };

    let context_before = non_negative(arguments.context_before, "context_before")?;
    let context_after = non_negative(arguments.context_after, "context_after")?;
    let max_count = at_least(arguments.max_count, 1, "max_count")?;
    let timeout_ms = at_least(arguments.timeout_ms, 1, "timeout_ms")?;

    let files_mode = arguments.files.is_some();
    let raw_targets = arguments
        .roots
        .as_ref()
        .or(arguments.files.as_ref())
        .unwrap();
    if raw_targets.is_empty() {
        let field = if files_mode { "files" } else { "roots" };
        return Err(Error::invalid_argument(field, "must not be empty"));
    }

    let targets = resolve_paths(raw_targets, project_root, files_mode)?;

    if files_mode {
        warn_about_large_files(&targets, arguments.max_filesize.as_deref());
    }

    Ok(SearchContext {
        query,
        targets,
        files_mode,
        mode,
        case,
        fixed_strings: arguments.fixed_strings,
        word: arguments.word,
        multiline: arguments.multiline,
        include_globs: arguments.include_globs.clone().unwrap_or_default(),
        exclude_globs: arguments.exclude_globs.clone().unwrap_or_default(),
        follow_symlinks: arguments.follow_symlinks,
        hidden: arguments.hidden,
        no_ignore: arguments.no_ignore,
        max_filesize: arguments.max_filesize.clone(),
        context_before,
        context_after,
        encoding: arguments
            .encoding
            .as_deref()
            .map(crate::encoding::normalize_encoding_name),
        max_count,
        timeout_ms,
        enable_parallel: arguments.enable_parallel,
        output_format,
        output_file: arguments.output_file.clone(),
        suppress_output: arguments.suppress_output,
        project_root: project_root.to_path_buf(),
    })
}

fn output_mode(arguments: &SearchArguments) -> Result<OutputMode> {
    let flags = [
        (arguments.total_only, OutputMode::TotalOnly, "total_only"),
        (
            arguments.count_only_matches,
            OutputMode::CountOnly,
            "count_only_matches",
        ),
        (
            arguments.optimize_paths,
            OutputMode::OptimizedPaths,
            "optimize_paths",
        ),
        (arguments.group_by_file, OutputMode::Grouped, "group_by_file"),
        (arguments.summary_only, OutputMode::Summary, "summary_only"),
    ];
    let active: Vec<_> = flags.iter().filter(|(set, _, _)| *set).collect();
    match active.as_slice() {
        [] => Ok(OutputMode::Normal),
        [(_, mode, _)] => Ok(*mode),
        multiple => Err(Error::invalid_argument(
            "output_mode",
            format!(
                "output modes are mutually exclusive, got: {}",
                multiple
                    .iter()
                    .map(|(_, _, name)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )),
    }
}

fn non_negative(value: Option<i64>, field: &str) -> Result<Option<u64>> {
    match value {
        None => Ok(None),
        Some(v) if v >= 0 => Ok(Some(v as u64)),
        Some(v) => Err(Error::invalid_argument(
            field,
            format!("must be non-negative, got {v}"),
        )),
    }
}

fn at_least(value: Option<i64>, minimum: i64, field: &str) -> Result<Option<u64>> {
    match value {
        None => Ok(None),
        Some(v) if v >= minimum => Ok(Some(v as u64)),
        Some(v) => Err(Error::invalid_argument(
            field,
            format!("must be at least {minimum}, got {v}"),
        )),
    }
}

/// Resolve each path against the project root and refuse escapes.
fn resolve_paths(raw: &[String], project_root: &Path, files_mode: bool) -> Result<Vec<String>> {
    let canonical_root = dunce::canonicalize(project_root).map_err(|err| {
        Error::invalid_argument(
            "project_root",
            format!("{}: {err}", project_root.display()),
        )
    })?;

    let field = if files_mode { "files" } else { "roots" };
    let mut resolved = Vec::with_capacity(raw.len());
    for target in raw {
        let joined = if Path::new(target).is_absolute() {
            PathBuf::from(target)
        } else {
            canonical_root.join(target)
        };
        let canonical = dunce::canonicalize(&joined)
            .map_err(|err| Error::invalid_argument(field, format!("'{target}': {err}")))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(Error::PathOutsideProject(canonical));
        }
        resolved.push(canonical.display().to_string());
    }
    Ok(resolved)
}

/// ripgrep silently skips files over the size limit; surface that ahead of
/// time for explicitly named files.
fn warn_about_large_files(files: &[String], max_filesize: Option<&str>) {
    let limit = max_filesize.and_then(parse_size_to_bytes);
    let Some(limit) = limit else { return };
    for file in files {
        if let Ok(metadata) = std::fs::metadata(file) {
            if metadata.len() > limit {
                tracing::warn!(
                    file,
                    size = metadata.len(),
                    limit,
                    "file exceeds max_filesize and will be skipped by the search"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn base_args(root: &Path) -> SearchArguments {
        SearchArguments {
            query: Some("TODO".to_string()),
            roots: Some(vec![root.display().to_string()]),
            enable_parallel: true,
            ..Default::default()
        }
    }

    #[test]
    fn minimal_arguments_validate() {
        let dir = tempdir().unwrap();
        let context = validate(&base_args(dir.path()), dir.path()).unwrap();
        assert_eq!(context.query, "TODO");
        assert_eq!(context.mode, OutputMode::Normal);
        assert_eq!(context.case, CaseMode::Smart);
        assert!(!context.files_mode);
        assert_eq!(context.targets.len(), 1);
    }

    #[test]
    fn query_is_required() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.query = None;
        let err = validate(&args, dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { ref field, .. } if field == "query"));
    }

    #[test]
    fn roots_and_files_are_exclusive() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.files = Some(vec!["a.rs".to_string()]);
        assert!(validate(&args, dir.path()).is_err());
    }

    #[test]
    fn one_of_roots_or_files_is_required() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.roots = None;
        assert!(validate(&args, dir.path()).is_err());
    }

    #[test]
    fn multiple_output_modes_are_rejected() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.total_only = true;
        args.summary_only = true;
        let err = validate(&args, dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { ref field, .. } if field == "output_mode"));
    }

    #[test]
    fn single_output_mode_is_selected() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.count_only_matches = true;
        let context = validate(&args, dir.path()).unwrap();
        assert_eq!(context.mode, OutputMode::CountOnly);
    }

    #[test]
    fn invalid_case_and_format_are_rejected() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.case = Some("loud".to_string());
        assert!(validate(&args, dir.path()).is_err());

        let mut args = base_args(dir.path());
        args.output_format = Some("yaml".to_string());
        assert!(validate(&args, dir.path()).is_err());
    }

    #[test]
    fn ranges_are_enforced() {
        let dir = tempdir().unwrap();

        let mut args = base_args(dir.path());
        args.context_before = Some(-1);
        assert!(validate(&args, dir.path()).is_err());

        let mut args = base_args(dir.path());
        args.max_count = Some(0);
        assert!(validate(&args, dir.path()).is_err());

        let mut args = base_args(dir.path());
        args.timeout_ms = Some(0);
        assert!(validate(&args, dir.path()).is_err());

        let mut args = base_args(dir.path());
        args.timeout_ms = Some(250);
        let context = validate(&args, dir.path()).unwrap();
        assert_eq!(context.timeout_ms, Some(250));
    }

    #[test]
    fn relative_roots_resolve_under_project_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let mut args = base_args(dir.path());
        args.roots = Some(vec!["src".to_string()]);
        let context = validate(&args, dir.path()).unwrap();
        assert!(context.targets[0].ends_with("src"));
    }

    #[test]
    fn escaping_paths_are_refused() {
        let project = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let mut args = base_args(project.path());
        args.roots = Some(vec![elsewhere.path().display().to_string()]);
        let err = validate(&args, project.path()).unwrap_err();
        assert!(matches!(err, Error::PathOutsideProject(_)));
    }

    #[test]
    fn encoding_is_normalized() {
        let dir = tempdir().unwrap();
        let mut args = base_args(dir.path());
        args.encoding = Some("SJIS".to_string());
        let context = validate(&args, dir.path()).unwrap();
        assert_eq!(context.encoding.as_deref(), Some("shift_jis"));
    }
}
