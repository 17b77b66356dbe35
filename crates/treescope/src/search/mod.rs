//! File and content search built on external `fd` and `rg` processes.

pub mod cache;
pub mod fd;
pub mod gitignore;
pub mod parallel;
pub mod rg;
pub mod runner;
pub mod strategies;
pub mod validator;

use std::path::Path;
use std::time::Instant;

use treescope_contracts::{
    FileCountResponse, ListFilesArguments, ListFilesOutcome, ListFilesResponse, SearchArguments,
    SearchOutcome,
};

use crate::error::{Error, Result};
use cache::SearchCache;
use fd::{build_fd_command, parse_fd_output, FdCommandConfig};
use runner::{
    command_on_path, run_command_capture, sanitize_error_message, EXIT_NOT_FOUND, EXIT_TIMEOUT,
};

/// Search file contents with ripgrep.
///
/// The optional cache stores shaped outcomes; a `total_only` run also primes
/// the corresponding `count_only_matches` entry so a follow-up drill-down is
/// free.
pub async fn search_content(
    arguments: &SearchArguments,
    project_root: &Path,
    cache: Option<&SearchCache>,
) -> Result<SearchOutcome> {
    let context = validator::validate(arguments, project_root)?;

    let cache_key = cache.map(|_| SearchCache::key_for(arguments));
    if let (Some(cache), Some(key)) = (cache, cache_key) {
        if let Some(hit) = cache.get(key) {
            tracing::debug!(key, "search cache hit");
            return Ok(hit);
        }
    }

    let run = strategies::execute(&context).await?;

    if let (Some(cache), Some(key)) = (cache, cache_key) {
        cache.put(key, run.outcome.clone());
        // A total-only run already parsed per-file counts; prime the
        // count_only_matches entry so a follow-up drill-down is free.
        if let Some(counts) = run.counts_sidecar {
            let counts_key = SearchCache::count_only_key_for(arguments);
            tracing::debug!(counts_key, "priming count_only entry from total_only run");
            cache.put(counts_key, SearchOutcome::Counts(counts));
        }
    }

    Ok(run.outcome)
}

/// List files with fd.
pub async fn list_files(
    arguments: &ListFilesArguments,
    project_root: &Path,
) -> Result<ListFilesOutcome> {
    if !command_on_path("fd") {
        return Err(Error::MissingExternalCommand("fd".to_string()));
    }

    let config = validate_list_files(arguments, project_root)?;
    let command = build_fd_command(&config);

    let started = Instant::now();
    let output = run_command_capture(&command, None, None).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match output.exit_code {
        0 | 1 => {}
        EXIT_TIMEOUT => return Err(Error::CommandTimedOut(0)),
        EXIT_NOT_FOUND => return Err(Error::MissingExternalCommand("fd".to_string())),
        code => {
            return Err(Error::CommandFailed {
                exit_code: code,
                stderr: sanitize_error_message(&output.stderr_text()),
            })
        }
    }

    let files = parse_fd_output(&output.stdout, config.limit.map(|l| l as usize));
    if arguments.count_only {
        return Ok(ListFilesOutcome::Count(FileCountResponse {
            success: true,
            count_only: true,
            total_count: files.len(),
            elapsed_ms,
        }));
    }
    Ok(ListFilesOutcome::Files(ListFilesResponse {
        success: true,
        count: files.len(),
        files,
        elapsed_ms,
    }))
}

fn validate_list_files(
    arguments: &ListFilesArguments,
    project_root: &Path,
) -> Result<FdCommandConfig> {
    let roots = arguments
        .roots
        .as_ref()
        .filter(|roots| !roots.is_empty())
        .ok_or_else(|| Error::invalid_argument("roots", "required and must be non-empty"))?;

    let depth = match arguments.depth {
        None => None,
        Some(d) if d >= 0 => Some(d as u64),
        Some(d) => {
            return Err(Error::invalid_argument(
                "depth",
                format!("must be non-negative, got {d}"),
            ))
        }
    };
    let limit = match arguments.limit {
        None => None,
        Some(l) if l >= 0 => Some(l as u64),
        Some(l) => {
            return Err(Error::invalid_argument(
                "limit",
                format!("must be non-negative, got {l}"),
            ))
        }
    };

    let canonical_root = dunce::canonicalize(project_root).map_err(|err| {
        Error::invalid_argument("project_root", format!("{}: {err}", project_root.display()))
    })?;
    let mut resolved_roots = Vec::with_capacity(roots.len());
    for root in roots {
        let joined = if Path::new(root).is_absolute() {
            std::path::PathBuf::from(root)
        } else {
            canonical_root.join(root)
        };
        let canonical = dunce::canonicalize(&joined)
            .map_err(|err| Error::invalid_argument("roots", format!("'{root}': {err}")))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(Error::PathOutsideProject(canonical));
        }
        resolved_roots.push(canonical.display().to_string());
    }

    Ok(FdCommandConfig {
        roots: resolved_roots,
        pattern: arguments.pattern.clone(),
        glob: arguments.glob,
        full_path_match: arguments.full_path_match,
        types: arguments.types.clone().unwrap_or_default(),
        extensions: arguments.extensions.clone().unwrap_or_default(),
        exclude: arguments.exclude.clone().unwrap_or_default(),
        depth,
        follow_symlinks: arguments.follow_symlinks,
        hidden: arguments.hidden,
        no_ignore: arguments.no_ignore,
        size: arguments.size.clone().unwrap_or_default(),
        changed_within: arguments.changed_within.clone(),
        changed_before: arguments.changed_before.clone(),
        absolute: arguments.absolute,
        limit,
    })
}
