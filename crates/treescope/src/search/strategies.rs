//! Output-mode strategies for content search.
//!
//! The mode was fixed during validation, so execution is a single dispatch:
//! every strategy shares the build-run-parse spine and differs only in how it
//! shapes the response.

use std::time::Instant;

use treescope_contracts::{
    CountOnlyResponse, GroupedResponse, MatchListResponse, SearchMatch, SearchMeta, SearchOutcome,
    SummaryResponse, SuppressedResponse,
};

use super::gitignore::should_auto_no_ignore;
use super::parallel::{merge_command_results, run_parallel_commands, split_roots_default};
use super::rg::{
    build_rg_command, group_matches_by_file, optimize_match_paths, parse_count_output,
    parse_json_matches, summarize_search_results, RgCommandConfig, TOTAL_KEY,
};
use super::runner::{
    command_on_path, run_command_capture, sanitize_error_message, CommandOutput, EXIT_NOT_FOUND,
    EXIT_TIMEOUT,
};
use super::validator::{OutputFormat, OutputMode, SearchContext};
use crate::error::{Error, Result};
use crate::formatter::render_json_value;
use crate::limits::MAX_RESULTS_HARD_CAP;

const SUMMARY_MAX_FILES: usize = 10;
const SUMMARY_MAX_LINES: usize = 50;

/// A shaped outcome plus the per-file counts a total-only run produced
/// anyway, so callers can prime a count-mode cache entry for free.
pub struct SearchRun {
    pub outcome: SearchOutcome,
    pub counts_sidecar: Option<CountOnlyResponse>,
}

impl SearchRun {
    fn plain(outcome: SearchOutcome) -> Self {
        SearchRun {
            outcome,
            counts_sidecar: None,
        }
    }
}

/// Run the search described by `context` and shape the response for its
/// output mode.
pub async fn execute(context: &SearchContext) -> Result<SearchRun> {
    if !command_on_path("rg") {
        return Err(Error::MissingExternalCommand("rg".to_string()));
    }

    let mut meta = SearchMeta::default();
    let mut no_ignore = context.no_ignore;
    if !no_ignore
        && !context.files_mode
        && should_auto_no_ignore(&context.targets, &context.project_root)
    {
        no_ignore = true;
        meta.auto_no_ignore = true;
    }

    let count_only = matches!(context.mode, OutputMode::TotalOnly | OutputMode::CountOnly);

    let started = Instant::now();
    let output = run_search(context, no_ignore, count_only).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match output.exit_code {
        0 | 1 => {}
        EXIT_TIMEOUT => return Err(Error::CommandTimedOut(context.timeout_ms.unwrap_or(0))),
        EXIT_NOT_FOUND => return Err(Error::MissingExternalCommand("rg".to_string())),
        code => {
            return Err(Error::CommandFailed {
                exit_code: code,
                stderr: sanitize_error_message(&output.stderr_text()),
            })
        }
    }

    shape_response(context, &output, elapsed_ms, meta)
}

async fn run_search(context: &SearchContext, no_ignore: bool, count_only: bool) -> CommandOutput {
    let parallel = !context.files_mode && context.targets.len() > 1 && context.enable_parallel;
    if parallel {
        let chunks = split_roots_default(&context.targets);
        let commands = chunks
            .into_iter()
            .map(|chunk| build_rg_command(&rg_config(context, chunk, no_ignore, count_only)))
            .collect();
        let results = run_parallel_commands(commands, context.timeout_ms).await;
        merge_command_results(results, count_only)
    } else {
        let command = build_rg_command(&rg_config(
            context,
            context.targets.clone(),
            no_ignore,
            count_only,
        ));
        run_command_capture(&command, None, context.timeout_ms).await
    }
}

fn rg_config(
    context: &SearchContext,
    targets: Vec<String>,
    no_ignore: bool,
    count_only: bool,
) -> RgCommandConfig {
    RgCommandConfig {
        query: context.query.clone(),
        roots: targets,
        case: context.case,
        fixed_strings: context.fixed_strings,
        word: context.word,
        multiline: context.multiline,
        include_globs: context.include_globs.clone(),
        exclude_globs: context.exclude_globs.clone(),
        follow_symlinks: context.follow_symlinks,
        hidden: context.hidden,
        no_ignore,
        max_filesize: context.max_filesize.clone(),
        context_before: context.context_before,
        context_after: context.context_after,
        encoding: context.encoding.clone(),
        max_count: context.max_count,
        count_only_matches: count_only,
    }
}

fn shape_response(
    context: &SearchContext,
    output: &CommandOutput,
    elapsed_ms: u64,
    meta: SearchMeta,
) -> Result<SearchRun> {
    let meta = if meta.auto_no_ignore { Some(meta) } else { None };

    match context.mode {
        OutputMode::TotalOnly => {
            let mut counts = parse_count_output(&output.stdout);
            let total = counts.remove(TOTAL_KEY).unwrap_or(0);
            Ok(SearchRun {
                outcome: SearchOutcome::Total(total),
                counts_sidecar: Some(CountOnlyResponse {
                    success: true,
                    count_only: true,
                    total_matches: total,
                    file_counts: counts,
                    elapsed_ms,
                    meta,
                }),
            })
        }
        OutputMode::CountOnly => {
            let mut counts = parse_count_output(&output.stdout);
            let total = counts.remove(TOTAL_KEY).unwrap_or(0);
            Ok(SearchRun::plain(SearchOutcome::Counts(CountOnlyResponse {
                success: true,
                count_only: true,
                total_matches: total,
                file_counts: counts,
                elapsed_ms,
                meta,
            })))
        }
        OutputMode::OptimizedPaths => {
            let (matches, truncated) = parsed_matches(context, output);
            let optimized = optimize_match_paths(&matches);
            let response = MatchListResponse {
                success: true,
                count: optimized.len(),
                truncated,
                elapsed_ms,
                results: optimized,
                meta,
                output_file: None,
                file_saved: None,
            };
            Ok(SearchRun::plain(finish_matches(context, SearchOutcome::Matches(response))?))
        }
        OutputMode::Grouped => {
            let (matches, _truncated) = parsed_matches(context, output);
            let files = group_matches_by_file(&matches);
            let response = GroupedResponse {
                success: true,
                count: matches.len(),
                files,
                elapsed_ms,
                meta,
            };
            Ok(SearchRun::plain(finish_matches(context, SearchOutcome::Grouped(response))?))
        }
        OutputMode::Summary => {
            let (matches, truncated) = parsed_matches(context, output);
            let summary = summarize_search_results(&matches, SUMMARY_MAX_FILES, SUMMARY_MAX_LINES);
            let response = SummaryResponse {
                success: true,
                count: matches.len(),
                truncated,
                elapsed_ms,
                summary,
                meta,
            };
            Ok(SearchRun::plain(finish_matches(context, SearchOutcome::Summary(response))?))
        }
        OutputMode::Normal => {
            let (matches, truncated) = parsed_matches(context, output);
            let response = MatchListResponse {
                success: true,
                count: matches.len(),
                truncated,
                elapsed_ms,
                results: matches,
                meta,
                output_file: None,
                file_saved: None,
            };
            Ok(SearchRun::plain(finish_matches(context, SearchOutcome::Matches(response))?))
        }
    }
}

/// Parse and truncate: the hard cap always applies; `max_count` trims the
/// combined result further (rg already limited per-file counts).
fn parsed_matches(context: &SearchContext, output: &CommandOutput) -> (Vec<SearchMatch>, bool) {
    let mut matches = parse_json_matches(&output.stdout);
    let mut truncated = false;
    if matches.len() >= MAX_RESULTS_HARD_CAP {
        matches.truncate(MAX_RESULTS_HARD_CAP);
        truncated = true;
    }
    if let Some(max) = context.max_count {
        let max = max as usize;
        if matches.len() > max {
            matches.truncate(max);
            truncated = true;
        }
    }
    (matches, truncated)
}

/// Apply `output_file` / `suppress_output` handling to a shaped outcome.
fn finish_matches(context: &SearchContext, outcome: SearchOutcome) -> Result<SearchOutcome> {
    match (&context.output_file, context.suppress_output) {
        (None, false) => Ok(outcome),
        (None, true) => Ok(suppress_details(outcome)),
        (Some(output_file), suppress) => {
            let saved_path = write_outcome(context, output_file, &outcome)?;
            let count = outcome.total_matches() as usize;
            if suppress {
                return Ok(SearchOutcome::Suppressed(SuppressedResponse {
                    success: true,
                    count,
                    output_file: output_file.clone(),
                    file_saved: saved_path,
                }));
            }
            Ok(attach_saved_file(outcome, output_file.clone(), saved_path))
        }
    }
}

fn suppress_details(outcome: SearchOutcome) -> SearchOutcome {
    match outcome {
        SearchOutcome::Matches(mut response) => {
            response.results.clear();
            SearchOutcome::Matches(response)
        }
        SearchOutcome::Grouped(mut response) => {
            response.files.clear();
            SearchOutcome::Grouped(response)
        }
        other => other,
    }
}

fn attach_saved_file(outcome: SearchOutcome, output_file: String, saved: String) -> SearchOutcome {
    match outcome {
        SearchOutcome::Matches(mut response) => {
            response.output_file = Some(output_file);
            response.file_saved = Some(saved);
            SearchOutcome::Matches(response)
        }
        other => other,
    }
}

/// Serialize the outcome with the requested formatter and write it under the
/// project root. Returns the absolute path written.
fn write_outcome(
    context: &SearchContext,
    output_file: &str,
    outcome: &SearchOutcome,
) -> Result<String> {
    let value = serde_json::to_value(outcome)
        .map_err(|err| Error::invalid_argument("output_file", err.to_string()))?;
    let format_name = match context.output_format {
        OutputFormat::Json => "json",
        OutputFormat::Toon => "toon",
    };
    let content = render_json_value(format_name, &value);

    let path = context.project_root.join(output_file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content.as_bytes())?;
    Ok(path.display().to_string())
}
