use anyhow::Result;
use treescope_contracts::{SearchArguments, SearchOutcome};

use crate::config;
use crate::formatter::render_json_value;
use crate::search::search_content;
use crate::SearchArgs;

/// The main entry point for the `search` command.
pub async fn run_search(args: SearchArgs) -> Result<()> {
    let defaults = config::load_config().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config; using defaults");
        config::Config::default()
    });

    let arguments = to_arguments(&args, &defaults);
    let project_root = std::env::current_dir()?;
    let outcome = search_content(&arguments, &project_root, None).await?;

    match &outcome {
        // Bare integer, friendly to shell arithmetic.
        SearchOutcome::Total(total) => println!("{total}"),
        other => {
            let value = serde_json::to_value(other)?;
            println!("{}", render_json_value(&args.output_format, &value));
        }
    }
    Ok(())
}

fn to_arguments(args: &SearchArgs, defaults: &config::Config) -> SearchArguments {
    let mut exclude_globs = defaults.search.exclude_globs.clone();
    exclude_globs.extend(args.exclude_globs.iter().cloned());

    let roots = if args.files.is_empty() {
        Some(
            args.roots
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        )
    } else {
        None
    };
    let files = if args.files.is_empty() {
        None
    } else {
        Some(args.files.iter().map(|p| p.display().to_string()).collect())
    };

    SearchArguments {
        query: Some(args.query.clone()),
        roots,
        files,
        case: Some(args.case.clone()),
        fixed_strings: args.fixed_strings,
        word: args.word,
        multiline: args.multiline,
        include_globs: if args.include_globs.is_empty() {
            None
        } else {
            Some(args.include_globs.clone())
        },
        exclude_globs: if exclude_globs.is_empty() {
            None
        } else {
            Some(exclude_globs)
        },
        follow_symlinks: args.follow_symlinks,
        hidden: args.hidden,
        no_ignore: args.no_ignore,
        max_filesize: args.max_filesize.clone(),
        context_before: args.context_before,
        context_after: args.context_after,
        encoding: args.encoding.clone(),
        max_count: args
            .max_count
            .or(defaults.search.max_count.map(|v| v as i64)),
        timeout_ms: args.timeout_ms,
        total_only: args.total_only,
        count_only_matches: args.count_only_matches,
        summary_only: args.summary_only,
        group_by_file: args.group_by_file,
        optimize_paths: args.optimize_paths,
        output_format: Some(args.output_format.clone()),
        output_file: args.output_file.clone(),
        suppress_output: args.suppress_output,
        enable_parallel: !args.no_parallel,
    }
}
