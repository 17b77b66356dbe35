use anyhow::Result;
use treescope_contracts::ListFilesArguments;

use crate::search::list_files;
use crate::FilesArgs;

/// The main entry point for the `files` command.
pub async fn run_files(args: FilesArgs) -> Result<()> {
    let arguments = ListFilesArguments {
        roots: Some(args.roots.iter().map(|p| p.display().to_string()).collect()),
        pattern: args.pattern.clone(),
        glob: args.glob,
        types: none_if_empty(&args.types),
        extensions: none_if_empty(&args.extensions),
        exclude: none_if_empty(&args.exclude),
        depth: args.depth,
        follow_symlinks: args.follow_symlinks,
        hidden: args.hidden,
        no_ignore: args.no_ignore,
        size: none_if_empty(&args.size),
        changed_within: args.changed_within.clone(),
        changed_before: args.changed_before.clone(),
        full_path_match: args.full_path_match,
        absolute: true,
        limit: args.limit,
        count_only: args.count_only,
    };

    let project_root = std::env::current_dir()?;
    let outcome = list_files(&arguments, &project_root).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn none_if_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}
