//! Detection of `.gitignore` rules that would silently hide a searched root.
//!
//! When a caller points a search at a directory that an ignore file excludes
//! (build output, vendored trees), ripgrep returns nothing and the caller has
//! no idea why. The strategies auto-enable `--no-ignore` in that case and
//! record the decision in response metadata; it is logged, never surfaced as
//! an error.

use std::path::Path;

use ignore::gitignore::GitignoreBuilder;

/// True when any searched root is excluded by an ignore file between it and
/// the project root, or carries a catch-all ignore file of its own.
pub fn should_auto_no_ignore(targets: &[String], project_root: &Path) -> bool {
    targets
        .iter()
        .any(|target| root_is_ignored(Path::new(target), project_root))
}

fn root_is_ignored(target: &Path, project_root: &Path) -> bool {
    // Ancestor ignore files may exclude the target directory itself.
    let mut dir = target.parent();
    while let Some(current) = dir {
        let gitignore_path = current.join(".gitignore");
        if gitignore_path.is_file() {
            let mut builder = GitignoreBuilder::new(current);
            if builder.add(&gitignore_path).is_none() {
                if let Ok(gitignore) = builder.build() {
                    if gitignore
                        .matched_path_or_any_parents(target, true)
                        .is_ignore()
                    {
                        tracing::info!(
                            target = %target.display(),
                            ignore_file = %gitignore_path.display(),
                            "search root is gitignored; auto-enabling no_ignore"
                        );
                        return true;
                    }
                }
            }
        }
        if current == project_root {
            break;
        }
        dir = current.parent();
    }

    // A catch-all ignore file inside the target hides everything beneath it.
    let own_ignore = target.join(".gitignore");
    if own_ignore.is_file() {
        let mut builder = GitignoreBuilder::new(target);
        if builder.add(&own_ignore).is_none() {
            if let Ok(gitignore) = builder.build() {
                let probe = target.join("__treescope_probe__.txt");
                if gitignore.matched(&probe, false).is_ignore() {
                    tracing::info!(
                        target = %target.display(),
                        "catch-all gitignore inside search root; auto-enabling no_ignore"
                    );
                    return true;
                }
            }
        }
    }

    false
}
