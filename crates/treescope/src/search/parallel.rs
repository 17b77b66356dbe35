//! Parallel dispatch across root chunks with bounded concurrency.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::rg::{parse_count_output, TOTAL_KEY};
use super::runner::{run_command_capture, CommandOutput};
use crate::limits::{PARALLEL_MAX_CHUNKS, PARALLEL_MAX_CONCURRENT};

/// Split roots into at most `max_chunks` chunks, as evenly as possible, with
/// the remainder distributed to leading chunks.
pub fn split_roots(roots: &[String], max_chunks: usize) -> Vec<Vec<String>> {
    if roots.is_empty() || max_chunks == 0 {
        return Vec::new();
    }
    if roots.len() <= max_chunks {
        return roots.iter().map(|r| vec![r.clone()]).collect();
    }

    let chunk_size = roots.len() / max_chunks;
    let remainder = roots.len() % max_chunks;
    let mut chunks = Vec::with_capacity(max_chunks);
    let mut start = 0;
    for i in 0..max_chunks {
        let size = chunk_size + usize::from(i < remainder);
        if start >= roots.len() {
            break;
        }
        let end = (start + size).min(roots.len());
        chunks.push(roots[start..end].to_vec());
        start = end;
    }
    chunks
}

/// Convenience wrapper using the default chunk bound.
pub fn split_roots_default(roots: &[String]) -> Vec<Vec<String>> {
    split_roots(roots, PARALLEL_MAX_CHUNKS)
}

/// Run every command with bounded concurrency; results come back in command
/// order regardless of completion order.
pub async fn run_parallel_commands(
    commands: Vec<Vec<String>>,
    timeout_ms: Option<u64>,
) -> Vec<CommandOutput> {
    if commands.is_empty() {
        return Vec::new();
    }
    let semaphore = Arc::new(Semaphore::new(PARALLEL_MAX_CONCURRENT));
    let tasks = commands.into_iter().map(|argv| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            // An acquire error would mean a closed semaphore, which cannot
            // happen while we hold the Arc.
            let _permit = semaphore.acquire().await;
            run_command_capture(&argv, None, timeout_ms).await
        }
    });
    futures::future::join_all(tasks).await
}

/// Merge per-chunk outputs into one logical command result.
///
/// Exit codes 0 and 1 are both successes for rg (matches / no matches);
/// anything else is a critical failure and wins over partial successes only
/// when nothing succeeded.
pub fn merge_command_results(results: Vec<CommandOutput>, count_only: bool) -> CommandOutput {
    if results.is_empty() {
        return CommandOutput {
            exit_code: 1,
            stdout: Vec::new(),
            stderr: b"no results to merge".to_vec(),
        };
    }

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        if matches!(result.exit_code, 0 | 1) {
            successes.push(result);
        } else {
            failures.push(result);
        }
    }

    if successes.is_empty() {
        return failures.into_iter().next().unwrap();
    }

    if count_only {
        merge_count_outputs(&successes)
    } else {
        merge_json_outputs(&successes)
    }
}

/// Sum per-file counts across chunks. Files land in one chunk each, but the
/// sum handles duplicates anyway.
fn merge_count_outputs(results: &[CommandOutput]) -> CommandOutput {
    let mut merged: std::collections::BTreeMap<String, u64> = std::collections::BTreeMap::new();
    let mut total: u64 = 0;
    for result in results {
        let counts = parse_count_output(&result.stdout);
        for (path, count) in counts {
            if path == TOTAL_KEY {
                continue;
            }
            *merged.entry(path).or_insert(0) += count;
            total += count;
        }
    }

    let stdout = merged
        .iter()
        .map(|(path, count)| format!("{path}:{count}"))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes();

    CommandOutput {
        exit_code: if total > 0 { 0 } else { 1 },
        stdout,
        stderr: Vec::new(),
    }
}

/// Concatenate JSON event streams in chunk-index order.
fn merge_json_outputs(results: &[CommandOutput]) -> CommandOutput {
    let mut lines: Vec<&[u8]> = Vec::new();
    let mut has_matches = false;
    for result in results {
        if !result.stdout.iter().all(|b| b.is_ascii_whitespace()) {
            lines.extend(result.stdout.split(|&b| b == b'\n').filter(|l| !l.is_empty()));
            if result.exit_code == 0 {
                has_matches = true;
            }
        }
    }
    CommandOutput {
        exit_code: if has_matches { 0 } else { 1 },
        stdout: lines.join(&b'\n'),
        stderr: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn output(exit_code: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[test]
    fn few_roots_get_their_own_chunks() {
        let chunks = split_roots(&roots(&["a", "b", "c"]), 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn many_roots_distribute_remainder_to_leading_chunks() {
        let chunks = split_roots(&roots(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]), 4);
        assert_eq!(chunks.len(), 4);
        let sizes: Vec<_> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        let flattened: Vec<_> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, roots(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]));
    }

    #[test]
    fn empty_roots_produce_no_chunks() {
        assert!(split_roots(&[], 4).is_empty());
    }

    #[test]
    fn count_merge_sums_per_file() {
        let merged = merge_command_results(
            vec![output(0, "a.rs:5\n"), output(1, ""), output(0, "b.rs:3\n")],
            true,
        );
        assert_eq!(merged.exit_code, 0);
        let counts = parse_count_output(&merged.stdout);
        assert_eq!(counts.get("a.rs"), Some(&5));
        assert_eq!(counts.get("b.rs"), Some(&3));
        assert_eq!(counts.get(TOTAL_KEY), Some(&8));
    }

    #[test]
    fn count_merge_sums_duplicates_defensively() {
        let merged = merge_command_results(vec![output(0, "a.rs:2\n"), output(0, "a.rs:3\n")], true);
        let counts = parse_count_output(&merged.stdout);
        assert_eq!(counts.get("a.rs"), Some(&5));
    }

    #[test]
    fn json_merge_concatenates_in_chunk_order() {
        let first = r#"{"type":"match","data":{"path":{"text":"a.rs"},"line_number":1,"lines":{"text":"x"},"submatches":[]}}"#;
        let second = r#"{"type":"match","data":{"path":{"text":"b.rs"},"line_number":2,"lines":{"text":"y"},"submatches":[]}}"#;
        let merged = merge_command_results(
            vec![output(0, &format!("{first}\n")), output(0, &format!("{second}\n"))],
            false,
        );
        assert_eq!(merged.exit_code, 0);
        let matches = super::super::rg::parse_json_matches(&merged.stdout);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].file, "a.rs");
        assert_eq!(matches[1].file, "b.rs");
    }

    #[test]
    fn no_matches_anywhere_is_exit_one() {
        let merged = merge_command_results(vec![output(1, ""), output(1, "")], false);
        assert_eq!(merged.exit_code, 1);
        assert!(merged.stdout.is_empty());
    }

    #[test]
    fn critical_failure_propagates_when_nothing_succeeded() {
        let mut failure = output(2, "");
        failure.stderr = b"regex parse error".to_vec();
        let merged = merge_command_results(vec![failure], false);
        assert_eq!(merged.exit_code, 2);
        assert_eq!(merged.stderr_text(), "regex parse error");
    }

    #[test]
    fn partial_success_wins_over_critical_failure() {
        let merged = merge_command_results(vec![output(2, ""), output(0, "a.rs:1\n")], true);
        assert_eq!(merged.exit_code, 0);
    }

    #[tokio::test]
    async fn parallel_outputs_keep_command_order() {
        if !super::super::runner::command_on_path("echo") {
            return;
        }
        let commands = vec![
            vec!["echo".to_string(), "one".to_string()],
            vec!["echo".to_string(), "two".to_string()],
            vec!["echo".to_string(), "three".to_string()],
        ];
        let outputs = run_parallel_commands(commands, None).await;
        let texts: Vec<_> = outputs
            .iter()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
