//! ripgrep command construction, output parsing, and result shaping.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use treescope_contracts::{FileGroup, FileSummary, GroupedMatch, SearchMatch, SearchSummary};

use crate::limits::{normalize_max_filesize, MAX_RESULTS_HARD_CAP};

/// Synthetic key carrying the aggregate in count output.
pub const TOTAL_KEY: &str = "__total__";

/// Case-sensitivity mode, mapping onto `-S` / `-i` / `-s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Smart,
    Insensitive,
    Sensitive,
}

impl CaseMode {
    pub fn parse(value: &str) -> Option<CaseMode> {
        match value {
            "smart" => Some(CaseMode::Smart),
            "insensitive" => Some(CaseMode::Insensitive),
            "sensitive" => Some(CaseMode::Sensitive),
            _ => None,
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            CaseMode::Smart => "-S",
            CaseMode::Insensitive => "-i",
            CaseMode::Sensitive => "-s",
        }
    }
}

/// All switches for one rg invocation.
#[derive(Debug, Clone, Default)]
pub struct RgCommandConfig {
    pub query: String,
    pub roots: Vec<String>,
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
    pub count_only_matches: bool,
}

/// Build the rg argument vector.
///
/// Count mode and JSON mode are mutually exclusive; count wins. Flag order is
/// stable: mode, case, search-mode, traversal, filters, context, encoding,
/// limits, query, targets.
pub fn build_rg_command(config: &RgCommandConfig) -> Vec<String> {
    let mut cmd: Vec<String> = if config.count_only_matches {
        vec!["rg".into(), "--count-matches".into()]
    } else {
        vec!["rg".into(), "--json".into()]
    };
    cmd.push("--no-heading".into());
    cmd.push("--color".into());
    cmd.push("never".into());

    cmd.push(config.case.flag().into());

    if config.fixed_strings {
        cmd.push("-F".into());
    }
    if config.word {
        cmd.push("-w".into());
    }
    if config.multiline {
        cmd.push("--multiline".into());
    }
    if config.follow_symlinks {
        cmd.push("-L".into());
    }
    if config.hidden {
        cmd.push("-H".into());
    }
    if config.no_ignore {
        cmd.push("-u".into());
    }
    for glob in &config.include_globs {
        cmd.push("-g".into());
        cmd.push(glob.clone());
    }
    for glob in &config.exclude_globs {
        cmd.push("-g".into());
        if glob.starts_with('!') {
            cmd.push(glob.clone());
        } else {
            cmd.push(format!("!{glob}"));
        }
    }
    if let Some(before) = config.context_before {
        cmd.push("-B".into());
        cmd.push(before.to_string());
    }
    if let Some(after) = config.context_after {
        cmd.push("-A".into());
        cmd.push(after.to_string());
    }
    if let Some(encoding) = &config.encoding {
        cmd.push("--encoding".into());
        cmd.push(encoding.clone());
    }
    if let Some(max_count) = config.max_count {
        cmd.push("-m".into());
        cmd.push(max_count.to_string());
    }
    cmd.push("--max-filesize".into());
    cmd.push(normalize_max_filesize(config.max_filesize.as_deref()));

    cmd.push(config.query.clone());
    cmd.extend(config.roots.iter().cloned());

    cmd
}

#[derive(Deserialize)]
struct RgEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: Option<RgEventData>,
}

#[derive(Deserialize)]
struct RgEventData {
    path: Option<RgText>,
    line_number: Option<u64>,
    lines: Option<RgText>,
    #[serde(default)]
    submatches: Vec<RgSubmatch>,
}

#[derive(Deserialize)]
struct RgText {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RgSubmatch {
    start: Option<usize>,
    end: Option<usize>,
}

/// Parse the newline-delimited JSON event stream from `rg --json`.
///
/// Only `match` events contribute. Line text is whitespace-collapsed to cut
/// the token footprint downstream. Malformed lines are skipped; parsing stops
/// at the hard cap.
pub fn parse_json_matches(stdout: &[u8]) -> Vec<SearchMatch> {
    let mut results = Vec::new();
    for raw_line in stdout.split(|&b| b == b'\n') {
        if raw_line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        let Ok(event) = serde_json::from_slice::<RgEvent>(raw_line) else {
            continue;
        };
        if event.event_type != "match" {
            continue;
        }
        let Some(data) = event.data else { continue };
        let Some(file) = data.path.and_then(|p| p.text) else {
            continue;
        };

        let text = data
            .lines
            .and_then(|l| l.text)
            .map(|t| collapse_whitespace(&t))
            .unwrap_or_default();

        let matches = data
            .submatches
            .into_iter()
            .filter_map(|sm| Some([sm.start?, sm.end?]))
            .collect();

        results.push(SearchMatch {
            file,
            line: data.line_number.unwrap_or(0),
            text,
            matches,
        });

        if results.len() >= MAX_RESULTS_HARD_CAP {
            break;
        }
    }
    results
}

/// Parse `rg --count-matches` output (`path:N` per line). The sum lands
/// under [`TOTAL_KEY`] so per-file and aggregate views come from one pass.
pub fn parse_count_output(stdout: &[u8]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    let mut total: u64 = 0;
    for line in String::from_utf8_lossy(stdout).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((path, count_str)) = line.rsplit_once(':') else {
            continue;
        };
        let Ok(count) = count_str.parse::<u64>() else {
            continue;
        };
        counts.insert(path.to_string(), count);
        total += count;
    }
    counts.insert(TOTAL_KEY.to_string(), total);
    counts
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Group matches by file, removing per-match path duplication.
pub fn group_matches_by_file(matches: &[SearchMatch]) -> Vec<FileGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<GroupedMatch>> = BTreeMap::new();
    for m in matches {
        if !groups.contains_key(&m.file) {
            order.push(m.file.clone());
        }
        groups.entry(m.file.clone()).or_default().push(GroupedMatch {
            line: m.line,
            text: m.text.clone(),
            positions: m.matches.clone(),
        });
    }
    order
        .into_iter()
        .map(|file| {
            let matches = groups.remove(&file).unwrap_or_default();
            let match_count = matches.len();
            FileGroup {
                file,
                matches,
                match_count,
            }
        })
        .collect()
}

/// Strip the longest common path prefix and elide the middle of deep paths.
/// Idempotent; only the `file` field changes.
pub fn optimize_match_paths(matches: &[SearchMatch]) -> Vec<SearchMatch> {
    if matches.is_empty() {
        return Vec::new();
    }
    let paths: Vec<&str> = matches.iter().map(|m| m.file.as_str()).collect();
    let prefix = common_path_prefix(&paths);

    matches
        .iter()
        .map(|m| {
            let mut out = m.clone();
            out.file = optimize_file_path(&m.file, prefix.as_deref());
            out
        })
        .collect()
}

fn common_path_prefix(paths: &[&str]) -> Option<String> {
    if paths.len() < 2 {
        return None;
    }
    let mut components: Option<Vec<String>> = None;
    for path in paths {
        let parts: Vec<String> = Path::new(path)
            .parent()?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        components = Some(match components {
            None => parts,
            Some(current) => current
                .into_iter()
                .zip(parts)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    let components = components?;
    if components.is_empty() {
        return None;
    }
    Some(components.join("/").replace("//", "/"))
}

fn optimize_file_path(file: &str, prefix: Option<&str>) -> String {
    let mut current = file.to_string();
    if let Some(prefix) = prefix {
        if let Some(stripped) = current
            .strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches(['/', '\\']))
        {
            if !stripped.is_empty() {
                current = stripped.to_string();
            }
        }
    }

    let parts: Vec<String> = Path::new(&current)
        .components()
        .filter(|c| !matches!(c, Component::RootDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.len() > 4 {
        let mut shortened = PathBuf::from(&parts[0]);
        shortened.push("...");
        for part in &parts[parts.len() - 3..] {
            shortened.push(part);
        }
        return shortened.to_string_lossy().into_owned();
    }
    current
}

const SUMMARY_SAMPLE_WIDTH: usize = 60;

/// Top-K files by match count with a few truncated sample lines each.
pub fn summarize_search_results(
    matches: &[SearchMatch],
    max_files: usize,
    max_total_lines: usize,
) -> SearchSummary {
    if matches.is_empty() {
        return SearchSummary {
            total_matches: 0,
            total_files: 0,
            summary: "No matches found".to_string(),
            top_files: Vec::new(),
            truncated: false,
        };
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<&SearchMatch>> = BTreeMap::new();
    for m in matches {
        if !groups.contains_key(&m.file) {
            order.push(m.file.clone());
        }
        groups.entry(m.file.clone()).or_default().push(m);
    }
    let total_files = groups.len();
    let total_matches = matches.len();

    let paths: Vec<&str> = order.iter().map(String::as_str).collect();
    let prefix = common_path_prefix(&paths);

    // Most-matched files first; ties stay in first-seen order.
    let mut ranked: Vec<(String, Vec<&SearchMatch>)> = order
        .into_iter()
        .map(|file| {
            let file_matches = groups.remove(&file).unwrap_or_default();
            (file, file_matches)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut top_files = Vec::new();
    let mut remaining_lines = max_total_lines;
    for (file, file_matches) in ranked.into_iter().take(max_files) {
        let mut sample_lines = Vec::new();
        for m in file_matches.iter().take(3.min(remaining_lines)) {
            let text = m.text.trim();
            if text.is_empty() {
                continue;
            }
            let mut sample: String = text.chars().take(SUMMARY_SAMPLE_WIDTH).collect();
            if text.chars().count() > SUMMARY_SAMPLE_WIDTH {
                sample.push_str("...");
            }
            sample_lines.push(format!("L{}: {sample}", m.line));
            remaining_lines = remaining_lines.saturating_sub(1);
        }
        if sample_lines.is_empty() {
            sample_lines.push(format!("Found {} matches", file_matches.len()));
        }
        top_files.push(FileSummary {
            file: optimize_file_path(&file, prefix.as_deref()),
            match_count: file_matches.len(),
            sample_lines,
        });
        if remaining_lines == 0 {
            break;
        }
    }

    let summary = if total_files <= max_files {
        format!("Found {total_matches} matches in {total_files} files")
    } else {
        format!(
            "Found {total_matches} matches in {total_files} files (showing top {})",
            top_files.len()
        )
    };

    SearchSummary {
        total_matches,
        total_files,
        summary,
        top_files,
        truncated: total_files > max_files,
    }
}

/// Per-file summary derived from count output alone.
pub fn file_summary_from_counts(counts: &BTreeMap<String, u64>) -> (u64, Vec<FileSummary>) {
    let total = counts.get(TOTAL_KEY).copied().unwrap_or(0);
    let files = counts
        .iter()
        .filter(|(path, _)| path.as_str() != TOTAL_KEY)
        .map(|(path, count)| FileSummary {
            file: path.clone(),
            match_count: *count as usize,
            sample_lines: Vec::new(),
        })
        .collect();
    (total, files)
}
