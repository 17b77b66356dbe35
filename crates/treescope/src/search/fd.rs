//! fd command construction and output parsing.
//!
//! The builder is a pure function from an immutable config to an argument
//! vector; nothing here spawns processes.

/// All switches for one fd invocation.
#[derive(Debug, Clone, Default)]
pub struct FdCommandConfig {
    pub roots: Vec<String>,
    pub pattern: Option<String>,
    pub glob: bool,
    pub full_path_match: bool,
    pub types: Vec<String>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub depth: Option<u64>,
    pub follow_symlinks: bool,
    pub hidden: bool,
    pub no_ignore: bool,
    pub size: Vec<String>,
    pub changed_within: Option<String>,
    pub changed_before: Option<String>,
    pub absolute: bool,
    pub limit: Option<u64>,
}

/// Build the fd argument vector. Flag order is stable: mode, output,
/// traversal, depth, type filters, attribute filters, limits, pattern, roots.
pub fn build_fd_command(config: &FdCommandConfig) -> Vec<String> {
    let mut cmd: Vec<String> = vec!["fd".into(), "--color".into(), "never".into()];

    if config.glob {
        cmd.push("--glob".into());
    }
    if config.full_path_match {
        cmd.push("-p".into());
    }
    if config.absolute {
        cmd.push("-a".into());
    }
    if config.follow_symlinks {
        cmd.push("-L".into());
    }
    if config.hidden {
        cmd.push("-H".into());
    }
    if config.no_ignore {
        cmd.push("-I".into());
    }
    if let Some(depth) = config.depth {
        cmd.push("-d".into());
        cmd.push(depth.to_string());
    }
    for file_type in &config.types {
        cmd.push("-t".into());
        cmd.push(file_type.clone());
    }
    for ext in &config.extensions {
        cmd.push("-e".into());
        cmd.push(ext.strip_prefix('.').unwrap_or(ext).to_string());
    }
    for pattern in &config.exclude {
        cmd.push("-E".into());
        cmd.push(pattern.clone());
    }
    for size_spec in &config.size {
        cmd.push("-S".into());
        cmd.push(size_spec.clone());
    }
    if let Some(within) = &config.changed_within {
        cmd.push("--changed-within".into());
        cmd.push(within.clone());
    }
    if let Some(before) = &config.changed_before {
        cmd.push("--changed-before".into());
        cmd.push(before.clone());
    }
    if let Some(limit) = config.limit {
        cmd.push("--max-results".into());
        cmd.push(limit.to_string());
    }

    // A pattern must always be present so the roots are not parsed as one.
    match &config.pattern {
        Some(pattern) if !pattern.is_empty() => cmd.push(pattern.clone()),
        _ => cmd.push(".".into()),
    }
    cmd.extend(config.roots.iter().cloned());

    cmd
}

/// Parse fd stdout into a file list: split lines, trim, drop empties, apply
/// the optional limit.
pub fn parse_fd_output(stdout: &[u8], limit: Option<usize>) -> Vec<String> {
    let text = String::from_utf8_lossy(stdout);
    let mut files: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_substitutes_dot_pattern() {
        let config = FdCommandConfig {
            roots: vec!["src".into(), "tests".into()],
            absolute: true,
            ..Default::default()
        };
        let cmd = build_fd_command(&config);
        assert_eq!(cmd[..3], ["fd", "--color", "never"]);
        assert_eq!(cmd[cmd.len() - 3..], [".", "src", "tests"]);
    }

    #[test]
    fn pattern_precedes_roots() {
        let config = FdCommandConfig {
            roots: vec![".".into()],
            pattern: Some("*.rs".into()),
            glob: true,
            ..Default::default()
        };
        let cmd = build_fd_command(&config);
        assert!(cmd.contains(&"--glob".to_string()));
        let pattern_idx = cmd.iter().position(|a| a == "*.rs").unwrap();
        let root_idx = cmd.iter().position(|a| a == ".").unwrap();
        assert!(pattern_idx < root_idx);
    }

    #[test]
    fn extension_dots_are_stripped() {
        let config = FdCommandConfig {
            roots: vec![".".into()],
            extensions: vec![".rs".into(), "toml".into()],
            ..Default::default()
        };
        let cmd = build_fd_command(&config);
        let e_flags: Vec<_> = cmd
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-e")
            .map(|(i, _)| cmd[i + 1].clone())
            .collect();
        assert_eq!(e_flags, vec!["rs", "toml"]);
    }

    #[test]
    fn all_switches_are_emitted() {
        let config = FdCommandConfig {
            roots: vec!["a".into()],
            pattern: Some("main".into()),
            full_path_match: true,
            types: vec!["f".into()],
            exclude: vec!["target".into()],
            depth: Some(3),
            follow_symlinks: true,
            hidden: true,
            no_ignore: true,
            size: vec!["+10k".into()],
            changed_within: Some("2d".into()),
            changed_before: Some("1w".into()),
            absolute: true,
            limit: Some(100),
            ..Default::default()
        };
        let cmd = build_fd_command(&config);
        for flag in [
            "-p", "-a", "-L", "-H", "-I", "-d", "-t", "-E", "-S", "--changed-within",
            "--changed-before", "--max-results",
        ] {
            assert!(cmd.contains(&flag.to_string()), "missing {flag}");
        }
    }

    #[test]
    fn parse_trims_and_limits() {
        let stdout = b"  /a/b.rs  \n\n/c/d.rs\n/e/f.rs\n";
        let files = parse_fd_output(stdout, Some(2));
        assert_eq!(files, vec!["/a/b.rs", "/c/d.rs"]);
    }

    #[test]
    fn parse_empty_output() {
        assert!(parse_fd_output(b"", None).is_empty());
    }
}
