use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Absolute ceiling on returned search matches; not configurable by callers.
pub const MAX_RESULTS_HARD_CAP: usize = 10_000;

/// Default match limit applied when the caller does not specify one.
pub const DEFAULT_RESULTS_LIMIT: usize = 2_000;

/// Maximum syntax-tree depth the extraction walker will descend.
pub const MAX_TRAVERSAL_DEPTH: usize = 50;

/// Sibling field-declaration count above which extraction switches to batch
/// mode and primes the annotation line index once for the whole class body.
pub const FIELD_BATCH_THRESHOLD: usize = 10;

/// Default `--max-filesize` handed to ripgrep.
pub const DEFAULT_MAX_FILESIZE: &str = "1G";

/// Hard cap on `--max-filesize`, whatever the caller asks for.
pub const MAX_FILESIZE_HARD_CAP_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Maximum number of root chunks for parallel dispatch.
pub const PARALLEL_MAX_CHUNKS: usize = 4;

/// Maximum concurrently running child processes.
pub const PARALLEL_MAX_CONCURRENT: usize = 4;

/// Parse a human size string ("200K", "10M", "1G", "1024") into bytes.
pub fn parse_size_to_bytes(size: &str) -> Option<u64> {
    let s = size.trim().to_uppercase();
    if s.is_empty() {
        return None;
    }
    let (digits, multiplier) = match s.as_bytes().last() {
        Some(b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s.as_str(), 1),
    };
    let value: f64 = digits.parse().ok()?;
    if value < 0.0 {
        return None;
    }
    Some((value * multiplier as f64) as u64)
}

/// Normalize a user-supplied `max_filesize`, falling back to the default and
/// clamping to the hard cap.
pub fn normalize_max_filesize(user_value: Option<&str>) -> String {
    let Some(value) = user_value else {
        return DEFAULT_MAX_FILESIZE.to_string();
    };
    match parse_size_to_bytes(value) {
        Some(bytes) if bytes > MAX_FILESIZE_HARD_CAP_BYTES => "10G".to_string(),
        Some(_) => value.to_string(),
        None => DEFAULT_MAX_FILESIZE.to_string(),
    }
}

/// Canonicalize `path` and ensure it stays under `root`.
pub fn safe_canonicalize(path: &Path, root: &Path) -> Result<PathBuf> {
    let canonical_root = dunce::canonicalize(root)?;
    let canonical = dunce::canonicalize(path)?;
    if !canonical.starts_with(&canonical_root) {
        return Err(Error::PathOutsideProject(canonical));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_size_suffixes() {
        assert_eq!(parse_size_to_bytes("1024"), Some(1024));
        assert_eq!(parse_size_to_bytes("200K"), Some(200 * 1024));
        assert_eq!(parse_size_to_bytes("10m"), Some(10 * 1024 * 1024));
        assert_eq!(parse_size_to_bytes("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size_to_bytes("1.5K"), Some(1536));
        assert_eq!(parse_size_to_bytes("nonsense"), None);
        assert_eq!(parse_size_to_bytes(""), None);
    }

    #[test]
    fn max_filesize_defaults_and_clamps() {
        assert_eq!(normalize_max_filesize(None), "1G");
        assert_eq!(normalize_max_filesize(Some("10M")), "10M");
        assert_eq!(normalize_max_filesize(Some("50G")), "10G");
        assert_eq!(normalize_max_filesize(Some("garbage")), "1G");
    }

    #[test]
    fn safe_canonicalize_rejects_escapes() {
        let dir = tempdir().unwrap();
        let inside = dir.path().join("inner");
        std::fs::create_dir(&inside).unwrap();

        assert!(safe_canonicalize(&inside, dir.path()).is_ok());

        let outside = tempdir().unwrap();
        let err = safe_canonicalize(outside.path(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::PathOutsideProject(_)));
    }
}
