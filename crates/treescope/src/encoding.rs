//! Encoding-aware file reading.
//!
//! Source files arrive in whatever encoding their authors' editors produced.
//! The reader tries UTF-8 first, honors UTF-16 byte-order marks, then falls
//! back to Shift_JIS and finally Latin-1 before giving up.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use encoding_rs::{SHIFT_JIS, UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Read a file and return its decoded text plus the canonical name of the
/// encoding that was detected.
pub fn read_file_safe(path: &Path) -> Result<(String, &'static str)> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::Io(err),
    })?;
    decode_bytes(&bytes, path)
}

/// Decode raw bytes using the detection ladder. Exposed separately so tests
/// and in-memory callers can skip the filesystem.
pub fn decode_bytes(bytes: &[u8], path: &Path) -> Result<(String, &'static str)> {
    if bytes.is_empty() {
        return Ok((String::new(), "utf-8"));
    }

    // A BOM settles the question outright.
    if bytes.starts_with(UTF8_BOM) {
        let (text, _, _) = encoding_rs::UTF_8.decode(&bytes[UTF8_BOM.len()..]);
        return Ok((text.into_owned(), "utf-8"));
    }
    if bytes.starts_with(UTF16_LE_BOM) {
        let (text, _, _) = UTF_16LE.decode(&bytes[UTF16_LE_BOM.len()..]);
        return Ok((text.into_owned(), "utf-16le"));
    }
    if bytes.starts_with(UTF16_BE_BOM) {
        let (text, _, _) = UTF_16BE.decode(&bytes[UTF16_BE_BOM.len()..]);
        return Ok((text.into_owned(), "utf-16be"));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), "utf-8"));
    }

    // NUL bytes at this point mean binary content, not a text encoding.
    if bytes.contains(&0) {
        return Err(Error::EncodingUndetectable(path.to_path_buf()));
    }

    let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
    if !had_errors {
        return Ok((text.into_owned(), "shift_jis"));
    }

    // Latin-1 maps every byte; last resort for legacy single-byte files.
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    Ok((text.into_owned(), "latin-1"))
}

/// Map user spellings of encoding names to the canonical form ripgrep's
/// `--encoding` flag accepts.
pub fn normalize_encoding_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('-', "_");
    match lowered.as_str() {
        "utf8" | "utf_8" => "utf-8".to_string(),
        "utf16" | "utf_16" | "utf_16le" | "utf16le" => "utf-16le".to_string(),
        "utf_16be" | "utf16be" => "utf-16be".to_string(),
        "sjis" | "shift_jis" | "shiftjis" | "cp932" | "ms932" | "windows_31j" => {
            "shift_jis".to_string()
        }
        "latin1" | "latin_1" | "iso_8859_1" | "iso8859_1" | "windows_1252" | "cp1252" => {
            "latin-1".to_string()
        }
        _ => name.trim().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn probe(bytes: &[u8]) -> (String, &'static str) {
        decode_bytes(bytes, &PathBuf::from("probe.txt")).unwrap()
    }

    #[test]
    fn plain_utf8_round_trips() {
        let (text, encoding) = probe("fn main() {}".as_bytes());
        assert_eq!(text, "fn main() {}");
        assert_eq!(encoding, "utf-8");
    }

    #[test]
    fn bom_only_file_yields_empty_text() {
        let (text, encoding) = probe(&[0xEF, 0xBB, 0xBF]);
        assert!(text.is_empty());
        assert_eq!(encoding, "utf-8");
    }

    #[test]
    fn utf16le_bom_detected() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding) = probe(&bytes);
        assert_eq!(text, "hi");
        assert_eq!(encoding, "utf-16le");
    }

    #[test]
    fn shift_jis_text_detected() {
        // "テスト" in Shift_JIS.
        let bytes = [0x83, 0x65, 0x83, 0x58, 0x83, 0x67];
        let (text, encoding) = probe(&bytes);
        assert_eq!(text, "テスト");
        assert_eq!(encoding, "shift_jis");
    }

    #[test]
    fn binary_content_is_undetectable() {
        let err = decode_bytes(&[0x00, 0xFF, 0x00, 0xFE], &PathBuf::from("blob.bin")).unwrap_err();
        assert!(matches!(err, Error::EncodingUndetectable(_)));
    }

    #[test]
    fn missing_file_maps_to_file_not_found() {
        let dir = tempdir().unwrap();
        let err = read_file_safe(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn encoding_names_normalize() {
        assert_eq!(normalize_encoding_name("SJIS"), "shift_jis");
        assert_eq!(normalize_encoding_name("cp932"), "shift_jis");
        assert_eq!(normalize_encoding_name("UTF-8"), "utf-8");
        assert_eq!(normalize_encoding_name("latin1"), "latin-1");
        assert_eq!(normalize_encoding_name("euc-jp"), "euc-jp");
    }
}
