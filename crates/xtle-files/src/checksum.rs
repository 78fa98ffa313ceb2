//! Content fingerprints
//!
//! A fingerprint is the opaque `last_sync_hash` stored on a tracked path. It
//! is a SHA-256 of the raw file bytes in the canonical `sha256:<hex>` form.

use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX: &str = "sha256:";

/// Fingerprint raw bytes.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Fingerprint a file on disk.
///
/// Returns `Ok(None)` when the file does not exist, so a vanished file reads
/// as "no fingerprint" rather than an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn fingerprint_file(path: &Path) -> std::io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(fingerprint_bytes(&content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_known_value() {
        assert_eq!(
            fingerprint_bytes(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_content_different_fingerprint() {
        assert_ne!(fingerprint_bytes(b"aaa"), fingerprint_bytes(b"bbb"));
    }

    #[test]
    fn missing_file_has_no_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(fingerprint_file(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn file_fingerprint_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            Some(fingerprint_bytes(b"{}"))
        );
    }
}
