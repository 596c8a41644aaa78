//! Checksum utilities for fingerprinting input files
//!
//! Derived files (conserved mappings, venn sets) are keyed by a fingerprint
//! of everything that went into them: the content of each input file plus
//! any operation parameters.

use crate::error::{IdmapError, Result};
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Checksum algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
            ChecksumAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Open a file, reporting an absent file as [`IdmapError::MissingFile`]
pub fn open_input(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IdmapError::MissingFile(path.to_path_buf()),
        _ => IdmapError::Io(e),
    })
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = open_input(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            feed(reader, |chunk| hasher.update(chunk))?;
            Ok(hex::encode(hasher.finalize()))
        },
        ChecksumAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            feed(reader, |chunk| hasher.update(chunk))?;
            Ok(hex::encode(hasher.finalize()))
        },
    }
}

fn feed<R: Read>(reader: &mut R, mut update: impl FnMut(&[u8])) -> Result<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        update(&buffer[..bytes_read]);
    }
}

/// Verify checksum for a file
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<bool> {
    let actual = compute_file_checksum(path, algorithm)?;
    if actual == expected {
        Ok(true)
    } else {
        Err(IdmapError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Incremental SHA-256 fingerprint over an operation's inputs
///
/// # Example
///
/// ```no_run
/// use idmap_common::checksum::Fingerprint;
///
/// # fn main() -> idmap_common::Result<()> {
/// let key = Fingerprint::new("conserved")
///     .file("probeset2gene_old.txt")?
///     .param("GENE_A")
///     .finish();
/// # Ok(())
/// # }
/// ```
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Start a fingerprint for the named operation
    pub fn new(operation: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        hasher.update([0u8]);
        Self { hasher }
    }

    /// Mix in the full content of a file
    pub fn file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let mut file = open_input(path)?;
        let hasher = &mut self.hasher;
        feed(&mut file, |chunk| hasher.update(chunk))?;
        self.hasher.update([0u8]);
        Ok(self)
    }

    /// Mix in a parameter value
    pub fn param(mut self, value: &str) -> Self {
        self.hasher.update(value.as_bytes());
        self.hasher.update([0u8]);
        self
    }

    /// Hex digest
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_compute_checksum_sha256() {
        let data = b"hello world";
        let mut cursor = Cursor::new(data);
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = compute_file_checksum("/definitely/not/here.txt", ChecksumAlgorithm::Sha256)
            .unwrap_err();
        assert!(matches!(err, IdmapError::MissingFile(_)));
    }

    #[test]
    fn test_fingerprint_depends_on_content_and_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p2g.txt");
        std::fs::write(&path, "P1\tG1\n").unwrap();

        let a = Fingerprint::new("conserved").file(&path).unwrap().param("G1").finish();
        let b = Fingerprint::new("conserved").file(&path).unwrap().param("G1").finish();
        let c = Fingerprint::new("conserved").file(&path).unwrap().param("G2").finish();
        assert_eq!(a, b);
        assert_ne!(a, c);

        std::fs::write(&path, "P1\tG2\n").unwrap();
        let d = Fingerprint::new("conserved").file(&path).unwrap().param("G1").finish();
        assert_ne!(a, d);
    }

    #[test]
    fn test_verify_file_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "hello world").unwrap();

        let err = verify_file_checksum(&path, "deadbeef", ChecksumAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, IdmapError::ChecksumMismatch { .. }));
    }
}
