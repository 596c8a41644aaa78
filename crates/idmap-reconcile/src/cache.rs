//! Cache of derived files
//!
//! Derived files (for example the `.conserved` mappings) are recorded in a
//! JSON manifest in the output directory, keyed by a fingerprint of the
//! operation and its inputs. A later run with identical inputs reuses the
//! recorded file as long as it is still present and unmodified.
//!
//! The reconciliation functions never look at the cache; callers wrap them.

use chrono::{DateTime, Utc};
use idmap_common::checksum::{compute_file_checksum, verify_file_checksum, ChecksumAlgorithm};
use idmap_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Manifest file name inside the cache directory
pub const MANIFEST_FILE_NAME: &str = ".idmap-cache.json";

/// A recorded derived file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub operation: String,
    pub output: PathBuf,
    pub output_checksum: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: BTreeMap<String, CacheEntry>,
}

/// Fingerprint-keyed record of derived files
pub struct DerivedCache {
    manifest_path: Option<PathBuf>,
    manifest: Manifest,
}

impl DerivedCache {
    /// Open (or start) the cache manifest in `dir`
    ///
    /// An unreadable manifest is discarded with a warning.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = dir.as_ref().join(MANIFEST_FILE_NAME);

        let manifest = if manifest_path.exists() {
            let raw = fs::read_to_string(&manifest_path)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(
                    path = %manifest_path.display(),
                    error = %e,
                    "Discarding unreadable cache manifest"
                );
                Manifest::default()
            })
        } else {
            Manifest::default()
        };

        debug!(
            path = %manifest_path.display(),
            entries = manifest.entries.len(),
            "Opened derived file cache"
        );

        Ok(Self {
            manifest_path: Some(manifest_path),
            manifest,
        })
    }

    /// A cache that never hits and never persists
    pub fn disabled() -> Self {
        Self {
            manifest_path: None,
            manifest: Manifest::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.manifest_path.is_some()
    }

    /// Recorded entry for `fingerprint`, if any
    pub fn entry(&self, fingerprint: &str) -> Option<&CacheEntry> {
        self.manifest.entries.get(fingerprint)
    }

    /// Return the recorded output for `fingerprint`, or run `create` and record it
    pub fn get_or_create<F>(
        &mut self,
        operation: &str,
        fingerprint: &str,
        create: F,
    ) -> Result<PathBuf>
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        if let Some(hit) = self.valid_hit(fingerprint) {
            debug!(operation, output = %hit.display(), "Reusing cached derived file");
            return Ok(hit);
        }

        let output = create()?;

        if let Some(ref manifest_path) = self.manifest_path {
            let entry = CacheEntry {
                operation: operation.to_string(),
                output: output.clone(),
                output_checksum: compute_file_checksum(&output, ChecksumAlgorithm::Sha256)?,
                created_at: Utc::now(),
            };
            self.manifest.entries.insert(fingerprint.to_string(), entry);
            fs::write(manifest_path, serde_json::to_string_pretty(&self.manifest)?)?;
        }

        Ok(output)
    }

    fn valid_hit(&self, fingerprint: &str) -> Option<PathBuf> {
        self.manifest_path.as_ref()?;
        let entry = self.manifest.entries.get(fingerprint)?;

        let verified =
            verify_file_checksum(&entry.output, &entry.output_checksum, ChecksumAlgorithm::Sha256);
        match verified {
            Ok(_) => Some(entry.output.clone()),
            Err(e) => {
                debug!(output = %entry.output.display(), error = %e, "Stale cache entry");
                None
            },
        }
    }
}
