//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Two releases of probeset mappings with known venn sizes
///
/// - transcripts: 1 old-only, 1 new-only, 1 shared
/// - genes: 2 old-only, 2 new-only, 1 shared
/// - conserved genes are G1 and G3
pub struct ReleasePair {
    pub old_db: PathBuf,
    pub new_db: PathBuf,
    pub old_transcripts: PathBuf,
    pub new_transcripts: PathBuf,
    pub old_genes: PathBuf,
    pub new_genes: PathBuf,
    pub gene_count: PathBuf,
    pub probeset_count: PathBuf,
}

impl ReleasePair {
    pub fn create(dir: &Path) -> Self {
        Self {
            old_db: write_file(
                dir,
                "old.properties",
                "# old\nhost localhost\nport 3306\ndatabase core_30\n",
            ),
            new_db: write_file(
                dir,
                "new.properties",
                "host localhost\nport 3306\ndatabase core_31\n",
            ),
            old_transcripts: write_file(dir, "probeset2transcript_old.txt", "P1\tT1\nP2\tT2\n"),
            new_transcripts: write_file(dir, "probeset2transcript_new.txt", "P2\tT2\nP3\tT3\n"),
            old_genes: write_file(dir, "probeset2gene_old.txt", "P1\tG1\nP2\tG2\nP3\tG3\n"),
            new_genes: write_file(dir, "probeset2gene_new.txt", "P1\tG1\nP2\tG4\nP4\tG3\n"),
            gene_count: write_file(dir, "gene_count.txt", "6\n"),
            probeset_count: write_file(dir, "probeset_count.txt", "4\n"),
        }
    }
}

/// One formatted report row
pub fn row(label: &str, count: usize, percentage: &str) -> String {
    format!("{:<20}{:>10}{:>10}", label, count, percentage)
}
