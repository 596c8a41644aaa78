//! Restricting a probeset→gene mapping to genes conserved across releases
//!
//! A gene is conserved when the same gene identifier appears as a mapping
//! value in both the old and the new file. Filtering both files down to
//! conserved genes lets the report compare like with like.

use crate::loader;
use crate::venn::venn;
use idmap_common::{IdmapError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffix appended to the input file name for filtered output
pub const CONSERVED_SUFFIX: &str = ".conserved";

/// Column holding the mapped value (gene) in a two-column mapping file
const VALUE_COLUMN: usize = 1;

/// Values present in the second column of both files
pub fn conserved_values(
    old_mapping: impl AsRef<Path>,
    new_mapping: impl AsRef<Path>,
) -> Result<HashSet<String>> {
    let old = loader::load(old_mapping, ":", Some(&[VALUE_COLUMN]))?;
    let new = loader::load(new_mapping, ":", Some(&[VALUE_COLUMN]))?;
    Ok(venn(old, new).intersection)
}

/// Path of the filtered file derived from `mapping_file`
pub fn conserved_path(mapping_file: &Path) -> PathBuf {
    let mut name = mapping_file.as_os_str().to_os_string();
    name.push(CONSERVED_SUFFIX);
    PathBuf::from(name)
}

/// Keep the lines of `mapping_file` whose value is in `conserved`
///
/// Output goes to `<mapping_file>.conserved`, one retained line per line,
/// and the path is returned. An empty conserved set yields an empty file.
pub fn filter_conserved(
    conserved: &HashSet<String>,
    mapping_file: impl AsRef<Path>,
) -> Result<PathBuf> {
    let mapping_file = mapping_file.as_ref();
    let lines = loader::load_lines(mapping_file)?;

    let mut out = String::new();
    let mut kept = 0usize;

    for (index, line) in lines.iter().enumerate() {
        let fields = loader::split_fields(line);
        let value = fields
            .get(VALUE_COLUMN)
            .ok_or_else(|| IdmapError::MalformedLine {
                path: mapping_file.to_path_buf(),
                line: index + 1,
                expected: VALUE_COLUMN + 1,
                found: fields.len(),
            })?;

        if conserved.contains(*value) {
            out.push_str(line.trim());
            out.push('\n');
            kept += 1;
        }
    }

    let out_path = conserved_path(mapping_file);
    fs::write(&out_path, out)?;

    info!(
        input = %mapping_file.display(),
        output = %out_path.display(),
        kept,
        dropped = lines.len() - kept,
        "Filtered mapping to conserved values"
    );

    Ok(out_path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn genes(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keeps_only_conserved_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("probeset2gene_old.txt");
        fs::write(&input, "P1 GENE_A\nP2 GENE_B\n").unwrap();

        let out = filter_conserved(&genes(&["GENE_A"]), &input).unwrap();

        assert_eq!(out, dir.path().join("probeset2gene_old.txt.conserved"));
        assert_eq!(fs::read_to_string(&out).unwrap(), "P1 GENE_A\n");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p2g.txt");
        fs::write(&input, "P1\tG1\nP2\tG2\nP3\tG1\n").unwrap();
        let conserved = genes(&["G1"]);

        let once = filter_conserved(&conserved, &input).unwrap();
        let twice = filter_conserved(&conserved, &once).unwrap();

        assert_eq!(
            fs::read_to_string(&once).unwrap(),
            fs::read_to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_empty_conserved_set_gives_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p2g.txt");
        fs::write(&input, "P1\tG1\n").unwrap();

        let out = filter_conserved(&HashSet::new(), &input).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "");
    }

    #[test]
    fn test_single_column_line_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p2g.txt");
        fs::write(&input, "P1\tG1\nP2\n").unwrap();

        let err = filter_conserved(&genes(&["G1"]), &input).unwrap_err();
        assert!(matches!(err, IdmapError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_conserved_values_uses_gene_column() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        fs::write(&old, "P1\tG1\nP2\tG2\n").unwrap();
        fs::write(&new, "P9\tG2\nP3\tG3\n").unwrap();

        assert_eq!(conserved_values(&old, &new).unwrap(), genes(&["G2"]));
    }
}
