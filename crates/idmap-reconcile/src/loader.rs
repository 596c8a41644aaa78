//! Flat mapping file loader
//!
//! Dump files are plain text, one record per line, fields separated by
//! whitespace (normally a single tab). There is no header, no quoting and no
//! comment syntax.
//!
//! # Example
//!
//! ```no_run
//! use idmap_reconcile::loader;
//!
//! # fn main() -> idmap_common::Result<()> {
//! // Whole lines, e.g. "202763_at\tENST00000393126"
//! let rows = loader::load_lines("probeset2transcript_old.txt")?;
//!
//! // Only the gene column
//! let genes = loader::load("probeset2gene_old.txt", ":", Some(&[1]))?;
//! # Ok(())
//! # }
//! ```

use idmap_common::checksum::open_input;
use idmap_common::{IdmapError, Result};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Load a flat file into an ordered sequence of comparison keys
///
/// Without `columns` every line (trailing whitespace removed) is returned
/// as-is, in file order. With `columns` each line is split on whitespace and
/// the requested fields are joined with `separator` in the requested order.
/// A line with too few fields fails the whole load.
pub fn load(
    path: impl AsRef<Path>,
    separator: &str,
    columns: Option<&[usize]>,
) -> Result<Vec<String>> {
    let path = path.as_ref();

    if let Some(columns) = columns {
        if columns.is_empty() {
            return Err(IdmapError::config(format!(
                "Column projection for {} needs at least one column",
                path.display()
            )));
        }
    }

    let reader = BufReader::new(open_input(path)?);
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();

        let row = match columns {
            None => line.to_string(),
            Some(columns) => project(line, columns, separator).ok_or_else(|| {
                IdmapError::MalformedLine {
                    path: path.to_path_buf(),
                    line: index + 1,
                    expected: required_fields(columns),
                    found: split_fields(line).len(),
                }
            })?,
        };

        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded mapping file");
    Ok(rows)
}

/// Load whole lines, no projection
pub fn load_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    load(path, "", None)
}

/// Split a record into its whitespace-separated fields
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Join the requested fields of `line`, or `None` if any is missing
pub fn project(line: &str, columns: &[usize], separator: &str) -> Option<String> {
    let fields = split_fields(line);
    let picked = columns
        .iter()
        .map(|&c| fields.get(c).copied())
        .collect::<Option<Vec<&str>>>()?;
    Some(picked.join(separator))
}

fn required_fields(columns: &[usize]) -> usize {
    columns.iter().max().map_or(0, |&c| c + 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_whole_lines_keep_order_and_strip_trailing_whitespace() {
        let file = fixture("P2\tT2  \r\nP1\tT1\nP2\tT2\n");
        let rows = load_lines(file.path()).unwrap();
        assert_eq!(rows, vec!["P2\tT2", "P1\tT1", "P2\tT2"]);
    }

    #[test]
    fn test_projection_joins_in_requested_order() {
        let file = fixture("P1\tG1\tgene\nP2 G2  gene\n");
        let rows = load(file.path(), ":", Some(&[1, 0])).unwrap();
        assert_eq!(rows, vec!["G1:P1", "G2:P2"]);
    }

    #[test]
    fn test_single_column_projection() {
        let file = fixture("P1\tG1\nP2\tG2\n");
        let rows = load(file.path(), ":", Some(&[1])).unwrap();
        assert_eq!(rows, vec!["G1", "G2"]);
    }

    #[test]
    fn test_short_line_is_malformed() {
        let file = fixture("P1\tG1\nP2\n");
        let err = load(file.path(), ":", Some(&[1])).unwrap_err();
        match err {
            IdmapError::MalformedLine {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_comments_are_not_stripped() {
        let file = fixture("# not a comment here\nP1\tT1\n");
        let rows = load_lines(file.path()).unwrap();
        assert_eq!(rows[0], "# not a comment here");
    }

    #[test]
    fn test_missing_file() {
        let err = load_lines("/no/such/probeset2gene.txt").unwrap_err();
        assert!(matches!(err, IdmapError::MissingFile(_)));
    }

    #[test]
    fn test_empty_projection_rejected() {
        let file = fixture("P1\tG1\n");
        assert!(matches!(
            load(file.path(), ":", Some(&[])),
            Err(IdmapError::Config(_))
        ));
    }
}
