//! Plain-text report rendering
//!
//! Tables are fixed-width: a left-aligned label, a right-aligned count and
//! the count as a percentage of a caller-supplied total. A zero total is
//! rendered as `N/A`.

use crate::loader;
use crate::venn::Venn;
use idmap_common::checksum::open_input;
use idmap_common::{IdmapError, Result};
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Width of the label column
pub const LABEL_WIDTH: usize = 20;

/// Width of the count column
pub const COUNT_WIDTH: usize = 10;

/// Width of the percentage column, including the `%` sign
pub const PERCENT_WIDTH: usize = 10;

/// Rendered in place of a percentage when the total is zero
pub const NO_PERCENTAGE: &str = "N/A";

/// One table row: `count` out of `total`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub count: usize,
    pub total: usize,
}

impl TableRow {
    pub fn new(label: impl Into<String>, count: usize, total: usize) -> Self {
        Self {
            label: label.into(),
            count,
            total,
        }
    }

    /// Percentage of `total`, `None` when the total is zero
    pub fn percentage(&self) -> Option<f64> {
        (self.total > 0).then(|| self.count as f64 / self.total as f64 * 100.0)
    }
}

/// Render rows as aligned text, one newline-terminated line per row
pub fn format_table(rows: &[TableRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let percentage = match row.percentage() {
            Some(p) => format!("{p:.2}%"),
            None => NO_PERCENTAGE.to_string(),
        };
        out.push_str(&format!(
            "{:<label$}{:>count$}{:>pct$}\n",
            row.label,
            row.count,
            percentage,
            label = LABEL_WIDTH,
            count = COUNT_WIDTH,
            pct = PERCENT_WIDTH,
        ));
    }
    out
}

/// Titled table of old/new/same mappings for one venn decomposition
///
/// Every row is measured against [`Venn::logical_total`].
pub fn summary(title: &str, venn: &Venn) -> String {
    let total = venn.logical_total();
    format!(
        "{title}:\n{}",
        format_table(&[
            TableRow::new("old mappings", venn.only_a.len(), total),
            TableRow::new("new mappings", venn.only_b.len(), total),
            TableRow::new("same mappings", venn.intersection.len(), total),
        ])
    )
}

/// Distinct keys and values seen in a two-column mapping file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedItems {
    pub probesets: usize,
    pub genes: usize,
}

/// Count distinct probesets (first column) and genes (second column)
pub fn mapped_items(mapping_file: impl AsRef<Path>) -> Result<MappedItems> {
    let path = mapping_file.as_ref();
    let mut probesets = HashSet::new();
    let mut genes = HashSet::new();

    for (index, line) in loader::load_lines(path)?.iter().enumerate() {
        match loader::split_fields(line).as_slice() {
            [probeset, gene, ..] => {
                probesets.insert(probeset.to_string());
                genes.insert(gene.to_string());
            },
            fields => {
                return Err(IdmapError::MalformedLine {
                    path: path.to_path_buf(),
                    line: index + 1,
                    expected: 2,
                    found: fields.len(),
                })
            },
        }
    }

    Ok(MappedItems {
        probesets: probesets.len(),
        genes: genes.len(),
    })
}

/// Read a single-number count file (first line, trimmed)
pub fn read_count(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut first = String::new();
    BufReader::new(open_input(path)?).read_line(&mut first)?;

    let first = first.trim();
    first.parse().map_err(|_| {
        IdmapError::invalid_value(path, 1, format!("expected a count, found '{first}'"))
    })
}

/// Full comparison report between an old and a new release
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub old_name: String,
    pub new_name: String,
    pub mapped: MappedItems,
    pub gene_total: usize,
    pub probeset_total: usize,
    /// Titled decompositions in the order they are rendered
    pub sections: Vec<(String, Venn)>,
}

impl ComparisonReport {
    pub fn render(&self) -> String {
        let mut report = format!("Mapped items in new database ({}):\n", self.new_name);
        report.push_str(&format_table(&[
            TableRow::new("Genes", self.mapped.genes, self.gene_total),
            TableRow::new("Probesets", self.mapped.probesets, self.probeset_total),
        ]));

        report.push_str(&format!(
            "\n\nComparing mappings in old database ({}) and new database ({})\n\n",
            self.old_name, self.new_name
        ));

        let sections: Vec<String> = self
            .sections
            .iter()
            .map(|(title, venn)| summary(title, venn))
            .collect();
        report.push_str(&sections.join("\n"));

        report
    }
}
