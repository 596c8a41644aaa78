//! Old-vs-new release comparison
//!
//! Drives the whole probeset mapping comparison: derives the conserved
//! mappings, decomposes the three mapping categories, writes the venn set
//! files and assembles `report.txt`.

use crate::cache::DerivedCache;
use crate::config::Config;
use crate::conserved::{conserved_values, filter_conserved};
use crate::properties::{load_properties, release_name};
use crate::report::{mapped_items, read_count, ComparisonReport};
use crate::venn::{venn_and_dump, write_venn_files, Venn};
use anyhow::{Context, Result};
use idmap_common::checksum::Fingerprint;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Section titles, in report order
pub const SECTION_TITLES: [&str; 3] = [
    "probeset2transcript",
    "probeset2gene",
    "probeset2gene_conserved",
];

/// Input files for one comparison
///
/// All mapping files are two-column `probeset<TAB>accession` dumps.
#[derive(Debug, Clone)]
pub struct CompareInputs {
    /// Property file of the old release
    pub old_db: PathBuf,
    /// Property file of the new release
    pub new_db: PathBuf,
    pub old_transcripts: PathBuf,
    pub new_transcripts: PathBuf,
    pub old_genes: PathBuf,
    pub new_genes: PathBuf,
    /// Single-number file: all genes in the new release
    pub gene_count: PathBuf,
    /// Single-number file: all probesets in the new release
    pub probeset_count: PathBuf,
}

/// What a comparison produced
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub report: ComparisonReport,
    pub text: String,
    pub report_path: PathBuf,
    pub conserved_files: (PathBuf, PathBuf),
}

/// Run the comparison and write every artifact into `config.output_dir`
pub async fn run(config: &Config, inputs: &CompareInputs) -> Result<CompareOutcome> {
    let old_props = load_properties(&inputs.old_db, None)
        .with_context(|| format!("Failed to read {}", inputs.old_db.display()))?;
    let new_props = load_properties(&inputs.new_db, None)
        .with_context(|| format!("Failed to read {}", inputs.new_db.display()))?;
    let old_name = release_name(&old_props, &inputs.old_db);
    let new_name = release_name(&new_props, &inputs.new_db);

    info!(old = %old_name, new = %new_name, "Comparing probeset mappings");

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let mut cache = if config.use_cache {
        DerivedCache::open(&config.output_dir)?
    } else {
        DerivedCache::disabled()
    };

    let conserved_files = derive_conserved(&mut cache, &inputs.old_genes, &inputs.new_genes)?;

    let mapped = mapped_items(&inputs.new_genes)?;
    let gene_total = read_count(&inputs.gene_count)?;
    let probeset_total = read_count(&inputs.probeset_count)?;

    let pairs = [
        (inputs.old_transcripts.clone(), inputs.new_transcripts.clone()),
        (inputs.old_genes.clone(), inputs.new_genes.clone()),
        conserved_files.clone(),
    ];

    let (transcripts, genes, conserved) = tokio::try_join!(
        decompose(pairs[0].clone()),
        decompose(pairs[1].clone()),
        decompose(pairs[2].clone()),
    )?;

    let mut sections = Vec::with_capacity(SECTION_TITLES.len());
    let venns = [transcripts, genes, conserved];
    for ((title, venn), (a, b)) in SECTION_TITLES.iter().zip(venns).zip(&pairs) {
        write_venn_files(&venn, a, b, &config.output_dir)?;
        sections.push((title.to_string(), venn));
    }

    let report = ComparisonReport {
        old_name,
        new_name,
        mapped,
        gene_total,
        probeset_total,
        sections,
    };
    let text = report.render();

    let report_path = config.report_path();
    fs::write(&report_path, &text)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    info!(path = %report_path.display(), "Wrote comparison report");

    Ok(CompareOutcome {
        report,
        text,
        report_path,
        conserved_files,
    })
}

/// Filter both gene mappings to conserved genes, reusing cached outputs
///
/// The conserved set depends only on the two input files, so the cache key
/// is their content plus the file being filtered.
fn derive_conserved(
    cache: &mut DerivedCache,
    old_genes: &Path,
    new_genes: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let mut conserved: Option<HashSet<String>> = None;
    let mut outputs = Vec::with_capacity(2);

    for target in [old_genes, new_genes] {
        let fingerprint = Fingerprint::new("conserved")
            .file(old_genes)?
            .file(new_genes)?
            .param(&target.display().to_string())
            .finish();

        let output = cache.get_or_create("conserved", &fingerprint, || {
            if conserved.is_none() {
                conserved = Some(conserved_values(old_genes, new_genes)?);
            }
            let genes = conserved.get_or_insert_with(HashSet::new);
            filter_conserved(genes, target)
        })?;
        outputs.push(output);
    }

    let new = outputs.pop().context("missing conserved output for new release")?;
    let old = outputs.pop().context("missing conserved output for old release")?;
    Ok((old, new))
}

async fn decompose((a, b): (PathBuf, PathBuf)) -> Result<Venn> {
    let label = format!("{} vs {}", a.display(), b.display());
    let venn = tokio::task::spawn_blocking(move || venn_and_dump(&a, &b))
        .await
        .with_context(|| format!("Comparison task failed: {label}"))??;
    Ok(venn)
}
