//! idmap-reconcile - Identifier mapping comparison and lineage patches

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idmap_common::logging::{init_logging, LogConfig, LogLevel};
use idmap_reconcile::{compare, conserved, lineage, loader, report, venn, Config};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "idmap-reconcile")]
#[command(author, version, about = "Compare identifier mappings between two releases")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for reports, venn sets, patches and the cache manifest
    #[arg(short, long, global = true, env = "IDMAP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Always recompute derived files (overrides IDMAP_USE_CACHE)
    #[arg(long, global = true)]
    no_cache: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare probeset→transcript and probeset→gene mappings of two releases
    Compare {
        /// Property file of the old release
        #[arg(long)]
        old_db: PathBuf,

        /// Property file of the new release
        #[arg(long)]
        new_db: PathBuf,

        /// Old probeset→transcript dump
        #[arg(long)]
        old_transcripts: PathBuf,

        /// New probeset→transcript dump
        #[arg(long)]
        new_transcripts: PathBuf,

        /// Old probeset→gene dump
        #[arg(long)]
        old_genes: PathBuf,

        /// New probeset→gene dump
        #[arg(long)]
        new_genes: PathBuf,

        /// File holding the number of genes in the new release
        #[arg(long)]
        gene_count: PathBuf,

        /// File holding the number of probesets in the new release
        #[arg(long)]
        probeset_count: PathBuf,
    },

    /// Venn decomposition of two flat files
    Venn {
        a: PathBuf,
        b: PathBuf,

        /// Compare only these zero-based columns (e.g. "1" or "0,1")
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<usize>>,
    },

    /// Filter two probeset→gene dumps down to genes present in both
    Conserved {
        #[arg(long)]
        old_genes: PathBuf,

        #[arg(long)]
        new_genes: PathBuf,
    },

    /// Build a stable_id_event patch from two identity dumps
    Lineage {
        /// Identity dump of the source release
        #[arg(long)]
        source: PathBuf,

        /// Identity dump of the target release
        #[arg(long)]
        target: PathBuf,

        /// Mapping session the events belong to
        #[arg(long)]
        session_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("idmap-reconcile")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    let mut config = Config::load()?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if cli.no_cache {
        config.use_cache = false;
    }

    match cli.command {
        Command::Compare {
            old_db,
            new_db,
            old_transcripts,
            new_transcripts,
            old_genes,
            new_genes,
            gene_count,
            probeset_count,
        } => {
            let inputs = compare::CompareInputs {
                old_db,
                new_db,
                old_transcripts,
                new_transcripts,
                old_genes,
                new_genes,
                gene_count,
                probeset_count,
            };
            let outcome = compare::run(&config, &inputs).await?;
            println!("{}", outcome.text);
            println!("Above summary stored in {}.", outcome.report_path.display());
        },
        Command::Venn { a, b, columns } => {
            let result = match columns {
                Some(columns) => venn::venn(
                    loader::load(&a, &config.key_separator, Some(columns.as_slice()))?,
                    loader::load(&b, &config.key_separator, Some(columns.as_slice()))?,
                ),
                None => venn::venn_and_dump(&a, &b)?,
            };
            std::fs::create_dir_all(&config.output_dir)?;
            let files = venn::write_venn_files(&result, &a, &b, &config.output_dir)?;
            print!("{}", report::summary(&format!("{} vs {}", a.display(), b.display()), &result));
            info!(?files, "Venn decomposition complete");
        },
        Command::Conserved {
            old_genes,
            new_genes,
        } => {
            let genes = conserved::conserved_values(&old_genes, &new_genes)?;
            let old = conserved::filter_conserved(&genes, &old_genes)?;
            let new = conserved::filter_conserved(&genes, &new_genes)?;
            println!("{} conserved genes", genes.len());
            println!("{}", old.display());
            println!("{}", new.display());
        },
        Command::Lineage {
            source,
            target,
            session_id,
        } => {
            let source_ids = lineage::load_identity_map(&source)
                .with_context(|| format!("Failed to load source identities {}", source.display()))?;
            let target_ids = lineage::load_identity_map(&target)
                .with_context(|| format!("Failed to load target identities {}", target.display()))?;

            let patch = lineage::reconcile(&source_ids, &target_ids, session_id)?;
            let files = lineage::write_patch(&patch, &config.output_dir)?;

            println!("created: {}", patch.created);
            println!("deleted: {}", patch.deleted);
            println!("mapped: {}", patch.mapped);
            println!("Patch rows written to {}", files.rows.display());
            println!("Load instruction written to {}", files.load_instruction.display());
        },
    }

    Ok(())
}
