//! ID Mapping Reconciliation Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Compares identifier mappings between two releases of an annotation
//! database and produces operator reports and load-ready lineage patches.
//!
//! # Components
//!
//! - **loader**: flat whitespace-separated dump files
//! - **venn**: old-only / new-only / shared decomposition
//! - **conserved**: restrict gene mappings to genes present in both releases
//! - **report**: aligned count/percentage tables and the comparison report
//! - **lineage**: deleted / mapped / created stable id events
//!
//! # Example
//!
//! ```no_run
//! use idmap_reconcile::{report, venn};
//!
//! fn main() -> anyhow::Result<()> {
//!     let v = venn::venn_and_dump("probeset2gene_old.txt", "probeset2gene_new.txt")?;
//!     print!("{}", report::summary("probeset2gene", &v));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod compare;
pub mod config;
pub mod conserved;
pub mod lineage;
pub mod loader;
pub mod properties;
pub mod report;
pub mod venn;

pub use config::Config;
