//! ID Mapping Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging, and file fingerprinting for the
//! identifier reconciliation workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`IdmapError`] and the [`Result`] alias used by the
//!   reconciliation engine
//! - **Checksums**: file fingerprints used to key cached derived files
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use idmap_common::{Result, IdmapError};
//! use idmap_common::checksum::{compute_file_checksum, ChecksumAlgorithm};
//!
//! fn fingerprint(path: &str) -> Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Sha256)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{IdmapError, Result};
