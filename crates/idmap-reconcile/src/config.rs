//! Configuration management
//!
//! Values come from the environment (a `.env` file is honoured) and can be
//! overridden per invocation by command-line flags.

use idmap_common::{IdmapError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default directory for reports, venn sets, patches and the cache manifest.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Default separator when several columns form one comparison key.
pub const DEFAULT_KEY_SEPARATOR: &str = ":";

/// Report file name inside the output directory.
pub const REPORT_FILE_NAME: &str = "report.txt";

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Where every artifact is written
    pub output_dir: PathBuf,

    /// Separator for multi-column comparison keys
    pub key_separator: String,

    /// Reuse derived files whose inputs are unchanged
    pub use_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            key_separator: DEFAULT_KEY_SEPARATOR.to_string(),
            use_cache: true,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `IDMAP_OUTPUT_DIR`
    /// - `IDMAP_KEY_SEPARATOR`
    /// - `IDMAP_USE_CACHE` (true/false)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Config {
            output_dir: std::env::var("IDMAP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            key_separator: std::env::var("IDMAP_KEY_SEPARATOR")
                .unwrap_or(defaults.key_separator),
            use_cache: std::env::var("IDMAP_USE_CACHE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.use_cache),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.key_separator.is_empty() {
            return Err(IdmapError::config("Key separator cannot be empty"));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(IdmapError::config("Output directory cannot be empty"));
        }

        Ok(())
    }

    /// Path of the comparison report
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE_NAME)
    }
}
