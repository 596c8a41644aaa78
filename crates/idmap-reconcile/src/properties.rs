//! Release property files
//!
//! Each release is described by a small `key value` file (host, port,
//! database, ...). Lines starting with `#` are comments. Without an explicit
//! separator the key is the first whitespace-delimited token and the value is
//! the rest of the line; with a separator (e.g. `=`) the line is split at its
//! first occurrence.

use idmap_common::checksum::open_input;
use idmap_common::{IdmapError, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Property naming the database of a release
pub const DATABASE_KEY: &str = "database";

/// Parsed property file
pub type Properties = BTreeMap<String, String>;

/// Load a property file
pub fn load_properties(path: impl AsRef<Path>, separator: Option<&str>) -> Result<Properties> {
    let path = path.as_ref();
    let reader = BufReader::new(open_input(path)?);
    let mut properties = Properties::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let entry = match separator {
            Some(sep) => line
                .split_once(sep)
                .map(|(k, v)| (k.trim(), v.trim())),
            None => line
                .split_once(char::is_whitespace)
                .map(|(k, v)| (k, v.trim())),
        };

        match entry {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                properties.insert(key.to_string(), value.to_string());
            },
            _ => {
                return Err(IdmapError::MalformedLine {
                    path: path.to_path_buf(),
                    line: index + 1,
                    expected: 2,
                    found: 1,
                })
            },
        }
    }

    Ok(properties)
}

/// Display name of a release: its `database` property, else the file stem
pub fn release_name(properties: &Properties, path: &Path) -> String {
    properties
        .get(DATABASE_KEY)
        .cloned()
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| path.display().to_string())
}
