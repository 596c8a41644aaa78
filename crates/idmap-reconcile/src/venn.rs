//! Three-way set decomposition of two key sequences
//!
//! Given the keys of an old and a new release, [`venn`] splits them into
//! keys only in the old release, keys only in the new release, and keys in
//! both. Duplicates in the input collapse.

use crate::loader;
use idmap_common::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Venn decomposition of two key sets
///
/// The three parts are pairwise disjoint, `only_a ∪ intersection` is the
/// first input set and `only_b ∪ intersection` is the second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Venn {
    pub only_a: HashSet<String>,
    pub only_b: HashSet<String>,
    pub intersection: HashSet<String>,
}

impl Venn {
    /// Sum of the three part sizes, the denominator used in reports
    ///
    /// The parts are disjoint and cover both inputs, so this equals the size
    /// of the union of the two key sets.
    pub fn logical_total(&self) -> usize {
        self.only_a.len() + self.only_b.len() + self.intersection.len()
    }

    /// The decomposition of `(b, a)`
    pub fn swapped(self) -> Self {
        Self {
            only_a: self.only_b,
            only_b: self.only_a,
            intersection: self.intersection,
        }
    }
}

/// Decompose two key sequences
pub fn venn<A, B>(a: A, b: B) -> Venn
where
    A: IntoIterator<Item = String>,
    B: IntoIterator<Item = String>,
{
    let a: HashSet<String> = a.into_iter().collect();
    let b: HashSet<String> = b.into_iter().collect();

    let intersection = a.intersection(&b).cloned().collect();
    let only_a = a.difference(&b).cloned().collect();
    let only_b = b.difference(&a).cloned().collect();

    Venn {
        only_a,
        only_b,
        intersection,
    }
}

/// Load two flat files as whole lines and decompose them
pub fn venn_and_dump(path_a: impl AsRef<Path>, path_b: impl AsRef<Path>) -> Result<Venn> {
    let a = loader::load_lines(path_a.as_ref())?;
    let b = loader::load_lines(path_b.as_ref())?;
    let result = venn(a, b);

    debug!(
        a = %path_a.as_ref().display(),
        b = %path_b.as_ref().display(),
        only_a = result.only_a.len(),
        only_b = result.only_b.len(),
        intersection = result.intersection.len(),
        "Computed venn decomposition"
    );

    Ok(result)
}

/// Paths written by [`write_venn_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VennFiles {
    pub only_a: PathBuf,
    pub only_b: PathBuf,
    pub intersection: PathBuf,
}

/// Write each part of `venn` as a sorted, one-key-per-line file
///
/// For inputs named `a` and `b` the files are `a.only`, `b.only` and
/// `a.b.intersection`, created in `out_dir`. Inputs sharing a file name are
/// qualified by their parent directory (`old.x.txt`, `new.x.txt`), or by
/// `a`/`b` when that does not tell them apart either.
pub fn write_venn_files(
    venn: &Venn,
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<VennFiles> {
    let out_dir = out_dir.as_ref();
    let (name_a, name_b) = output_names(path_a.as_ref(), path_b.as_ref());

    fs::create_dir_all(out_dir)?;

    let files = VennFiles {
        only_a: out_dir.join(format!("{name_a}.only")),
        only_b: out_dir.join(format!("{name_b}.only")),
        intersection: out_dir.join(format!("{name_a}.{name_b}.intersection")),
    };

    write_sorted(&files.only_a, &venn.only_a)?;
    write_sorted(&files.only_b, &venn.only_b)?;
    write_sorted(&files.intersection, &venn.intersection)?;

    info!(dir = %out_dir.display(), a = %name_a, b = %name_b, "Wrote venn set files");
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parent_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
}

/// Output stems for the two inputs, never equal to each other
fn output_names(path_a: &Path, path_b: &Path) -> (String, String) {
    let name_a = file_name(path_a);
    let name_b = file_name(path_b);
    if name_a != name_b {
        return (name_a, name_b);
    }

    match (parent_name(path_a), parent_name(path_b)) {
        (Some(dir_a), Some(dir_b)) if dir_a != dir_b => {
            (format!("{dir_a}.{name_a}"), format!("{dir_b}.{name_b}"))
        },
        _ => (format!("{name_a}.a"), format!("{name_b}.b")),
    }
}

fn write_sorted(path: &Path, keys: &HashSet<String>) -> Result<()> {
    let mut keys: Vec<&String> = keys.iter().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        out.push_str(key);
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}
