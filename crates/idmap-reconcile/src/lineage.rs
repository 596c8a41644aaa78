//! Stable identifier lineage patches
//!
//! Compares the stable identifiers of two releases and produces rows for the
//! `stable_id_event` table:
//!
//! - **deleted**: in the source release only, `(old_id, old_version, \N, 0, session, type)`
//! - **mapped**: in both, `(old_id, old_version, new_id, new_version, session, type)`
//! - **created**: in the target release only, `(\N, 0, new_id, new_version, session, type)`
//!
//! Rows are written tab-separated with `\N` as the bulk loader's null marker,
//! next to a one-line `LOAD DATA` instruction that references them.

use crate::loader;
use idmap_common::{IdmapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Patch rows file name
pub const PATCH_FILE_NAME: &str = "stable_id_event_retrofit_created_deleted_mapped.txt";

/// Load instruction file name
pub const LOAD_FILE_NAME: &str = "stable_id_event_retrofit_created_deleted_mapped.sql";

/// Table the patch is loaded into
pub const EVENT_TABLE: &str = "stable_id_event";

/// Bulk loader null marker
pub const NULL_MARKER: &str = "\\N";

/// Kind of annotated entity a stable identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Gene,
    Transcript,
    Translation,
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gene" => Ok(EntityType::Gene),
            "transcript" => Ok(EntityType::Transcript),
            "translation" => Ok(EntityType::Translation),
            other => Err(format!("unknown entity type '{other}'")),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Gene => write!(f, "gene"),
            EntityType::Transcript => write!(f, "transcript"),
            EntityType::Translation => write!(f, "translation"),
        }
    }
}

/// One stable identifier as it exists in a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub stable_id: String,
    pub version: u32,
    pub entity_type: EntityType,
}

impl IdentityRecord {
    pub fn new(stable_id: impl Into<String>, version: u32, entity_type: EntityType) -> Self {
        Self {
            stable_id: stable_id.into(),
            version,
            entity_type,
        }
    }
}

/// Stable id → record for one release
pub type IdentityMap = HashMap<String, IdentityRecord>;

/// Load a `stable_id version entity_type` dump
///
/// A stable id listed twice keeps its last record.
pub fn load_identity_map(path: impl AsRef<Path>) -> Result<IdentityMap> {
    let path = path.as_ref();
    let rows = loader::load_lines(path)?;
    let mut map = IdentityMap::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let line = index + 1;
        let fields = loader::split_fields(row);
        let [stable_id, version, entity_type, ..] = fields[..] else {
            return Err(IdmapError::MalformedLine {
                path: path.to_path_buf(),
                line,
                expected: 3,
                found: fields.len(),
            });
        };

        let version = version.parse::<u32>().map_err(|_| {
            IdmapError::invalid_value(path, line, format!("invalid version '{version}'"))
        })?;
        let entity_type = entity_type
            .parse::<EntityType>()
            .map_err(|msg| IdmapError::invalid_value(path, line, msg))?;

        let record = IdentityRecord::new(stable_id, version, entity_type);
        if map.insert(stable_id.to_string(), record).is_some() {
            warn!(path = %path.display(), line, stable_id, "Duplicate stable id, keeping last");
        }
    }

    Ok(map)
}

/// How a stable id moved between releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lineage {
    Deleted,
    Mapped,
    Created,
}

/// One `stable_id_event` row; `None` ids are written as [`NULL_MARKER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRow {
    pub old_stable_id: Option<String>,
    pub old_version: u32,
    pub new_stable_id: Option<String>,
    pub new_version: u32,
    pub mapping_session_id: u64,
    pub entity_type: EntityType,
}

impl PatchRow {
    fn deleted(old: &IdentityRecord, session: u64) -> Self {
        Self {
            old_stable_id: Some(old.stable_id.clone()),
            old_version: old.version,
            new_stable_id: None,
            new_version: 0,
            mapping_session_id: session,
            entity_type: old.entity_type,
        }
    }

    fn mapped(old: &IdentityRecord, new: &IdentityRecord, session: u64) -> Self {
        Self {
            old_stable_id: Some(old.stable_id.clone()),
            old_version: old.version,
            new_stable_id: Some(new.stable_id.clone()),
            new_version: new.version,
            mapping_session_id: session,
            entity_type: new.entity_type,
        }
    }

    fn created(new: &IdentityRecord, session: u64) -> Self {
        Self {
            old_stable_id: None,
            old_version: 0,
            new_stable_id: Some(new.stable_id.clone()),
            new_version: new.version,
            mapping_session_id: session,
            entity_type: new.entity_type,
        }
    }

    pub fn lineage(&self) -> Lineage {
        match (&self.old_stable_id, &self.new_stable_id) {
            (Some(_), None) => Lineage::Deleted,
            (None, Some(_)) => Lineage::Created,
            _ => Lineage::Mapped,
        }
    }

    /// The six wire fields in column order
    pub fn fields(&self) -> [String; 6] {
        [
            self.old_stable_id.clone().unwrap_or_else(|| NULL_MARKER.to_string()),
            self.old_version.to_string(),
            self.new_stable_id.clone().unwrap_or_else(|| NULL_MARKER.to_string()),
            self.new_version.to_string(),
            self.mapping_session_id.to_string(),
            self.entity_type.to_string(),
        ]
    }
}

impl fmt::Display for PatchRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields().join("\t"))
    }
}

/// Result of reconciling two releases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineagePatch {
    /// Deleted rows, then mapped, then created
    pub rows: Vec<PatchRow>,
    pub deleted: usize,
    pub mapped: usize,
    pub created: usize,
}

/// Classify every stable id of `source` and `target` and build patch rows
///
/// Within each group rows follow ascending stable id.
pub fn reconcile(
    source: &IdentityMap,
    target: &IdentityMap,
    session_id: u64,
) -> Result<LineagePatch> {
    if session_id < 1 {
        return Err(IdmapError::config("mapping session id must be a positive integer"));
    }

    let source_ids: BTreeSet<&String> = source.keys().collect();
    let target_ids: BTreeSet<&String> = target.keys().collect();

    let mut patch = LineagePatch::default();

    for id in source_ids.difference(&target_ids) {
        patch.rows.push(PatchRow::deleted(&source[*id], session_id));
        patch.deleted += 1;
    }

    for id in source_ids.intersection(&target_ids) {
        patch.rows.push(PatchRow::mapped(&source[*id], &target[*id], session_id));
        patch.mapped += 1;
    }

    for id in target_ids.difference(&source_ids) {
        patch.rows.push(PatchRow::created(&target[*id], session_id));
        patch.created += 1;
    }

    info!(
        session_id,
        deleted = patch.deleted,
        mapped = patch.mapped,
        created = patch.created,
        "Reconciled stable id lineage"
    );

    Ok(patch)
}

/// Files written by [`write_patch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFiles {
    pub rows: PathBuf,
    pub load_instruction: PathBuf,
}

/// The bulk load instruction for a patch file
///
/// Backslashes and single quotes in the path are escaped for the quoted
/// file name literal.
pub fn load_instruction(rows_path: &Path) -> String {
    let quoted = rows_path
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('\'', "\\'");
    format!("LOAD DATA LOCAL INFILE '{quoted}' INTO TABLE {EVENT_TABLE};\n")
}

/// Write the patch rows and the load instruction into `out_dir`
///
/// The instruction references the rows file by absolute path.
pub fn write_patch(patch: &LineagePatch, out_dir: impl AsRef<Path>) -> Result<PatchFiles> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;

    let rows_path = std::path::absolute(out_dir.join(PATCH_FILE_NAME))?;
    let mut rows = String::new();
    for row in &patch.rows {
        rows.push_str(&row.to_string());
        rows.push('\n');
    }
    fs::write(&rows_path, rows)?;

    let load_path = out_dir.join(LOAD_FILE_NAME);
    fs::write(&load_path, load_instruction(&rows_path))?;

    info!(
        rows = %rows_path.display(),
        load_instruction = %load_path.display(),
        "Wrote lineage patch"
    );

    Ok(PatchFiles {
        rows: rows_path,
        load_instruction: load_path,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn map(records: &[(&str, u32, EntityType)]) -> IdentityMap {
        records
            .iter()
            .map(|(id, v, t)| (id.to_string(), IdentityRecord::new(*id, *v, *t)))
            .collect()
    }

    #[test]
    fn test_gene_version_bump_and_new_gene() {
        let source = map(&[("G1", 1, EntityType::Gene)]);
        let target = map(&[("G1", 2, EntityType::Gene), ("G2", 1, EntityType::Gene)]);

        let patch = reconcile(&source, &target, 7).unwrap();

        assert_eq!((patch.deleted, patch.mapped, patch.created), (0, 1, 1));
        assert_eq!(patch.rows[0].to_string(), "G1\t1\tG1\t2\t7\tgene");
        assert_eq!(patch.rows[1].to_string(), "\\N\t0\tG2\t1\t7\tgene");
    }

    #[test]
    fn test_deleted_row_layout() {
        let source = map(&[("ENST01", 3, EntityType::Transcript)]);
        let patch = reconcile(&source, &IdentityMap::new(), 12).unwrap();

        assert_eq!(patch.deleted, 1);
        assert_eq!(patch.rows[0].lineage(), Lineage::Deleted);
        assert_eq!(
            patch.rows[0].fields(),
            ["ENST01", "3", "\\N", "0", "12", "transcript"].map(String::from)
        );
    }

    #[test]
    fn test_groups_are_ordered() {
        let source = map(&[
            ("B", 1, EntityType::Gene),
            ("A", 1, EntityType::Gene),
            ("C", 1, EntityType::Gene),
        ]);
        let target = map(&[("C", 1, EntityType::Gene), ("D", 1, EntityType::Gene)]);

        let patch = reconcile(&source, &target, 1).unwrap();
        let order: Vec<Lineage> = patch.rows.iter().map(PatchRow::lineage).collect();
        assert_eq!(
            order,
            vec![Lineage::Deleted, Lineage::Deleted, Lineage::Mapped, Lineage::Created]
        );
    }

    #[test]
    fn test_session_must_be_positive() {
        let err = reconcile(&IdentityMap::new(), &IdentityMap::new(), 0).unwrap_err();
        assert!(matches!(err, IdmapError::Config(_)));
    }

    #[test]
    fn test_write_patch() {
        let dir = tempfile::tempdir().unwrap();
        let source = map(&[("P1", 1, EntityType::Translation)]);
        let patch = reconcile(&source, &IdentityMap::new(), 3).unwrap();

        let files = write_patch(&patch, dir.path()).unwrap();

        assert!(files.rows.is_absolute());
        assert_eq!(fs::read_to_string(&files.rows).unwrap(), "P1\t1\t\\N\t0\t3\ttranslation\n");
        let sql = fs::read_to_string(&files.load_instruction).unwrap();
        assert_eq!(sql.lines().count(), 1);
        assert!(sql.contains(&files.rows.display().to_string()));
        assert!(sql.contains("INTO TABLE stable_id_event"));
    }

    #[test]
    fn test_load_identity_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source_ids.txt");
        fs::write(
            &path,
            "ENSG01\t4\tgene\nENST01\t1\ttranscript\nENSP01\t2\ttranslation\n",
        )
        .unwrap();

        let ids = load_identity_map(&path).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids["ENSG01"], IdentityRecord::new("ENSG01", 4, EntityType::Gene));
        assert_eq!(ids["ENSP01"].entity_type, EntityType::Translation);
    }

    #[test]
    fn test_load_identity_map_rejects_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "ENSG01\tfour\tgene\n").unwrap();

        assert!(matches!(
            load_identity_map(&path),
            Err(IdmapError::InvalidValue { line: 1, .. })
        ));

        fs::write(&path, "ENSG01\t4\texon\n").unwrap();
        assert!(matches!(
            load_identity_map(&path),
            Err(IdmapError::InvalidValue { .. })
        ));

        fs::write(&path, "ENSG01\t4\n").unwrap();
        assert!(matches!(
            load_identity_map(&path),
            Err(IdmapError::MalformedLine { .. })
        ));
    }

    #[test]
    fn test_short_identity_record_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "ENSG01\t4\tgene\nENSG02 7\n").unwrap();

        match load_identity_map(&path) {
            Err(IdmapError::MalformedLine {
                line,
                expected,
                found,
                ..
            }) => assert_eq!((line, expected, found), (2, 3, 2)),
            other => panic!("expected a malformed line error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_instruction_escapes_quotes() {
        let sql = load_instruction(Path::new("/data/o'brien/rows.txt"));
        assert_eq!(
            sql,
            "LOAD DATA LOCAL INFILE '/data/o\\'brien/rows.txt' INTO TABLE stable_id_event;\n"
        );

        let plain = load_instruction(Path::new("/data/rows.txt"));
        assert_eq!(plain, "LOAD DATA LOCAL INFILE '/data/rows.txt' INTO TABLE stable_id_event;\n");
    }

    #[test]
    fn test_write_patch_in_quoted_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("it's");
        let source = map(&[("G1", 1, EntityType::Gene)]);
        let patch = reconcile(&source, &IdentityMap::new(), 1).unwrap();

        let files = write_patch(&patch, &out).unwrap();
        let sql = fs::read_to_string(&files.load_instruction).unwrap();
        assert!(sql.contains("it\\'s"));
        assert_eq!(sql.matches('\'').count(), 3);
    }

    fn identity_map() -> impl Strategy<Value = IdentityMap> {
        prop::collection::hash_map("[A-F][0-9]", 1u32..5, 0..12).prop_map(|m| {
            m.into_iter()
                .map(|(id, v)| (id.clone(), IdentityRecord::new(id, v, EntityType::Gene)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_lineage_partitions_all_ids(source in identity_map(), target in identity_map()) {
            let patch = reconcile(&source, &target, 1).unwrap();

            let mut seen = HashSet::new();
            for row in &patch.rows {
                let id = row.old_stable_id.clone().or_else(|| row.new_stable_id.clone()).unwrap();
                prop_assert!(seen.insert(id.clone()), "{} classified twice", id);
                let expected = match (source.contains_key(&id), target.contains_key(&id)) {
                    (true, false) => Lineage::Deleted,
                    (true, true) => Lineage::Mapped,
                    (false, true) => Lineage::Created,
                    (false, false) => unreachable!(),
                };
                prop_assert_eq!(row.lineage(), expected);
            }

            let all: HashSet<&String> = source.keys().chain(target.keys()).collect();
            prop_assert_eq!(seen.len(), all.len());
            prop_assert_eq!(patch.deleted + patch.mapped + patch.created, all.len());
        }
    }
}
