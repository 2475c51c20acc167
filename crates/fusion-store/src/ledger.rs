//! Local credits ledger
//!
//! Headerless CSV with columns identifier, attribution, status, tags. The
//! file is read fresh for every operation and rewritten in full after every
//! mutation.

use crate::attribution::{classify, Authorship};
use crate::error::StoreError;
use fusion_ident::FusionId;
use std::path::{Path, PathBuf};

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerRecord {
    pub identifier: String,
    pub attribution: String,
    pub status: String,
    pub tags: String,
}

impl LedgerRecord {
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        attribution: impl Into<String>,
        status: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            attribution: attribution.into(),
            status: status.into(),
            tags: tags.into(),
        }
    }

    fn from_csv(record: &csv::StringRecord) -> Self {
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        Self {
            identifier: field(0),
            attribution: field(1),
            status: field(2),
            tags: field(3),
        }
    }

    fn fields(&self) -> [&str; 4] {
        [&self.identifier, &self.attribution, &self.status, &self.tags]
    }

    /// Parsed identifier, if well formed
    #[must_use]
    pub fn fusion_id(&self) -> Option<FusionId> {
        self.identifier.parse().ok()
    }
}

/// Ledger file loaded into memory
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    records: Vec<LedgerRecord>,
}

impl Ledger {
    /// Read the ledger at `path`
    ///
    /// # Errors
    /// Returns [`StoreError::Ledger`] if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| StoreError::ledger_error(&path, e))?;

        let records = reader
            .records()
            .map(|r| r.map(|rec| LedgerRecord::from_csv(&rec)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ledger_error(&path, e))?;

        tracing::debug!(path = %path.display(), rows = records.len(), "read ledger");
        Ok(Self { path, records })
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any row carries `identifier`
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.records.iter().any(|r| r.identifier == identifier)
    }

    /// Every well-formed identifier, in file order
    ///
    /// Malformed identifiers are skipped; they cannot belong to a sibling group.
    #[must_use]
    pub fn fusion_ids(&self) -> Vec<FusionId> {
        self.records
            .iter()
            .filter_map(|r| {
                let id = r.fusion_id();
                if id.is_none() {
                    tracing::debug!(identifier = %r.identifier, "skipping malformed ledger identifier");
                }
                id
            })
            .collect()
    }

    /// Rows mentioning `user`, with their classification
    #[must_use]
    pub fn attributed_to(&self, user: &str) -> Vec<(&LedgerRecord, Authorship)> {
        self.records
            .iter()
            .map(|r| (r, classify(&r.attribution, user)))
            .filter(|(_, a)| *a != Authorship::Unrelated)
            .collect()
    }

    /// Drop every row carrying `identifier`, returning how many were dropped
    pub fn remove(&mut self, identifier: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.identifier != identifier);
        before - self.records.len()
    }

    /// Rename every row carrying `from`, returning how many were renamed
    pub fn rename(&mut self, from: &str, to: &str) -> usize {
        let mut renamed = 0;
        for record in self.records.iter_mut().filter(|r| r.identifier == from) {
            record.identifier = to.to_string();
            renamed += 1;
        }
        renamed
    }

    /// Rows carrying any of `identifiers`, in file order
    #[must_use]
    pub fn subset(&self, identifiers: &[FusionId]) -> Vec<LedgerRecord> {
        self.records
            .iter()
            .filter(|r| identifiers.iter().any(|id| id.as_str() == r.identifier))
            .cloned()
            .collect()
    }

    /// Rewrite the ledger file in full
    ///
    /// # Errors
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        write_records(&self.path, &self.records)?;
        tracing::debug!(path = %self.path.display(), rows = self.records.len(), "wrote ledger");
        Ok(())
    }
}

/// Write rows as a headerless ledger file
///
/// The rows go to a temporary file next to `path` which then replaces it.
///
/// # Errors
/// Returns [`StoreError`] if the file cannot be written.
pub fn write_records(path: &Path, records: &[LedgerRecord]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io_error(dir, e))?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(tmp.as_file());
        for record in records {
            writer
                .write_record(record.fields())
                .map_err(|e| StoreError::ledger_error(path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io_error(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| StoreError::io_error(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ledger_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Sprite Credits.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_headerless_rows() {
        let (_dir, path) = ledger_file("1.59,Alice,main,\n1.59a,\"Alice & Bob\",alt,\"cute, small\"\n");
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records()[1].attribution, "Alice & Bob");
        assert_eq!(ledger.records()[1].tags, "cute, small");
    }

    #[test]
    fn short_rows_get_empty_fields() {
        let (_dir, path) = ledger_file("25,Alice\n");
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.records()[0], LedgerRecord::new("25", "Alice", "", ""));
    }

    #[test]
    fn remove_and_rename_then_save() {
        let (_dir, path) = ledger_file("1.59,A,main,\n1.59a,B,alt,\n1.59b,C,alt,\n");
        let mut ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.remove("1.59a"), 1);
        assert_eq!(ledger.rename("1.59b", "1.59a"), 1);
        assert_eq!(ledger.rename("9.9", "9.8"), 0);
        ledger.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1.59,A,main,\n1.59a,C,alt,\n");
    }

    #[test]
    fn quoting_survives_rewrite() {
        let (_dir, path) = ledger_file("1.1,\"Zoé & Game Freak\",main,\"a, b\"\n");
        Ledger::open(&path).unwrap().save().unwrap();
        let reread = Ledger::open(&path).unwrap();
        assert_eq!(
            reread.records()[0],
            LedgerRecord::new("1.1", "Zoé & Game Freak", "main", "a, b")
        );
    }

    #[test]
    fn attributed_rows_are_classified() {
        let (_dir, path) = ledger_file("1.1,Alice,,\n1.2,Alice & Bob,,\n1.3,Bob,,\n");
        let ledger = Ledger::open(&path).unwrap();
        let rows: Vec<_> = ledger
            .attributed_to("alice")
            .into_iter()
            .map(|(r, a)| (r.identifier.as_str(), a))
            .collect();
        assert_eq!(
            rows,
            vec![("1.1", Authorship::Sole), ("1.2", Authorship::Collab)]
        );
    }

    #[test]
    fn fusion_ids_skip_malformed() {
        let (_dir, path) = ledger_file("1.1,A,,\nnotes,B,,\n1.1a,C,,\n");
        let ledger = Ledger::open(&path).unwrap();
        let ids: Vec<String> = ledger.fusion_ids().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["1.1", "1.1a"]);
    }

    #[test]
    fn subset_keeps_file_order() {
        let (_dir, path) = ledger_file("1.1,A,,\n1.2,B,,\n1.3,C,,\n");
        let ledger = Ledger::open(&path).unwrap();
        let wanted: Vec<FusionId> = vec!["1.3".parse().unwrap(), "1.1".parse().unwrap()];
        let subset = ledger.subset(&wanted);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset[0].identifier, "1.1");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Ledger::open(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, StoreError::Ledger { .. }));
    }
}
