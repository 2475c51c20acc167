//! Store snapshots
//!
//! A [`StoreView`] is the cached identifier column of one remote store. The
//! remote stores are shared with people editing them by hand, so a view is
//! only trusted until it is compared against a fresh read.

use crate::remote::StoreKind;
use chrono::{DateTime, Utc};

/// Cached identifier column of one remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreView {
    kind: StoreKind,
    header_rows: u32,
    values: Vec<String>,
}

impl StoreView {
    /// Create view from already flattened values
    #[inline]
    #[must_use]
    pub fn new(kind: StoreKind, header_rows: u32, values: Vec<String>) -> Self {
        Self {
            kind,
            header_rows,
            values,
        }
    }

    /// Flatten raw range rows into a view
    ///
    /// Each row contributes its first cell; an empty row becomes an empty
    /// value so indexes keep lining up with native rows. A trailing
    /// `extension` (e.g. `.png`) is stripped.
    #[must_use]
    pub fn from_rows(
        kind: StoreKind,
        header_rows: u32,
        rows: Vec<Vec<String>>,
        extension: Option<&str>,
    ) -> Self {
        let values = rows
            .into_iter()
            .map(|row| {
                let cell = row.into_iter().next().unwrap_or_default();
                match extension.and_then(|ext| cell.strip_suffix(ext)) {
                    Some(stem) => stem.to_string(),
                    None => cell,
                }
            })
            .collect();
        Self::new(kind, header_rows, values)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Native 1-based row of a snapshot index
    #[inline]
    #[must_use]
    pub fn row_of(&self, index: usize) -> u32 {
        u32::try_from(index)
            .unwrap_or(u32::MAX)
            .saturating_add(self.header_rows + 1)
    }

    fn index_of(&self, row: u32) -> Option<usize> {
        row.checked_sub(self.header_rows + 1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < self.values.len())
    }

    /// Native rows whose value equals `identifier`
    #[must_use]
    pub fn rows_matching(&self, identifier: &str) -> Vec<u32> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_str() == identifier)
            .map(|(i, _)| self.row_of(i))
            .collect()
    }

    /// Mirror a completed remote row delete
    pub fn remove_rows(&mut self, rows: &[u32]) {
        for row in crate::remote::descending_rows(rows) {
            if let Some(i) = self.index_of(row) {
                self.values.remove(i);
            }
        }
    }

    /// Mirror a completed remote cell update
    pub fn rename_rows(&mut self, rows: &[u32], value: &str) {
        for row in rows {
            if let Some(i) = self.index_of(*row) {
                self.values[i] = value.to_string();
            }
        }
    }

    /// Compare this cached view against a fresh read
    ///
    /// Returns `None` when both hold identical values.
    #[must_use]
    pub fn diff(&self, fresh: &StoreView) -> Option<Divergence> {
        if self.values == fresh.values {
            return None;
        }
        let first_mismatch = self
            .values
            .iter()
            .zip(&fresh.values)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| self.values.len().min(fresh.values.len()));

        Some(Divergence {
            store: self.kind,
            cached_len: self.values.len(),
            fresh_len: fresh.values.len(),
            first_mismatch_row: fresh.row_of(first_mismatch),
            detected_at: Utc::now(),
        })
    }
}

/// Cached snapshot no longer matches the remote store
///
/// Something edited the store outside this process. Operations already issued
/// are not redone; the snapshot is replaced so later lookups use fresh rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub store: StoreKind,
    pub cached_len: usize,
    pub fresh_len: usize,
    /// First native row where cached and fresh values differ
    pub first_mismatch_row: u32,
    pub detected_at: DateTime<Utc>,
}
