//! Remote tabular store seam
//!
//! The reconciliation core needs exactly three remote operations: read an
//! open-ended column range, delete a batch of rows, and update a batch of
//! cells. Anything that can do those three is a [`RemoteStore`].

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Which remote store a snapshot or binding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Dex response log, one row per submitted entry
    Responses,
    /// Credit sheet, one row per contributor credit
    Credits,
}

impl StoreKind {
    /// Both remote stores in mutation order
    pub const ALL: [StoreKind; 2] = [StoreKind::Responses, StoreKind::Credits];
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Responses => f.write_str("responses"),
            Self::Credits => f.write_str("credits"),
        }
    }
}

/// Open-ended single column range, e.g. `RESPONSES!D3:D`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRange {
    pub sheet: String,
    pub column: String,
    /// First native (1-based) row of the range
    pub start_row: u32,
}

impl Display for ColumnRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}:{}",
            self.sheet, self.column, self.start_row, self.column
        )
    }
}

/// Single cell address, e.g. `Credits!D7`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub sheet: String,
    pub column: String,
    pub row: u32,
}

impl Display for CellRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.sheet, self.column, self.row)
    }
}

/// New user-entered value for one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub cell: CellRef,
    pub value: String,
}

/// Authenticated handle to a remote tabular store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read every row of an open-ended column range
    async fn read_column(
        &self,
        spreadsheet: &str,
        range: &ColumnRange,
    ) -> Result<Vec<Vec<String>>, StoreError>;

    /// Delete 1-based rows in one batch
    ///
    /// Implementations apply the deletions from the highest row to the
    /// lowest, since each delete shifts every row below it.
    async fn delete_rows(
        &self,
        spreadsheet: &str,
        sheet_id: u64,
        rows: &[u32],
    ) -> Result<(), StoreError>;

    /// Apply cell updates in one batch
    async fn update_cells(&self, spreadsheet: &str, updates: &[CellUpdate])
        -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn read_column(
        &self,
        spreadsheet: &str,
        range: &ColumnRange,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        (**self).read_column(spreadsheet, range).await
    }

    async fn delete_rows(
        &self,
        spreadsheet: &str,
        sheet_id: u64,
        rows: &[u32],
    ) -> Result<(), StoreError> {
        (**self).delete_rows(spreadsheet, sheet_id, rows).await
    }

    async fn update_cells(
        &self,
        spreadsheet: &str,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        (**self).update_cells(spreadsheet, updates).await
    }
}

/// Rows sorted highest first with duplicates removed
#[must_use]
pub fn descending_rows(rows: &[u32]) -> Vec<u32> {
    let mut sorted = rows.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted
}
