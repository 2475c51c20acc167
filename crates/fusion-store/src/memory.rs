//! In-process remote store
//!
//! Holds spreadsheets as rows of cells and applies the three remote
//! operations with the same row semantics as the hosted service. Used for
//! tests and for rehearsing a removal against a copy of the data.

use crate::error::StoreError;
use crate::remote::{descending_rows, CellUpdate, ColumnRange, RemoteStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Number of remote operations served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub reads: u32,
    pub deletes: u32,
    pub updates: u32,
}

#[derive(Debug, Clone)]
struct Sheet {
    id: u64,
    name: String,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct Inner {
    spreadsheets: HashMap<String, Vec<Sheet>>,
    calls: CallCounts,
}

/// Remote store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn column_index(column: &str) -> Result<usize, StoreError> {
    fusion_ident::numeral::decode(&column.to_ascii_lowercase())
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| StoreError::Remote(format!("invalid column {column:?}")))
}

impl Inner {
    fn sheet_by_name(&mut self, spreadsheet: &str, name: &str) -> Result<&mut Sheet, StoreError> {
        self.spreadsheets
            .get_mut(spreadsheet)
            .and_then(|sheets| sheets.iter_mut().find(|s| s.name == name))
            .ok_or_else(|| StoreError::UnknownSheet {
                spreadsheet: spreadsheet.to_string(),
                sheet: name.to_string(),
            })
    }

    fn sheet_by_id(&mut self, spreadsheet: &str, id: u64) -> Result<&mut Sheet, StoreError> {
        self.spreadsheets
            .get_mut(spreadsheet)
            .and_then(|sheets| sheets.iter_mut().find(|s| s.id == id))
            .ok_or_else(|| StoreError::UnknownSheet {
                spreadsheet: spreadsheet.to_string(),
                sheet: id.to_string(),
            })
    }
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet with its full contents, header rows included
    pub fn add_sheet(&self, spreadsheet: &str, sheet_id: u64, name: &str, rows: Vec<Vec<String>>) {
        self.inner
            .lock()
            .spreadsheets
            .entry(spreadsheet.to_string())
            .or_default()
            .push(Sheet {
                id: sheet_id,
                name: name.to_string(),
                rows,
            });
    }

    /// Whole column including headers, empty cells as empty strings
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownSheet`] if the sheet does not exist.
    pub fn column(&self, spreadsheet: &str, sheet: &str, column: &str) -> Result<Vec<String>, StoreError> {
        let col = column_index(column)?;
        let mut inner = self.inner.lock();
        let sheet = inner.sheet_by_name(spreadsheet, sheet)?;
        Ok(sheet
            .rows
            .iter()
            .map(|row| row.get(col).cloned().unwrap_or_default())
            .collect())
    }

    /// Insert a row the way a person editing the sheet would
    ///
    /// # Errors
    /// Returns [`StoreError`] if the sheet does not exist or the row is past the end.
    pub fn insert_row(&self, spreadsheet: &str, sheet: &str, row: u32, cells: Vec<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let sheet = inner.sheet_by_name(spreadsheet, sheet)?;
        let index = row_index(row).filter(|i| *i <= sheet.rows.len()).ok_or_else(|| {
            StoreError::RowOutOfRange {
                sheet: sheet.name.clone(),
                row,
            }
        })?;
        sheet.rows.insert(index, cells);
        Ok(())
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.inner.lock().calls
    }
}

fn row_index(row: u32) -> Option<usize> {
    row.checked_sub(1).and_then(|r| usize::try_from(r).ok())
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read_column(
        &self,
        spreadsheet: &str,
        range: &ColumnRange,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        let col = column_index(&range.column)?;
        let mut inner = self.inner.lock();
        inner.calls.reads += 1;
        let sheet = inner.sheet_by_name(spreadsheet, &range.sheet)?;
        let start = row_index(range.start_row).unwrap_or(0);

        let mut rows: Vec<Vec<String>> = sheet
            .rows
            .iter()
            .skip(start)
            .map(|row| match row.get(col) {
                Some(cell) if !cell.is_empty() => vec![cell.clone()],
                _ => Vec::new(),
            })
            .collect();
        // trailing empty rows are omitted, like the hosted service does
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn delete_rows(
        &self,
        spreadsheet: &str,
        sheet_id: u64,
        rows: &[u32],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.deletes += 1;
        let sheet = inner.sheet_by_id(spreadsheet, sheet_id)?;
        let ordered = descending_rows(rows);
        if let Some(bad) = ordered
            .iter()
            .find(|r| row_index(**r).map_or(true, |i| i >= sheet.rows.len()))
        {
            return Err(StoreError::RowOutOfRange {
                sheet: sheet.name.clone(),
                row: *bad,
            });
        }
        for row in ordered {
            if let Some(i) = row_index(row) {
                sheet.rows.remove(i);
            }
        }
        Ok(())
    }

    async fn update_cells(
        &self,
        spreadsheet: &str,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.calls.updates += 1;
        for update in updates {
            let col = column_index(&update.cell.column)?;
            let sheet = inner.sheet_by_name(spreadsheet, &update.cell.sheet)?;
            let index = row_index(update.cell.row).ok_or_else(|| StoreError::RowOutOfRange {
                sheet: sheet.name.clone(),
                row: update.cell.row,
            })?;
            if sheet.rows.len() <= index {
                sheet.rows.resize(index + 1, Vec::new());
            }
            let row = &mut sheet.rows[index];
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = update.value.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CellRef;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_sheet(
            "book",
            7,
            "Credits",
            vec![
                row(&["", "", "", "sprite"]),
                row(&["", "", "", "1.1"]),
                row(&["", "", "", "1.2"]),
                row(&["", "", "", "1.3"]),
                row(&["", "", "", "1.4"]),
            ],
        );
        store
    }

    fn range() -> ColumnRange {
        ColumnRange {
            sheet: "Credits".to_string(),
            column: "D".to_string(),
            start_row: 2,
        }
    }

    #[tokio::test]
    async fn reads_column_from_start_row() {
        let store = store();
        let rows = store.read_column("book", &range()).await.unwrap();
        assert_eq!(rows, vec![row(&["1.1"]), row(&["1.2"]), row(&["1.3"]), row(&["1.4"])]);
        assert_eq!(store.calls().reads, 1);
    }

    #[tokio::test]
    async fn deletes_rows_highest_first() {
        let store = store();
        store.delete_rows("book", 7, &[2, 4]).await.unwrap();
        assert_eq!(
            store.column("book", "Credits", "D").unwrap(),
            vec!["sprite", "1.2", "1.4"]
        );
        assert_eq!(store.calls().deletes, 1);
    }

    #[tokio::test]
    async fn rejects_out_of_range_delete_without_partial_effect() {
        let store = store();
        let err = store.delete_rows("book", 7, &[2, 40]).await.unwrap_err();
        assert!(matches!(err, StoreError::RowOutOfRange { row: 40, .. }));
        assert_eq!(store.column("book", "Credits", "D").unwrap().len(), 5);
    }

    #[tokio::test]
    async fn updates_cells() {
        let store = store();
        let update = CellUpdate {
            cell: CellRef {
                sheet: "Credits".to_string(),
                column: "D".to_string(),
                row: 3,
            },
            value: "1.9".to_string(),
        };
        store.update_cells("book", &[update]).await.unwrap();
        assert_eq!(store.column("book", "Credits", "D").unwrap()[2], "1.9");
    }

    #[tokio::test]
    async fn unknown_sheet_is_an_error() {
        let store = store();
        let err = store.delete_rows("book", 99, &[2]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownSheet { .. }));
    }

    #[test]
    fn insert_row_shifts_following_rows() {
        let store = store();
        store
            .insert_row("book", "Credits", 2, row(&["", "", "", "0.9"]))
            .unwrap();
        assert_eq!(
            store.column("book", "Credits", "D").unwrap(),
            vec!["sprite", "0.9", "1.1", "1.2", "1.3", "1.4"]
        );
    }

    #[test]
    fn column_letters_map_to_indexes() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("D").unwrap(), 3);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert!(column_index("").is_err());
    }
}
