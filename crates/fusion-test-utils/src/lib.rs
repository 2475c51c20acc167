//! Testing utilities for the fusion-prune workspace
//!
//! A [`Fixture`] is a throwaway repository (ledger plus artifact files) with
//! a [`MemoryStore`] holding both remote sheets. [`FlakyStore`] wraps any
//! store and fails a set number of calls before letting them through.

#![allow(missing_docs)]

use async_trait::async_trait;
use fusion_ident::FusionId;
use fusion_store::ledger::write_records;
use fusion_store::{
    ArtifactLayout, CallCounts, CellUpdate, ColumnRange, LedgerRecord, MemoryStore, PruneConfig,
    RemoteStore, StoreBinding, StoreError,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const RESPONSES_BOOK: &str = "responses-book";
pub const CREDITS_BOOK: &str = "credits-book";
pub const RESPONSES_SHEET_ID: u64 = 0;
pub const CREDITS_SHEET_ID: u64 = 7;

pub fn id(s: &str) -> FusionId {
    s.parse().unwrap()
}

/// Row with `value` in column D
pub fn sheet_row(value: &str) -> Vec<String> {
    vec![
        "2024-01-01".to_string(),
        "someone".to_string(),
        String::new(),
        value.to_string(),
    ]
}

/// Builder for a [`Fixture`]
#[derive(Debug, Default)]
pub struct FixtureBuilder {
    ledger: Vec<LedgerRecord>,
    files: Vec<String>,
    responses: Vec<String>,
    credits: Vec<String>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifact present everywhere: ledger, file, one response and one credit row
    pub fn artifact(self, identifier: &str, author: &str) -> Self {
        self.ledger_row(identifier, author)
            .file(identifier)
            .response(identifier)
            .credit(identifier)
    }

    pub fn ledger_row(mut self, identifier: &str, author: &str) -> Self {
        self.ledger
            .push(LedgerRecord::new(identifier, author, "alt", ""));
        self
    }

    pub fn file(mut self, identifier: &str) -> Self {
        self.files.push(identifier.to_string());
        self
    }

    /// Response row; the `.png` suffix is added
    pub fn response(mut self, identifier: &str) -> Self {
        self.responses.push(format!("{identifier}.png"));
        self
    }

    pub fn credit(mut self, identifier: &str) -> Self {
        self.credits.push(identifier.to_string());
        self
    }

    pub fn build(self) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = PruneConfig::new(
            dir.path(),
            StoreBinding::responses(RESPONSES_BOOK, RESPONSES_SHEET_ID),
            StoreBinding::credits(CREDITS_BOOK, CREDITS_SHEET_ID),
        )
        .with_retry(3, 0)
        .with_pre_delete_pause(0);

        write_records(&config.ledger_path(), &self.ledger).unwrap();

        let layout = ArtifactLayout::new(dir.path(), config.layout.clone());
        for f in &self.files {
            let path = layout.path_for(&id(f));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, f.as_bytes()).unwrap();
        }

        let store = Arc::new(MemoryStore::new());
        let mut responses = vec![sheet_row("Sprite"), sheet_row("(filename)")];
        responses.extend(self.responses.iter().map(|v| sheet_row(v)));
        store.add_sheet(RESPONSES_BOOK, RESPONSES_SHEET_ID, "RESPONSES", responses);

        let mut credits = vec![sheet_row("Sprite")];
        credits.extend(self.credits.iter().map(|v| sheet_row(v)));
        store.add_sheet(CREDITS_BOOK, CREDITS_SHEET_ID, "Credits", credits);

        Fixture {
            dir,
            config,
            layout,
            store,
        }
    }
}

/// Temporary repository plus in-memory remote stores
#[derive(Debug)]
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub config: PruneConfig,
    pub layout: ArtifactLayout,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Ledger identifiers in file order
    pub fn ledger_ids(&self) -> Vec<String> {
        fusion_store::Ledger::open(self.config.ledger_path())
            .unwrap()
            .records()
            .iter()
            .map(|r| r.identifier.clone())
            .collect()
    }

    pub fn ledger_text(&self) -> String {
        std::fs::read_to_string(self.config.ledger_path()).unwrap()
    }

    pub fn has_file(&self, identifier: &str) -> bool {
        self.layout.path_for(&id(identifier)).exists()
    }

    /// Contents written for the file now named `identifier`
    pub fn file_contents(&self, identifier: &str) -> String {
        std::fs::read_to_string(self.layout.path_for(&id(identifier))).unwrap()
    }

    /// Response values below the headers, `.png` included
    pub fn responses(&self) -> Vec<String> {
        self.store
            .column(RESPONSES_BOOK, "RESPONSES", "D")
            .unwrap()
            .split_off(2)
    }

    /// Credit values below the header
    pub fn credits(&self) -> Vec<String> {
        self.store
            .column(CREDITS_BOOK, "Credits", "D")
            .unwrap()
            .split_off(1)
    }
}

/// Store wrapper that fails the first few calls of each kind
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    failing_reads: AtomicU32,
    failing_deletes: AtomicU32,
    failing_updates: AtomicU32,
    attempts: Mutex<CallCounts>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_reads: AtomicU32::new(0),
            failing_deletes: AtomicU32::new(0),
            failing_updates: AtomicU32::new(0),
            attempts: Mutex::new(CallCounts::default()),
        }
    }

    pub fn failing_reads(self, n: u32) -> Self {
        self.failing_reads.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_deletes(self, n: u32) -> Self {
        self.failing_deletes.store(n, Ordering::SeqCst);
        self
    }

    pub fn failing_updates(self, n: u32) -> Self {
        self.failing_updates.store(n, Ordering::SeqCst);
        self
    }

    /// Every call made, failed ones included
    pub fn attempts(&self) -> CallCounts {
        *self.attempts.lock()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn injected(call: &str) -> StoreError {
    StoreError::Remote(format!("injected {call} failure"))
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for FlakyStore<S> {
    async fn read_column(
        &self,
        spreadsheet: &str,
        range: &ColumnRange,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        self.attempts.lock().reads += 1;
        if take_failure(&self.failing_reads) {
            return Err(injected("read"));
        }
        self.inner.read_column(spreadsheet, range).await
    }

    async fn delete_rows(
        &self,
        spreadsheet: &str,
        sheet_id: u64,
        rows: &[u32],
    ) -> Result<(), StoreError> {
        self.attempts.lock().deletes += 1;
        if take_failure(&self.failing_deletes) {
            return Err(injected("delete"));
        }
        self.inner.delete_rows(spreadsheet, sheet_id, rows).await
    }

    async fn update_cells(
        &self,
        spreadsheet: &str,
        updates: &[CellUpdate],
    ) -> Result<(), StoreError> {
        self.attempts.lock().updates += 1;
        if take_failure(&self.failing_updates) {
            return Err(injected("update"));
        }
        self.inner.update_cells(spreadsheet, updates).await
    }
}
