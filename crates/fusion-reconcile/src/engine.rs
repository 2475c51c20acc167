//! Cross-store deletion and renumbering
//!
//! The engine owns a snapshot of each remote identifier column and keeps it
//! in step with every mutation it issues. When configured to distrust its
//! cache it re-reads every store after each delete and each renumber,
//! including stores the step did not write to, and reports any divergence
//! before replacing the snapshot.
//!
//! Ordering within one deletion is fixed: remote rows, then the file, then
//! the ledger, then the cascade. Nothing is rolled back.

use crate::error::{IntegrityWarning, ReconcileError};
use crate::state::{DeletionState, DeletionTracker};
use fusion_ident::{FusionId, Partition};
use fusion_store::{
    ArtifactLayout, CellUpdate, Divergence, Ledger, PruneConfig, Relocation, RemoteStore,
    RetryExecutor, StoreBinding, StoreError, StoreKind, StoreView,
};
use std::path::PathBuf;

/// What one engine step did and noticed
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub warnings: Vec<IntegrityWarning>,
    pub divergences: Vec<Divergence>,
    /// Identifiers moved down one rank, in processing order
    pub renamed: Vec<(FusionId, FusionId)>,
    pub rows_deleted: usize,
    pub cells_updated: usize,
}

impl StepReport {
    fn warn(&mut self, warning: IntegrityWarning) {
        tracing::warn!(%warning, "integrity warning");
        self.warnings.push(warning);
    }

    fn absorb(&mut self, other: StepReport) {
        self.warnings.extend(other.warnings);
        self.divergences.extend(other.divergences);
        self.renamed.extend(other.renamed);
        self.rows_deleted += other.rows_deleted;
        self.cells_updated += other.cells_updated;
    }
}

/// Result of deleting one artifact and cascading its siblings
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub target: FusionId,
    pub state: DeletionState,
    pub warnings: Vec<IntegrityWarning>,
    pub divergences: Vec<Divergence>,
    pub renamed: Vec<(FusionId, FusionId)>,
}

#[derive(Debug)]
struct TrackedStore {
    kind: StoreKind,
    binding: StoreBinding,
    view: Option<StoreView>,
}

/// Applies deletions and renumbers across the remote stores, files and ledger
#[derive(Debug)]
pub struct ReconciliationEngine<S> {
    client: S,
    layout: ArtifactLayout,
    ledger_path: PathBuf,
    retry: RetryExecutor,
    distrust_cache: bool,
    stores: Vec<TrackedStore>,
}

impl<S: RemoteStore> ReconciliationEngine<S> {
    #[must_use]
    pub fn new(config: &PruneConfig, client: S) -> Self {
        let stores = StoreKind::ALL
            .iter()
            .map(|kind| TrackedStore {
                kind: *kind,
                binding: match kind {
                    StoreKind::Responses => config.responses.clone(),
                    StoreKind::Credits => config.credits.clone(),
                },
                view: None,
            })
            .collect();

        Self {
            client,
            layout: ArtifactLayout::new(&config.repo_path, config.layout.clone()),
            ledger_path: config.ledger_path(),
            retry: RetryExecutor::new(config.retry_policy()),
            distrust_cache: config.distrust_cache,
            stores,
        }
    }

    #[inline]
    #[must_use]
    pub fn client(&self) -> &S {
        &self.client
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Current snapshot of a store, if primed
    #[must_use]
    pub fn snapshot(&self, kind: StoreKind) -> Option<&StoreView> {
        self.stores
            .iter()
            .find(|s| s.kind == kind)
            .and_then(|s| s.view.as_ref())
    }

    /// Fetch fresh snapshots of every store
    ///
    /// # Errors
    /// Returns [`ReconcileError::Store`] once a read has exhausted its retries.
    pub async fn prime(&mut self) -> Result<(), ReconcileError> {
        for index in 0..self.stores.len() {
            let view = self.fetch(index).await?;
            tracing::info!(store = %view.kind(), rows = view.len(), "primed snapshot");
            self.stores[index].view = Some(view);
        }
        Ok(())
    }

    async fn ensure_primed(&mut self) -> Result<(), ReconcileError> {
        if self.stores.iter().any(|s| s.view.is_none()) {
            self.prime().await?;
        }
        Ok(())
    }

    async fn fetch(&self, index: usize) -> Result<StoreView, StoreError> {
        let store = &self.stores[index];
        let binding = &store.binding;
        let range = binding.column_range();
        let rows = self
            .retry
            .run(&format!("read {}", store.kind), || {
                self.client.read_column(&binding.spreadsheet_id, &range)
            })
            .await?;
        Ok(StoreView::from_rows(
            store.kind,
            binding.header_rows,
            rows,
            binding.extension(),
        ))
    }

    /// Re-read a store and compare against its snapshot
    ///
    /// The snapshot is always replaced by the fresh read.
    ///
    /// # Errors
    /// Returns [`ReconcileError::Store`] once the read has exhausted its retries.
    pub async fn revalidate(&mut self, kind: StoreKind) -> Result<Option<Divergence>, ReconcileError> {
        match self.stores.iter().position(|s| s.kind == kind) {
            Some(index) => self.revalidate_at(index).await,
            None => Ok(None),
        }
    }

    async fn revalidate_at(&mut self, index: usize) -> Result<Option<Divergence>, ReconcileError> {
        let fresh = self.fetch(index).await?;
        let store = &mut self.stores[index];
        let divergence = store.view.as_ref().and_then(|cached| cached.diff(&fresh));
        if let Some(d) = &divergence {
            tracing::warn!(
                store = %d.store,
                cached_rows = d.cached_len,
                fresh_rows = d.fresh_len,
                first_mismatch_row = d.first_mismatch_row,
                "snapshot diverged from store, replacing it"
            );
        }
        store.view = Some(fresh);
        Ok(divergence)
    }

    /// Re-read every store when the cache is distrusted
    async fn revalidate_distrusted(&mut self, report: &mut StepReport) -> Result<(), ReconcileError> {
        if !self.distrust_cache {
            return Ok(());
        }
        for index in 0..self.stores.len() {
            if let Some(d) = self.revalidate_at(index).await? {
                report.divergences.push(d);
            }
        }
        Ok(())
    }

    /// Delete one artifact everywhere without cascading
    ///
    /// # Errors
    /// Returns [`ReconcileError`] on the first failing step; earlier steps stay applied.
    pub async fn delete(&mut self, target: &FusionId) -> Result<StepReport, ReconcileError> {
        let mut tracker = DeletionTracker::new(target.clone());
        self.delete_tracked(&mut tracker).await
    }

    async fn delete_tracked(
        &mut self,
        tracker: &mut DeletionTracker,
    ) -> Result<StepReport, ReconcileError> {
        self.ensure_primed().await?;
        let target = tracker.target().clone();
        let mut report = StepReport::default();

        for index in 0..self.stores.len() {
            let (kind, rows) = {
                let store = &self.stores[index];
                let rows = store
                    .view
                    .as_ref()
                    .map(|v| v.rows_matching(target.as_str()))
                    .unwrap_or_default();
                (store.kind, rows)
            };

            if rows.is_empty() {
                if self.stores[index].binding.expect_entry {
                    report.warn(IntegrityWarning::MissingRows {
                        store: kind,
                        identifier: target.to_string(),
                    });
                }
                continue;
            }

            let binding = &self.stores[index].binding;
            self.retry
                .run(&format!("delete rows in {kind}"), || {
                    self.client
                        .delete_rows(&binding.spreadsheet_id, binding.sheet_id, &rows)
                })
                .await?;
            tracing::info!(store = %kind, artifact = %target, ?rows, "deleted rows");

            if let Some(view) = self.stores[index].view.as_mut() {
                view.remove_rows(&rows);
            }
            report.rows_deleted += rows.len();
        }
        self.revalidate_distrusted(&mut report).await?;
        tracker.advance(DeletionState::StoresCleared)?;

        if self.layout.remove(&target)? {
            tracing::info!(artifact = %target, "removed file");
        } else {
            report.warn(IntegrityWarning::MissingFile {
                identifier: target.to_string(),
                path: self.layout.path_for(&target),
            });
        }
        tracker.advance(DeletionState::FileRemoved)?;

        let mut ledger = Ledger::open(&self.ledger_path)?;
        if ledger.remove(target.as_str()) == 0 {
            report.warn(IntegrityWarning::MissingLedgerRow {
                identifier: target.to_string(),
            });
        } else {
            ledger.save()?;
            tracing::info!(artifact = %target, "removed ledger row");
        }
        tracker.advance(DeletionState::LedgerUpdated)?;

        Ok(report)
    }

    /// Move each identifier down one rank everywhere
    ///
    /// Identifiers are processed lowest first so each destination has
    /// already been vacated. Remote cells are written in one batch per store
    /// after all files and ledger rows have moved.
    ///
    /// # Errors
    /// Returns [`ReconcileError::Domain`] before any change if an identifier
    /// is already at base rank, or the first store or filesystem failure.
    pub async fn renumber(&mut self, ids: &[FusionId]) -> Result<StepReport, ReconcileError> {
        self.ensure_primed().await?;

        let mut ordered = ids.to_vec();
        ordered.sort();
        ordered.dedup();
        let moves = ordered
            .into_iter()
            .map(|id| id.bump_down().map(|to| (id, to)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = StepReport::default();
        let mut pending: Vec<Vec<CellUpdate>> = vec![Vec::new(); self.stores.len()];
        let mut ledger = Ledger::open(&self.ledger_path)?;

        for (from, to) in moves {
            let mut touched = false;

            match self.layout.relocate(&from, &to)? {
                Relocation::Moved { set_aside } => {
                    touched = true;
                    if let Some(path) = set_aside {
                        report.warn(IntegrityWarning::SetAside {
                            identifier: to.to_string(),
                            path,
                        });
                    }
                }
                Relocation::SourceMissing => report.warn(IntegrityWarning::MissingFile {
                    identifier: from.to_string(),
                    path: self.layout.path_for(&from),
                }),
            }

            if ledger.rename(from.as_str(), to.as_str()) == 0 {
                report.warn(IntegrityWarning::MissingLedgerRow {
                    identifier: from.to_string(),
                });
            } else {
                ledger.save()?;
                touched = true;
            }

            for (store, updates) in self.stores.iter_mut().zip(pending.iter_mut()) {
                let Some(view) = store.view.as_mut() else {
                    continue;
                };
                let rows = view.rows_matching(from.as_str());
                if rows.is_empty() {
                    if store.binding.expect_entry {
                        report.warn(IntegrityWarning::MissingRows {
                            store: store.kind,
                            identifier: from.to_string(),
                        });
                    }
                    continue;
                }
                let value = store.binding.cell_value(to.as_str());
                updates.extend(rows.iter().map(|row| CellUpdate {
                    cell: store.binding.cell(*row),
                    value: value.clone(),
                }));
                view.rename_rows(&rows, to.as_str());
                touched = true;
            }

            if touched {
                tracing::info!(from = %from, to = %to, "renumbered");
                report.renamed.push((from, to));
            }
        }

        for (index, updates) in pending.iter().enumerate() {
            if updates.is_empty() {
                continue;
            }
            let store = &self.stores[index];
            let kind = store.kind;
            let binding = &store.binding;
            self.retry
                .run(&format!("update cells in {kind}"), || {
                    self.client.update_cells(&binding.spreadsheet_id, updates)
                })
                .await?;
            tracing::info!(store = %kind, cells = updates.len(), "updated cells");
            report.cells_updated += updates.len();
        }
        self.revalidate_distrusted(&mut report).await?;

        Ok(report)
    }

    /// Delete `target` and shift its higher siblings down
    ///
    /// # Errors
    /// Returns [`ReconcileError`] from the failing step.
    pub async fn run_cycle(
        &mut self,
        target: &FusionId,
        partition: &Partition,
    ) -> Result<CycleReport, ReconcileError> {
        let mut tracker = DeletionTracker::new(target.clone());
        let mut report = self.delete_tracked(&mut tracker).await?;

        if partition.needs_cascade() {
            let cascade = self.renumber(&partition.higher).await?;
            report.absorb(cascade);
            tracker.advance(DeletionState::CascadeApplied)?;
        }
        tracker.advance(DeletionState::Done)?;

        Ok(CycleReport {
            target: target.clone(),
            state: tracker.state(),
            warnings: report.warnings,
            divergences: report.divergences,
            renamed: report.renamed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_store::MemoryStore;
    use std::sync::Arc;

    fn row(value: &str) -> Vec<String> {
        vec![String::new(), String::new(), String::new(), value.to_string()]
    }

    fn engine(dir: &std::path::Path, store: Arc<MemoryStore>) -> ReconciliationEngine<Arc<MemoryStore>> {
        let config = PruneConfig::new(
            dir,
            StoreBinding::responses("dex", 0),
            StoreBinding::credits("credits", 1),
        )
        .with_retry(1, 0);
        ReconciliationEngine::new(&config, store)
    }

    #[tokio::test]
    async fn prime_reads_each_store_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.add_sheet("dex", 0, "RESPONSES", vec![row("h"), row("h"), row("1.1.png")]);
        store.add_sheet("credits", 1, "Credits", vec![row("h"), row("1.1")]);

        let mut engine = engine(dir.path(), Arc::clone(&store));
        engine.prime().await.unwrap();

        assert_eq!(store.calls().reads, 2);
        assert_eq!(engine.snapshot(StoreKind::Responses).unwrap().values(), ["1.1"]);
        assert_eq!(engine.snapshot(StoreKind::Credits).unwrap().values(), ["1.1"]);
    }

    #[tokio::test]
    async fn renumber_rejects_base_rank_before_touching_anything() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Sprite Credits.csv"), "1.1a,A,,\n1.1,B,,\n").unwrap();
        let store = Arc::new(MemoryStore::new());
        store.add_sheet("dex", 0, "RESPONSES", vec![row("h"), row("h")]);
        store.add_sheet("credits", 1, "Credits", vec![row("h"), row("1.1a")]);

        let mut engine = engine(dir.path(), Arc::clone(&store));
        let ids: Vec<FusionId> = vec!["1.1a".parse().unwrap(), "1.1".parse().unwrap()];
        let err = engine.renumber(&ids).await.unwrap_err();

        assert!(matches!(err, ReconcileError::Domain(_)));
        assert_eq!(store.calls().updates, 0);
        let text = std::fs::read_to_string(dir.path().join("Sprite Credits.csv")).unwrap();
        assert_eq!(text, "1.1a,A,,\n1.1,B,,\n");
    }

    #[tokio::test]
    async fn revalidate_without_changes_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.add_sheet("dex", 0, "RESPONSES", vec![row("h"), row("h")]);
        store.add_sheet("credits", 1, "Credits", vec![row("h")]);
        let mut engine = engine(dir.path(), store);
        engine.prime().await.unwrap();
        assert!(engine.revalidate(StoreKind::Credits).await.unwrap().is_none());
    }
}
