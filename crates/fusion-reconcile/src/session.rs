//! One removal run for one user
//!
//! Artifacts are removed one at a time. Each removal re-reads the ledger to
//! find the target's current siblings, so a cascade from an earlier removal
//! is always seen. Queued targets shifted down by that cascade are rewritten
//! to their new identifiers before they are processed.

use crate::backup::{self, Backup};
use crate::engine::{CycleReport, ReconciliationEngine};
use crate::error::{IntegrityWarning, ReconcileError};
use crate::plan::{RemovalPlan, RemovalRequest};
use fusion_ident::{partition, FusionId};
use fusion_store::{Divergence, Ledger, PruneConfig, RemoteStore};
use std::collections::VecDeque;

/// Everything a session did
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub plan: RemovalPlan,
    pub backup: Option<Backup>,
    /// Identifiers removed, as they were named when removed
    pub removed: Vec<FusionId>,
    /// Targets abandoned with the reason
    pub skipped: Vec<(FusionId, String)>,
    pub warnings: Vec<IntegrityWarning>,
    pub divergences: Vec<Divergence>,
}

/// Removal session bound to one configuration and remote client
#[derive(Debug)]
pub struct Session<S> {
    config: PruneConfig,
    engine: ReconciliationEngine<S>,
}

impl<S: RemoteStore> Session<S> {
    #[must_use]
    pub fn new(config: PruneConfig, client: S) -> Self {
        let engine = ReconciliationEngine::new(&config, client);
        Self { config, engine }
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &ReconciliationEngine<S> {
        &self.engine
    }

    /// Remove every artifact the request selects
    ///
    /// # Errors
    /// Returns [`ReconcileError`] for failures that stop the session. Earlier
    /// removals stay applied; the error says where processing stopped.
    pub async fn run(&mut self, request: &RemovalRequest) -> Result<SessionReport, ReconcileError> {
        let username = request.username.as_str();
        let ledger = Ledger::open(self.config.ledger_path())?;
        let plan = RemovalPlan::build(&ledger, request);
        plan.log_exclusions(username);

        let mut report = SessionReport::default();
        if plan.targets.is_empty() {
            tracing::info!(username, "nothing to remove");
            report.plan = plan;
            return Ok(report);
        }

        if request.preserve_data {
            report.backup = Some(backup::preserve(
                &self.config,
                self.engine.layout(),
                &ledger,
                &plan.targets,
                username,
            )?);
        }

        tracing::info!(username, targets = ?display_ids(&plan.targets), "removing artifacts");
        let pause = self.config.pre_delete_pause();
        if !pause.is_zero() {
            tracing::info!(seconds = pause.as_secs(), "pausing before removal");
            tokio::time::sleep(pause).await;
        }

        self.engine.prime().await?;

        let mut queue: VecDeque<FusionId> = plan.targets.iter().cloned().collect();
        report.plan = plan;

        while let Some(target) = queue.pop_front() {
            match self.remove_one(&target).await {
                Ok(cycle) => {
                    requeue_shifted(&mut queue, &cycle.renamed);
                    report.removed.push(cycle.target);
                    report.warnings.extend(cycle.warnings);
                    report.divergences.extend(cycle.divergences);
                }
                Err(e) if e.aborts_artifact_only() => {
                    tracing::error!(artifact = %target, error = %e, "skipping artifact");
                    report.skipped.push((target, e.to_string()));
                }
                Err(e) => {
                    tracing::error!(
                        artifact = %target,
                        removed = report.removed.len(),
                        remaining = queue.len(),
                        error = %e,
                        "stopping session"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            username,
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "removal complete"
        );
        Ok(report)
    }

    async fn remove_one(&mut self, target: &FusionId) -> Result<CycleReport, ReconcileError> {
        let ledger = Ledger::open(self.config.ledger_path())?;
        let split = partition(target, &ledger.fusion_ids())?;
        if split.needs_cascade() {
            let shifts: Vec<String> = split
                .shifted()
                .iter()
                .map(|(from, to)| format!("{from}->{to}"))
                .collect();
            tracing::info!(artifact = %target, ?shifts, "removing with cascade");
        } else {
            tracing::info!(artifact = %target, "removing");
        }
        self.engine.run_cycle(target, &split).await
    }
}

/// Rewrite queued identifiers that a cascade moved
fn requeue_shifted(queue: &mut VecDeque<FusionId>, renamed: &[(FusionId, FusionId)]) {
    for queued in queue.iter_mut() {
        if let Some((_, to)) = renamed.iter().find(|(from, _)| from == queued) {
            tracing::info!(from = %queued, to = %to, "queued artifact renumbered");
            *queued = to.clone();
        }
    }
}

fn display_ids(ids: &[FusionId]) -> Vec<&str> {
    ids.iter().map(FusionId::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FusionId {
        s.parse().unwrap()
    }

    #[test]
    fn requeue_rewrites_only_shifted_entries() {
        let mut queue: VecDeque<FusionId> = [id("1.59c"), id("2.2a"), id("1.59d")].into();
        let renamed = vec![(id("1.59c"), id("1.59b")), (id("1.59d"), id("1.59c"))];
        requeue_shifted(&mut queue, &renamed);
        let ids: Vec<&str> = queue.iter().map(FusionId::as_str).collect();
        assert_eq!(ids, vec!["1.59b", "2.2a", "1.59c"]);
    }

    #[test]
    fn requeue_applies_each_rename_once() {
        // 1.59c -> 1.59b must not chain into a later 1.59b -> 1.59a
        let mut queue: VecDeque<FusionId> = [id("1.59c")].into();
        let renamed = vec![(id("1.59b"), id("1.59a")), (id("1.59c"), id("1.59b"))];
        requeue_shifted(&mut queue, &renamed);
        assert_eq!(queue[0].as_str(), "1.59b");
    }
}
