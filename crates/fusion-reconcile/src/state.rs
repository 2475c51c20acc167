//! Per-deletion state machine
//!
//! `Pending → StoresCleared → FileRemoved → LedgerUpdated → (CascadeApplied) → Done`
//!
//! Steps are never skipped and never rolled back. A failure leaves the
//! tracker at the last completed state, which tells the operator what was
//! already applied.

use crate::error::ReconcileError;
use fusion_ident::FusionId;

/// Progress of one artifact deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionState {
    Pending,
    /// Remote rows deleted
    StoresCleared,
    /// Artifact file deleted
    FileRemoved,
    /// Ledger row removed
    LedgerUpdated,
    /// Higher siblings renumbered
    CascadeApplied,
    Done,
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: DeletionState) -> Vec<DeletionState> {
    use DeletionState::*;
    match from {
        Pending => vec![StoresCleared],
        StoresCleared => vec![FileRemoved],
        FileRemoved => vec![LedgerUpdated],
        LedgerUpdated => vec![CascadeApplied, Done],
        CascadeApplied => vec![Done],
        Done => vec![],
    }
}

/// Check a single step
///
/// # Errors
/// Returns [`ReconcileError::IllegalTransition`] if `to` is not reachable from `from`.
pub fn validate_transition(
    target: &FusionId,
    from: DeletionState,
    to: DeletionState,
) -> Result<(), ReconcileError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ReconcileError::IllegalTransition {
            target: target.to_string(),
            from,
            to,
        })
    }
}

/// Current state of one deletion
#[derive(Debug, Clone)]
pub struct DeletionTracker {
    target: FusionId,
    state: DeletionState,
}

impl DeletionTracker {
    #[must_use]
    pub fn new(target: FusionId) -> Self {
        Self {
            target,
            state: DeletionState::Pending,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> DeletionState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &FusionId {
        &self.target
    }

    /// Move to the next state
    ///
    /// # Errors
    /// Returns [`ReconcileError::IllegalTransition`] for a skipped or repeated step.
    pub fn advance(&mut self, to: DeletionState) -> Result<(), ReconcileError> {
        validate_transition(&self.target, self.state, to)?;
        tracing::debug!(artifact = %self.target, from = ?self.state, ?to, "deletion step");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeletionState::*;

    fn tracker() -> DeletionTracker {
        DeletionTracker::new("1.59a".parse().unwrap())
    }

    #[test]
    fn walks_full_cycle_with_cascade() {
        let mut t = tracker();
        for next in [StoresCleared, FileRemoved, LedgerUpdated, CascadeApplied, Done] {
            t.advance(next).unwrap();
        }
        assert_eq!(t.state(), Done);
    }

    #[test]
    fn cascade_is_optional() {
        let mut t = tracker();
        for next in [StoresCleared, FileRemoved, LedgerUpdated, Done] {
            t.advance(next).unwrap();
        }
        assert_eq!(t.state(), Done);
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let mut t = tracker();
        let err = t.advance(FileRemoved).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::IllegalTransition {
                from: Pending,
                to: FileRemoved,
                ..
            }
        ));
        assert_eq!(t.state(), Pending);
    }

    #[test]
    fn done_is_terminal() {
        assert!(allowed_transitions(Done).is_empty());
        let target: FusionId = "1.1".parse().unwrap();
        assert!(validate_transition(&target, Done, Pending).is_err());
    }

    #[test]
    fn every_state_but_done_has_a_successor() {
        for state in [Pending, StoresCleared, FileRemoved, LedgerUpdated, CascadeApplied] {
            assert!(!allowed_transitions(state).is_empty(), "{state:?}");
        }
    }
}
