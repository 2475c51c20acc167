//! Error types for the reconciliation layer
//!
//! - Identifier errors abort the artifact being processed
//! - Store errors (remote calls past their retries, ledger and file IO)
//!   abort the whole session, leaving earlier steps in place
//! - Integrity warnings are not errors; see [`IntegrityWarning`]

use crate::state::DeletionState;
use fusion_ident::{CascadeError, DomainError, ParseError};
use fusion_store::{ConfigError, StoreError, StoreKind};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Reconciliation failure
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Malformed identifier
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Rank arithmetic below base
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Sibling group violates rank uniqueness
    #[error("cascade error: {0}")]
    Cascade(#[from] CascadeError),

    /// Store access failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Deletion step attempted out of order
    #[error("illegal transition {from:?} -> {to:?} while deleting {target}")]
    IllegalTransition {
        target: String,
        from: DeletionState,
        to: DeletionState,
    },
}

impl ReconcileError {
    /// Whether only the current artifact is abandoned
    ///
    /// Everything else stops the session.
    #[inline]
    #[must_use]
    pub fn aborts_artifact_only(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Domain(_) | Self::Cascade(_))
    }

    /// Whether a remote call exhausted its retries
    #[inline]
    #[must_use]
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

/// Stores disagree with the ledger; processing continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// A store expected to hold the artifact has no row for it
    MissingRows { store: StoreKind, identifier: String },
    /// Artifact file not on disk
    MissingFile { identifier: String, path: PathBuf },
    /// Ledger has no row for the artifact
    MissingLedgerRow { identifier: String },
    /// A file occupying a renumber destination was moved aside
    SetAside { identifier: String, path: PathBuf },
}

impl Display for IntegrityWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRows { store, identifier } => {
                write!(f, "no rows in {store} store for {identifier}")
            }
            Self::MissingFile { identifier, path } => {
                write!(f, "file for {identifier} not found at {}", path.display())
            }
            Self::MissingLedgerRow { identifier } => write!(f, "no ledger row for {identifier}"),
            Self::SetAside { identifier, path } => {
                write!(f, "existing {identifier} moved aside to {}", path.display())
            }
        }
    }
}
