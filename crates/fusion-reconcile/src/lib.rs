//! Fusion reconciliation
//!
//! Removes a user's artifacts from the ledger, the artifact directories and
//! both remote stores, then shifts every higher sibling down one rank so
//! each group stays contiguous.
//!
//! - [`ReconciliationEngine`]: one deletion or renumber across every store
//! - [`DeletionState`]: the order in which a deletion touches the stores
//! - [`RemovalPlan`]: which ledger rows a [`RemovalRequest`] selects
//! - [`Session`]: a whole run for one user

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backup;
pub mod engine;
mod error;
pub mod plan;
pub mod session;
pub mod state;

pub use backup::Backup;
pub use engine::{CycleReport, ReconciliationEngine, StepReport};
pub use error::{IntegrityWarning, ReconcileError};
pub use plan::{RemovalPlan, RemovalRequest};
pub use session::{Session, SessionReport};
pub use state::{DeletionState, DeletionTracker};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
