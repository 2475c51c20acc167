//! Fusion stores
//!
//! Everything the deletion protocol reads from or writes to:
//! - [`Ledger`]: the local credits file, one artifact per row
//! - [`RemoteStore`]: range read, row delete and cell update against a
//!   remote tabular store ([`SheetsClient`] over HTTP, [`MemoryStore`] in process)
//! - [`StoreView`]: cached snapshot of a remote identifier column
//! - [`ArtifactLayout`]: where artifact files live on disk
//! - [`RetryExecutor`]: bounded fixed-delay retries around remote calls

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod attribution;
pub mod config;
mod error;
pub mod layout;
pub mod ledger;
pub mod memory;
pub mod remote;
pub mod retry;
pub mod sheets;
pub mod view;

pub use attribution::{classify, normalize, Authorship};
pub use config::{ConfigError, PruneConfig, RetrySettings, SheetsSettings, StoreBinding};
pub use error::StoreError;
pub use layout::{ArtifactLayout, LayoutSettings, Relocation};
pub use ledger::{Ledger, LedgerRecord};
pub use memory::{CallCounts, MemoryStore};
pub use remote::{CellRef, CellUpdate, ColumnRange, RemoteStore, StoreKind};
pub use retry::{RetryExecutor, RetryPolicy};
pub use sheets::SheetsClient;
pub use view::{Divergence, StoreView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
