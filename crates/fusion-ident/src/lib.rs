//! Fusion identifiers
//!
//! Parsing and ordering of artifact identifiers inside a sibling group.
//!
//! # Core Concepts
//!
//! - [`FusionId`]: parsed identifier with a group key and a variant suffix
//! - [`numeral`]: bijective base-26 codec mapping suffixes to ranks
//! - [`Partition`]: siblings below and above a deletion target
//!
//! # Example
//!
//! ```rust
//! use fusion_ident::{partition, FusionId};
//!
//! let target: FusionId = "1.59a".parse().unwrap();
//! let group: Vec<FusionId> = ["1.59", "1.59a", "1.59b"]
//!     .iter()
//!     .map(|s| s.parse().unwrap())
//!     .collect();
//!
//! let split = partition(&target, &group).unwrap();
//! assert_eq!(split.higher[0].bump_down().unwrap().as_str(), "1.59a");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cascade;
mod error;
pub mod identifier;
pub mod numeral;

pub use cascade::{partition, Partition};
pub use error::{CascadeError, DomainError, NumeralError, ParseError};
pub use identifier::FusionId;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
