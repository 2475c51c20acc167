//! Error types for store access
//!
//! Covers the local ledger file, artifact files on disk and the remote
//! tabular stores. Remote failures are transient and go through the
//! [`RetryExecutor`](crate::RetryExecutor) before they surface.

use std::path::PathBuf;

/// Store access failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error on an artifact or ledger path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ledger file could not be parsed or written
    #[error("ledger error on {path}: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// HTTP transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store answered with a non-success status
    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint URL could not be built
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Spreadsheet or sheet does not exist
    #[error("unknown sheet {sheet} in spreadsheet {spreadsheet}")]
    UnknownSheet { spreadsheet: String, sheet: String },

    /// Row outside the sheet
    #[error("row {row} out of range in sheet {sheet}")]
    RowOutOfRange { sheet: String, row: u32 },

    /// Any other remote failure
    #[error("remote store failure: {0}")]
    Remote(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create ledger error for path
    pub fn ledger_error(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Ledger {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure came from a remote call
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Remote(_) | Self::RowOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "remote store returned 503: unavailable");
    }

    #[test]
    fn remote_failures_are_transient() {
        assert!(StoreError::Remote("boom".to_string()).is_transient());
        assert!(!StoreError::io_error(
            "x.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone")
        )
        .is_transient());
    }
}
