//! Copies of removed artifacts
//!
//! Before anything is deleted the selected files and their ledger rows are
//! copied to `<removed_dir>/<username>/`, mirroring the repository layout.

use fusion_ident::FusionId;
use fusion_store::ledger::write_records;
use fusion_store::{ArtifactLayout, Ledger, PruneConfig, StoreError};
use std::path::{Path, PathBuf};

/// Outcome of a backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub dir: PathBuf,
    pub copied: usize,
    /// Selected identifiers with no file on disk
    pub missing: Vec<FusionId>,
}

/// Directory name for a user, with path separators replaced
fn user_dir_name(username: &str) -> String {
    let name: String = username
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => name,
    }
}

/// Copy `targets` and their ledger rows aside
///
/// # Errors
/// Returns [`StoreError::Io`] if a directory or copy fails, or
/// [`StoreError::Ledger`] if the ledger subset cannot be written.
pub fn preserve(
    config: &PruneConfig,
    layout: &ArtifactLayout,
    ledger: &Ledger,
    targets: &[FusionId],
    username: &str,
) -> Result<Backup, StoreError> {
    let dir = config.removed_dir.join(user_dir_name(username));
    let mut backup = Backup {
        dir: dir.clone(),
        copied: 0,
        missing: Vec::new(),
    };

    for id in targets {
        let source = layout.path_for(id);
        if !source.exists() {
            tracing::warn!(identifier = %id, path = %source.display(), "no file to back up");
            backup.missing.push(id.clone());
            continue;
        }
        let dest_dir = dir.join(layout.relative_dir(id));
        create_dir(&dest_dir)?;
        let dest = dest_dir.join(layout.file_name(id));
        std::fs::copy(&source, &dest).map_err(|e| StoreError::io_error(&source, e))?;
        backup.copied += 1;
    }

    create_dir(&dir)?;
    write_records(&dir.join(&config.ledger_file), &ledger.subset(targets))?;

    tracing::info!(
        dir = %dir.display(),
        copied = backup.copied,
        missing = backup.missing.len(),
        "backed up artifacts"
    );
    Ok(backup)
}

fn create_dir(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path).map_err(|e| StoreError::io_error(path, e))
}
