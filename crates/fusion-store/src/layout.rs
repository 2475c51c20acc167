//! Artifact files on disk
//!
//! Base sprites (identifiers without a decimal point) and fusions live in
//! separate directories under the repository root.

use crate::error::StoreError;
use fusion_ident::FusionId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory and extension conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub base_dir: PathBuf,
    pub fusion_dir: PathBuf,
    pub extension: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            base_dir: Path::new("Other").join("BaseSprites"),
            fusion_dir: PathBuf::from("CustomBattlers"),
            extension: "png".to_string(),
        }
    }
}

/// Result of moving an artifact file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// File moved; an existing destination was first moved to `set_aside`
    Moved { set_aside: Option<PathBuf> },
    /// Nothing to move
    SourceMissing,
}

/// Artifact file locations under one repository root
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
    settings: LayoutSettings,
}

impl ArtifactLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, settings: LayoutSettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory relative to the root
    #[must_use]
    pub fn relative_dir(&self, id: &FusionId) -> &Path {
        if id.is_base_sprite() {
            &self.settings.base_dir
        } else {
            &self.settings.fusion_dir
        }
    }

    /// File name of an identifier, e.g. `1.59a.png`
    #[must_use]
    pub fn file_name(&self, id: &FusionId) -> String {
        format!("{id}.{}", self.settings.extension)
    }

    #[must_use]
    pub fn path_for(&self, id: &FusionId) -> PathBuf {
        self.root.join(self.relative_dir(id)).join(self.file_name(id))
    }

    /// Where a colliding file is moved aside, e.g. `1.59a_temp.png`
    #[must_use]
    pub fn aside_path_for(&self, id: &FusionId) -> PathBuf {
        self.root
            .join(self.relative_dir(id))
            .join(format!("{id}_temp.{}", self.settings.extension))
    }

    /// First aside name not already taken: `_temp`, then `_temp1`, `_temp2`, ...
    fn free_aside_path(&self, id: &FusionId) -> PathBuf {
        let first = self.aside_path_for(id);
        if !first.exists() {
            return first;
        }
        let dir = self.root.join(self.relative_dir(id));
        (1u32..)
            .map(|n| dir.join(format!("{id}_temp{n}.{}", self.settings.extension)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    /// Delete an artifact file, returning whether it existed
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] for failures other than a missing file.
    pub fn remove(&self, id: &FusionId) -> Result<bool, StoreError> {
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    /// Move the file of `from` to the name of `to`
    ///
    /// A file already at the destination is moved aside first, never
    /// overwritten. Earlier aside files are kept too.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if a rename fails.
    pub fn relocate(&self, from: &FusionId, to: &FusionId) -> Result<Relocation, StoreError> {
        let source = self.path_for(from);
        if !source.exists() {
            return Ok(Relocation::SourceMissing);
        }
        let destination = self.path_for(to);

        let set_aside = if destination.exists() {
            let aside = self.free_aside_path(to);
            tracing::warn!(
                destination = %destination.display(),
                aside = %aside.display(),
                "destination already exists, moving it aside"
            );
            std::fs::rename(&destination, &aside)
                .map_err(|e| StoreError::io_error(&destination, e))?;
            Some(aside)
        } else {
            None
        };

        std::fs::rename(&source, &destination).map_err(|e| StoreError::io_error(&source, e))?;
        Ok(Relocation::Moved { set_aside })
    }
}
