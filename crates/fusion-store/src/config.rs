//! Configuration
//!
//! Binds the deletion protocol to concrete store instances. Loaded from a
//! TOML file; library code never embeds spreadsheet ids or paths.
//!
//! ```toml
//! repo_path = "/srv/customsprites"
//! removed_dir = "/srv/customsprites/Removed"
//!
//! [responses]
//! spreadsheet_id = "1AbC"
//! sheet_id = 0
//! sheet_name = "RESPONSES"
//! header_rows = 2
//! carries_extension = true
//!
//! [credits]
//! spreadsheet_id = "1XyZ"
//! sheet_id = 12
//! sheet_name = "Credits"
//! header_rows = 1
//! expect_entry = true
//! ```

use crate::layout::LayoutSettings;
use crate::remote::{CellRef, ColumnRange};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File extension carried by identifier cells in some stores
pub const CELL_EXTENSION: &str = ".png";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`PruneConfig`]
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Value out of range or missing
    #[error("invalid config value: {0}")]
    Invalid(String),

    /// Access token environment variable not set
    #[error("access token variable {0} is not set")]
    MissingToken(String),
}

/// Binding of one remote store to its spreadsheet and column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreBinding {
    pub spreadsheet_id: String,
    /// Numeric sheet id used by row deletes
    pub sheet_id: u64,
    pub sheet_name: String,
    /// Identifier column letter
    #[serde(default = "default_column")]
    pub column: String,
    /// Rows above the first identifier
    pub header_rows: u32,
    /// Identifier cells end in [`CELL_EXTENSION`]
    #[serde(default)]
    pub carries_extension: bool,
    /// Every artifact should have at least one row here
    #[serde(default)]
    pub expect_entry: bool,
}

fn default_column() -> String {
    "D".to_string()
}

impl StoreBinding {
    /// Response log convention: two header rows, values carry `.png`, entries optional
    #[must_use]
    pub fn responses(spreadsheet_id: impl Into<String>, sheet_id: u64) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_id,
            sheet_name: "RESPONSES".to_string(),
            column: default_column(),
            header_rows: 2,
            carries_extension: true,
            expect_entry: false,
        }
    }

    /// Credit sheet convention: one header row, bare identifiers, entry expected
    #[must_use]
    pub fn credits(spreadsheet_id: impl Into<String>, sheet_id: u64) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_id,
            sheet_name: "Credits".to_string(),
            column: default_column(),
            header_rows: 1,
            carries_extension: false,
            expect_entry: true,
        }
    }

    /// Identifier column from the first data row down
    #[must_use]
    pub fn column_range(&self) -> ColumnRange {
        ColumnRange {
            sheet: self.sheet_name.clone(),
            column: self.column.clone(),
            start_row: self.header_rows + 1,
        }
    }

    /// Identifier cell of a native row
    #[must_use]
    pub fn cell(&self, row: u32) -> CellRef {
        CellRef {
            sheet: self.sheet_name.clone(),
            column: self.column.clone(),
            row,
        }
    }

    /// Extension stripped from and appended to identifier cells
    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&'static str> {
        self.carries_extension.then_some(CELL_EXTENSION)
    }

    /// Cell text for an identifier under this store's convention
    #[must_use]
    pub fn cell_value(&self, identifier: &str) -> String {
        format!("{identifier}{}", self.extension().unwrap_or(""))
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{name}.spreadsheet_id is empty")));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{name}.sheet_name is empty")));
        }
        if self.column.is_empty() || !self.column.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "{name}.column must be uppercase letters, got {:?}",
                self.column
            )));
        }
        Ok(())
    }
}

/// Retry settings as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_secs: 10,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        RetryPolicy::new(settings.max_attempts, Duration::from_secs(settings.delay_secs))
    }
}

/// Remote API endpoint and credential source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    pub api_base: String,
    /// Environment variable holding a bearer token
    pub token_env: String,
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com".to_string(),
            token_env: "FUSION_PRUNE_TOKEN".to_string(),
        }
    }
}

impl SheetsSettings {
    /// Read the bearer token from the configured environment variable
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingToken`] if the variable is unset or empty.
    pub fn token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken(self.token_env.clone()))
    }
}

/// Full tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneConfig {
    /// Repository holding the artifact files and the ledger
    pub repo_path: PathBuf,
    /// Root for backups of removed artifacts
    pub removed_dir: PathBuf,
    /// Ledger file name inside `repo_path`
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
    #[serde(default)]
    pub layout: LayoutSettings,
    pub responses: StoreBinding,
    pub credits: StoreBinding,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Re-read every store after each mutation and compare with the snapshot
    #[serde(default = "default_true")]
    pub distrust_cache: bool,
    /// Pause before the first destructive step
    #[serde(default = "default_pause")]
    pub pre_delete_pause_secs: u64,
    #[serde(default)]
    pub sheets: SheetsSettings,
}

fn default_ledger_file() -> String {
    "Sprite Credits.csv".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pause() -> u64 {
    5
}

impl PruneConfig {
    /// Create configuration with default settings for the given stores
    #[must_use]
    pub fn new(
        repo_path: impl Into<PathBuf>,
        responses: StoreBinding,
        credits: StoreBinding,
    ) -> Self {
        let repo_path = repo_path.into();
        Self {
            removed_dir: repo_path.join("Removed"),
            repo_path,
            ledger_file: default_ledger_file(),
            layout: LayoutSettings::default(),
            responses,
            credits,
            retry: RetrySettings::default(),
            distrust_cache: true,
            pre_delete_pause_secs: default_pause(),
            sheets: SheetsSettings::default(),
        }
    }

    /// Load and validate a TOML config file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is unreadable, malformed or invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the text is malformed or invalid.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.ledger_file.trim().is_empty() {
            return Err(ConfigError::Invalid("ledger_file is empty".into()));
        }
        self.responses.validate("responses")?;
        self.credits.validate("credits")?;
        Ok(())
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, max_attempts: u32, delay_secs: u64) -> Self {
        self.retry = RetrySettings {
            max_attempts,
            delay_secs,
        };
        self
    }

    /// With cache distrust toggled
    #[inline]
    #[must_use]
    pub fn with_distrust_cache(mut self, distrust: bool) -> Self {
        self.distrust_cache = distrust;
        self
    }

    /// With pause before destructive steps
    #[inline]
    #[must_use]
    pub fn with_pre_delete_pause(mut self, secs: u64) -> Self {
        self.pre_delete_pause_secs = secs;
        self
    }

    /// With backup root
    #[inline]
    #[must_use]
    pub fn with_removed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.removed_dir = dir.into();
        self
    }

    /// Full path of the ledger file
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.repo_path.join(&self.ledger_file)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.into()
    }

    #[must_use]
    pub fn pre_delete_pause(&self) -> Duration {
        Duration::from_secs(self.pre_delete_pause_secs)
    }
}
