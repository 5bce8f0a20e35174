//! File-based configuration.
//!
//! # Responsibility
//! - Load decoder, storage and logging settings from a TOML file.
//!
//! # Invariants
//! - Every section is optional; missing values fall back to defaults.
//! - Unknown keys are rejected so typos do not silently change behavior.
//!
//! Example:
//! ```toml
//! db_path = "/var/lib/lyricsync/songs.sqlite3"
//!
//! [logging]
//! level = "info"
//! dir = "/var/log/lyricsync"
//!
//! [decode]
//! unmatched = "keep_as_text"
//! strict_word_pairing = false
//! ```

use crate::lyrics::line_encoder::DecodeOptions;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Database file used when neither the config nor the caller names one.
pub const DEFAULT_DB_FILE_NAME: &str = "lyricsync.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Logging section; logging stays off until `dir` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Absolute directory for rolling log files.
    pub dir: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LyricsyncConfig {
    pub db_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub decode: DecodeOptions,
}

impl LyricsyncConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Parse)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Configured database path, or the default file name in the working directory.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME))
    }
}
