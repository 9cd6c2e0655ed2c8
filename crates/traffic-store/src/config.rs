//! Store configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::MAX_RECORDS;

/// Settings a host application can keep in a TOML file.
///
/// ```toml
/// history_file = "/var/lib/netmon/history_traffic.dat"
/// max_records = 3650
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// History file location. Defaults to [`default_history_path`].
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Most records accepted when loading. Values above the hard cap are clamped.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    MAX_RECORDS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            max_records: default_max_records(),
        }
    }
}

impl StoreConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The history file to use, falling back to the platform default.
    pub fn resolved_path(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(default_history_path)
    }

    /// The record cap to apply, never above [`MAX_RECORDS`].
    pub fn effective_max_records(&self) -> usize {
        self.max_records.min(MAX_RECORDS)
    }
}

/// Default history file path following platform conventions.
///
/// - Linux: `~/.local/share/traffic-history/history_traffic.dat`
/// - macOS: `~/Library/Application Support/traffic-history/history_traffic.dat`
/// - Windows: `C:\Users\<user>\AppData\Local\traffic-history\history_traffic.dat`
pub fn default_history_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("traffic-history")
        .join("history_traffic.dat")
}
