//! Error types for traffic-store.

use std::path::PathBuf;

/// Result type for traffic-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in traffic-store.
///
/// Loading never fails; these come from saving and from configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create the directory that holds the history file.
    #[error("Failed to create history directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the temporary file or moving it into place failed.
    ///
    /// The target file is left exactly as it was.
    #[error("Failed to save history to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
