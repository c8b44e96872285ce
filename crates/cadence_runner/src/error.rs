// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use std::path::PathBuf;

/// Error that stops the runner before or while driving a preset
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A file could not be read or written
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The run configuration is not valid RON
    #[error("Invalid run config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// The run configuration could not be written as RON
    #[error("Failed to serialize run config: {0}")]
    RonWrite(#[from] ron::Error),

    /// The preset is not valid JSON
    #[error("Invalid preset: {0}")]
    Json(#[from] serde_json::Error),

    /// The run configuration was written by a newer runner
    #[error("Run config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Highest version this runner reads
        supported: u32,
    },

    /// A setting is out of range
    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
