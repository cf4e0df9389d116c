//! # Client Error Types

use std::path::PathBuf;

use terrastream_terrain::TerrainError;
use thiserror::Error;

/// Errors surfaced by the host client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Terrain configuration or build failure.
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    /// The snapshot is not valid JSON or lacks the `map` field.
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Bad command-line arguments.
    #[error("usage: {0}")]
    Usage(String),

    /// The log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
