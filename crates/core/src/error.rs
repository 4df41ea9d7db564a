//! Error type shared by the loading, building and persistence paths.
//!
//! Searches never fail: they return an empty outcome when no seed is usable.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for fallible proxgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while loading, building or persisting a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A required input file could not be opened. Fatal for the operation.
    #[error("can't open {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single record failed to parse. Loaders report these per line.
    #[error("{path:?}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dataset is empty")]
    EmptyDataset,

    /// Snapshot failed its checksum or structural validation.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}
