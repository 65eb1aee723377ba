//! Error types for the quarry engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by store, index, and pipeline operations.
///
/// Absent documents and empty-index searches are not errors; they are
/// encoded in return values ([`crate::types::RemoveOutcome::NotFound`],
/// empty result vectors).
#[derive(Debug, Error)]
pub enum QuarryError {
    /// Invalid configuration (bad chunking parameters, reused vector ids).
    /// Fatal, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding or query vector length does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was built with.
        expected: usize,
        /// Dimension actually provided.
        actual: usize,
    },

    /// The embedding provider failed; the store's state is unchanged.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// The text generator failed.
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    /// Disk I/O failed while persisting or restoring a snapshot. An
    /// already-applied in-memory mutation is not rolled back; callers
    /// should retry [`persist`](crate::store::DocumentStore::persist).
    #[error("persistence error at {}: {source}", path.display())]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing or deserializing snapshot data failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted snapshot is partially present or internally
    /// inconsistent and was refused rather than loaded silently.
    #[error("inconsistent snapshot: {0}")]
    Snapshot(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
