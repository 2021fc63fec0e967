//! Similarity-store error types.

use mnemo_abstraction::ModelError;
use std::io;

/// Similarity-store errors.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The store directory is unusable or the vector backend cannot be opened.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A vector-index id has no side-table entry. The index and side table
    /// are supposed to stay in lockstep; this is not recoverable.
    #[error("vector index entry {0} has no side-table entry")]
    InconsistentIndex(u64),

    /// I/O error during store operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error for the persisted side table.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Vector backend error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Embedding the input or query text failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] ModelError),
}

/// Result type for similarity-store operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
