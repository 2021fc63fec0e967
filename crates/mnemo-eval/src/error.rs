//! Evaluation driver error types.

use mnemo_abstraction::ModelError;
use mnemo_memory::MemoryError;
use std::io;

/// Evaluation driver errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Missing or invalid settings (unknown provider, scenario or learner
    /// name, missing required key). Fatal; aborts the run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A configured learner could not be constructed.
    #[error("learner resolution error: {0}")]
    AgentResolution(String),

    /// Model client error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Similarity-store error.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Settings file parse error.
    #[error("settings parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
