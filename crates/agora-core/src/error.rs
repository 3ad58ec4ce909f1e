//! # EngineError
//!
//! Centralized error handling for the Agora engine.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced forum, discussion, or post does not exist.
    #[error("{kind} not found with ID {id}")]
    NotFound { kind: &'static str, id: String },

    /// A flag name outside the registry was used. Programming error, never
    /// a silent no-op.
    #[error("unknown flag: {0}")]
    InvalidFlag(String),

    /// An action name with no handler in the dispatch table.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Broken linkage in fetched data (e.g. a reply whose parent is outside
    /// its own discussion), surfaced under the fail-fast batch policy.
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Store-layer failure, passed through unmodified. Retries, if any,
    /// belong to the storage collaborator.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// A specialized Result type for engine logic.
pub type Result<T> = std::result::Result<T, EngineError>;
