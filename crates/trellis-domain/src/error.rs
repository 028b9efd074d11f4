//! Error taxonomy shared by every component of the engine

use thiserror::Error;

/// Errors raised by the relationship inference engine
///
/// None of these is fatal to the hosting process; all are recoverable at the
/// call boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrellisError {
    /// Malformed call arguments or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity id does not exist in the entity store
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Contention reported by the concurrency primitive; retried internally
    #[error("Concurrent conflict: {0}")]
    ConcurrentConflict(String),

    /// Failure reported by an external collaborator
    #[error("Store error: {0}")]
    Store(String),
}

impl TrellisError {
    /// Whether the failed operation may simply be executed again
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrellisError::ConcurrentConflict(_))
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, TrellisError>;
