//! Error types for Curator operations

use thiserror::Error;
use trellis_domain::TrellisError;

/// Errors that can occur during Curator operations
#[derive(Error, Debug)]
pub enum CuratorError {
    /// Entity store or similarity provider error
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Relationship store error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by the inference engine
    #[error(transparent)]
    Engine(#[from] TrellisError),
}

impl CuratorError {
    /// Whether the entity was missing from the entity store
    pub fn is_not_found(&self) -> bool {
        matches!(self, CuratorError::Engine(TrellisError::NotFound(_)))
    }
}
