//! Trellis Domain Layer
//!
//! Core vocabulary of the relationship inference engine: the entities it
//! reads, the typed and confidence-scored relationships it derives, the error
//! taxonomy, and the trait boundaries to its external collaborators.
//!
//! ## Key Concepts
//!
//! - **Entity**: A named, typed node owned by an external entity store
//! - **Relationship**: A directed, typed edge with a confidence score
//! - **Confidence**: A score in [0, 1] with a derived coarse label
//! - **Discovery method**: Provenance tag recording how an edge was derived
//!
//! ## Architecture
//!
//! This crate holds no algorithms and performs no I/O:
//! - Value types and invariants only
//! - Classifier, extractor, graph, and discoverer live in other crates
//! - Trait definitions for every external interaction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod entity;
pub mod error;
pub mod provenance;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use confidence::{Confidence, ConfidenceLevel};
pub use entity::{Entity, EntityId, EntityKind};
pub use error::{Result, TrellisError};
pub use provenance::{DiscoveryMethod, Evidence};
pub use relationship::{
    Direction, EdgeKey, Neighbor, Relationship, RelationshipType, TypeOrigin, UpsertOutcome,
};
