//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the inference engine and its
//! collaborators. Implementations live in other crates or in the host service.

use crate::{Direction, Entity, EntityId, Neighbor, Relationship, RelationshipType, UpsertOutcome};

/// Read access to the entity store
///
/// Implemented by the host service that owns entity persistence
pub trait EntityStore {
    /// Error type for store operations
    type Error;

    /// Get an entity by ID, `None` if it does not exist
    fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>, Self::Error>;

    /// List every known entity
    fn list_entities(&self) -> Result<Vec<Entity>, Self::Error>;
}

/// Numeric similarity between two entities
///
/// Implemented by the host's embedding layer. Scores must lie in [0, 1]; the
/// engine does not reinterpret what a score means.
pub trait SimilarityProvider {
    /// Error type for similarity lookups
    type Error;

    /// Similarity score of two entities
    fn similarity(&self, a: &EntityId, b: &EntityId) -> Result<f64, Self::Error>;
}

/// Storage for accepted relationships
///
/// Implemented by the in-memory graph (trellis-graph) and the SQLite
/// persistence layer (trellis-store). Every implementation enforces the
/// self-loop and one-edge-per-key invariants, and runs the check-and-write of
/// `upsert` atomically with respect to concurrent callers.
pub trait RelationshipStore {
    /// Error type for store operations
    type Error;

    /// Insert an edge or merge it into the existing edge with the same key
    fn upsert(&self, relationship: Relationship) -> Result<UpsertOutcome, Self::Error>;

    /// Edges adjacent to an entity in the given direction
    fn neighbors(&self, id: &EntityId, direction: Direction) -> Result<Vec<Neighbor>, Self::Error>;

    /// Whether an edge exists for the key
    fn has_edge(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<bool, Self::Error> {
        Ok(self.get(source, target, relationship_type)?.is_some())
    }

    /// The accepted edge for a key, if any
    fn get(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<Option<Relationship>, Self::Error>;

    /// A consistent copy of every accepted edge
    fn relationships(&self) -> Result<Vec<Relationship>, Self::Error>;
}
