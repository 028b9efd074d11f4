//! In-memory relationship graph with source and target indexing

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use trellis_domain::{
    traits::RelationshipStore, Direction, EdgeKey, EntityId, Neighbor, Relationship,
    RelationshipType, Result, TrellisError, UpsertOutcome,
};

#[derive(Debug, Default)]
struct GraphState {
    /// Accepted edges by key
    edges: HashMap<EdgeKey, Relationship>,
    /// Source id → keys of its outgoing edges
    outgoing: HashMap<EntityId, BTreeSet<EdgeKey>>,
    /// Target id → keys of its incoming edges
    incoming: HashMap<EntityId, BTreeSet<EdgeKey>>,
}

impl GraphState {
    fn insert(&mut self, relationship: Relationship) {
        let key = relationship.key();
        self.outgoing
            .entry(key.source.clone())
            .or_default()
            .insert(key.clone());
        self.incoming
            .entry(key.target.clone())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, relationship);
    }

    fn neighbor(&self, key: &EdgeKey, direction: Direction) -> Option<Neighbor> {
        let edge = self.edges.get(key)?;
        let entity = match direction {
            Direction::Incoming => edge.source.clone(),
            _ => edge.target.clone(),
        };
        Some(Neighbor {
            entity,
            relationship_type: edge.relationship_type,
            confidence: edge.confidence,
            direction,
        })
    }

    fn adjacent(&self, id: &EntityId, direction: Direction) -> Vec<Neighbor> {
        let index = match direction {
            Direction::Incoming => &self.incoming,
            _ => &self.outgoing,
        };
        index
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.neighbor(key, direction))
            .collect()
    }
}

/// Directed, typed multi-edge graph of accepted relationships
///
/// The whole graph sits behind one `RwLock`. `upsert` holds the write lock
/// for its check-and-write, so two concurrent upserts of the same key can
/// never both insert. Readers share the lock and always see a consistent
/// edge set.
///
/// # Examples
///
/// ```
/// use trellis_graph::RelationshipGraph;
/// use trellis_domain::{DiscoveryMethod, Relationship, RelationshipType, UpsertOutcome};
///
/// let graph = RelationshipGraph::new();
/// let edge = Relationship::new(
///     "pytest-cov",
///     "pytest",
///     RelationshipType::DependsOn,
///     0.7,
///     DiscoveryMethod::Pattern,
/// );
///
/// assert_eq!(graph.upsert(edge.clone()).unwrap(), UpsertOutcome::Inserted);
/// assert_eq!(graph.upsert(edge).unwrap(), UpsertOutcome::Unchanged);
/// assert_eq!(graph.len().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    state: RwLock<GraphState>,
}

impl RelationshipGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|_| TrellisError::Store("graph lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GraphState>> {
        self.state
            .write()
            .map_err(|_| TrellisError::Store("graph lock poisoned".to_string()))
    }

    /// Insert an edge, or merge it into the existing edge with the same key
    ///
    /// Re-inserting an existing key is never an error. The existing edge is
    /// only updated when the incoming confidence is strictly higher.
    ///
    /// # Errors
    /// `InvalidInput` for a self-loop or an empty endpoint id
    pub fn upsert(&self, relationship: Relationship) -> Result<UpsertOutcome> {
        relationship.validate()?;

        let key = relationship.key();
        let mut state = self.write()?;

        let outcome = match state.edges.get_mut(&key) {
            Some(existing) => existing.merge(relationship),
            None => {
                state.insert(relationship);
                UpsertOutcome::Inserted
            }
        };

        debug!(
            "Upsert {} -[{}]-> {}: {:?}",
            key.source, key.relationship_type, key.target, outcome
        );
        Ok(outcome)
    }

    /// Edges adjacent to `id`
    ///
    /// Outgoing neighbors come first for `Direction::Both`. An unknown id has
    /// no neighbors.
    pub fn neighbors(&self, id: &EntityId, direction: Direction) -> Result<Vec<Neighbor>> {
        let state = self.read()?;
        Ok(match direction {
            Direction::Both => {
                let mut all = state.adjacent(id, Direction::Outgoing);
                all.extend(state.adjacent(id, Direction::Incoming));
                all
            }
            single => state.adjacent(id, single),
        })
    }

    /// Whether an edge exists for the key
    pub fn has_edge(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<bool> {
        Ok(self.get(source, target, relationship_type)?.is_some())
    }

    /// The accepted edge for a key
    pub fn get(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<Option<Relationship>> {
        let key = EdgeKey {
            source: source.clone(),
            target: target.clone(),
            relationship_type,
        };
        Ok(self.read()?.edges.get(&key).cloned())
    }

    /// Every edge from `source` to `target`, one per type
    pub fn relationships_between(
        &self,
        source: &EntityId,
        target: &EntityId,
    ) -> Result<Vec<Relationship>> {
        let state = self.read()?;
        Ok(state
            .outgoing
            .get(source)
            .into_iter()
            .flatten()
            .filter(|key| &key.target == target)
            .filter_map(|key| state.edges.get(key).cloned())
            .collect())
    }

    /// Number of accepted edges
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.edges.len())
    }

    /// Whether the graph has no edges
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.edges.is_empty())
    }

    /// Every accepted edge, ordered by key
    pub fn relationships(&self) -> Result<Vec<Relationship>> {
        let state = self.read()?;
        let mut all: Vec<Relationship> = state.edges.values().cloned().collect();
        all.sort_by_key(|r| r.key());
        Ok(all)
    }

    /// Every entity that is an endpoint of some edge, sorted
    pub fn entity_ids(&self) -> Result<Vec<EntityId>> {
        let state = self.read()?;
        let ids: BTreeSet<&EntityId> = state
            .outgoing
            .keys()
            .chain(state.incoming.keys())
            .collect();
        Ok(ids.into_iter().cloned().collect())
    }

    /// Load every edge of a persistent store into the graph
    ///
    /// Edges go through the normal upsert path, so loading into a non-empty
    /// graph merges rather than overwrites. Returns the number of edges
    /// inserted or merged.
    pub fn hydrate<S>(&self, store: &S) -> Result<usize>
    where
        S: RelationshipStore,
        S::Error: Display,
    {
        let stored = store
            .relationships()
            .map_err(|e| TrellisError::Store(e.to_string()))?;

        let mut changed = 0;
        for relationship in stored {
            if self.upsert(relationship)? != UpsertOutcome::Unchanged {
                changed += 1;
            }
        }

        info!("Hydrated graph with {} relationships", changed);
        Ok(changed)
    }
}

impl RelationshipStore for RelationshipGraph {
    type Error = TrellisError;

    fn upsert(&self, relationship: Relationship) -> Result<UpsertOutcome> {
        RelationshipGraph::upsert(self, relationship)
    }

    fn neighbors(&self, id: &EntityId, direction: Direction) -> Result<Vec<Neighbor>> {
        RelationshipGraph::neighbors(self, id, direction)
    }

    fn has_edge(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<bool> {
        RelationshipGraph::has_edge(self, source, target, relationship_type)
    }

    fn get(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<Option<Relationship>> {
        RelationshipGraph::get(self, source, target, relationship_type)
    }

    fn relationships(&self) -> Result<Vec<Relationship>> {
        RelationshipGraph::relationships(self)
    }
}
