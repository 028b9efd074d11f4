//! Transitive discovery over a graph snapshot

use crate::config::DiscoveryConfig;
use crate::snapshot::GraphSnapshot;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::{debug, info};
use trellis_domain::traits::RelationshipStore;
use trellis_domain::{
    Confidence, DiscoveryMethod, EdgeKey, EntityId, Evidence, Relationship, RelationshipType,
    Result, TrellisError,
};

/// Propose relationships implied by chains of direct relationships
///
/// Takes a snapshot of `store` and returns a lazy sequence of new edges, each
/// with discovery method `transitive` and the chain's intermediate entity ids
/// as evidence. The sequence never sees later writes to the store; call
/// `discover` again for a fresh view.
///
/// # Errors
/// `InvalidInput` if the bounds in `config` are invalid, `Store` if the
/// snapshot cannot be read
///
/// # Examples
///
/// ```
/// use trellis_discovery::{discover, DiscoveryConfig};
/// use trellis_graph::RelationshipGraph;
/// use trellis_domain::{DiscoveryMethod, Relationship, RelationshipType};
///
/// let graph = RelationshipGraph::new();
/// for (s, t, c) in [("a", "b", 0.9), ("b", "c", 0.7)] {
///     graph
///         .upsert(Relationship::new(s, t, RelationshipType::DependsOn, c, DiscoveryMethod::Pattern))
///         .unwrap();
/// }
///
/// let config = DiscoveryConfig { max_chain_length: 2, ..Default::default() };
/// let found: Vec<_> = discover(&graph, &config).unwrap().collect();
///
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].source.as_str(), "a");
/// assert_eq!(found[0].target.as_str(), "c");
/// assert_eq!(found[0].confidence.score(), 0.7);
/// ```
pub fn discover<S>(store: &S, config: &DiscoveryConfig) -> Result<Discovery>
where
    S: RelationshipStore,
    S::Error: Display,
{
    config.validate()?;
    let snapshot =
        GraphSnapshot::capture(store).map_err(|e| TrellisError::Store(e.to_string()))?;
    Discovery::new(snapshot, config.clone())
}

/// Best chain found so far for a (target, composed type)
struct Candidate {
    confidence: Confidence,
    intermediates: Vec<EntityId>,
}

/// Sequence of transitive proposals for one snapshot
///
/// Upserting a proposal can raise the confidence of an existing direct edge,
/// and a stronger link can imply stronger chains. The proposals of one run
/// are therefore closed under their own upserts: passes over the snapshot
/// are repeated, each seeing the previous passes' proposals applied, until a
/// pass proposes nothing. Once every proposal is upserted, another run over
/// the result proposes nothing.
///
/// The closure is computed on the first call to `next`. Proposals are yielded
/// in (source, target, type) order, at most one per key, each with the
/// strongest chain found.
pub struct Discovery {
    snapshot: GraphSnapshot,
    config: DiscoveryConfig,
    proposals: Option<std::vec::IntoIter<Relationship>>,
    proposed: usize,
    finished: bool,
}

impl Discovery {
    /// Discover over an existing snapshot
    ///
    /// # Errors
    /// `InvalidInput` if the bounds in `config` are invalid
    pub fn new(snapshot: GraphSnapshot, config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;

        debug!(
            "Discovery over {} edges from {} sources (max chain {}, fanout {})",
            snapshot.len(),
            snapshot.sources().count(),
            config.max_chain_length,
            config.max_fanout_per_node
        );

        Ok(Self {
            snapshot,
            config,
            proposals: None,
            proposed: 0,
            finished: false,
        })
    }

    /// The snapshot being traversed
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    fn close(&self) -> Vec<Relationship> {
        let mut working = self.snapshot.clone();
        let mut closed: BTreeMap<EdgeKey, Relationship> = BTreeMap::new();

        for pass in 1.. {
            let sources: Vec<EntityId> = working.sources().cloned().collect();
            let found: Vec<Relationship> = sources
                .iter()
                .flat_map(|source| proposals_from(&working, &self.config, source))
                .collect();
            if found.is_empty() {
                break;
            }

            debug!("Discovery pass {} proposed {} relationships", pass, found.len());
            // each proposal beats the working snapshot, so it replaces any
            // weaker one from an earlier pass
            for proposal in found {
                working.raise(&proposal);
                closed.insert(proposal.key(), proposal);
            }
        }

        closed.into_values().collect()
    }
}

fn proposals_from(
    snapshot: &GraphSnapshot,
    config: &DiscoveryConfig,
    source: &EntityId,
) -> Vec<Relationship> {
    let mut best = BTreeMap::new();
    let mut path = vec![source.clone()];
    walk(snapshot, config, &mut path, None, Confidence::MAX, &mut best);

    best.into_iter()
        .filter_map(|((target, relationship_type), candidate)| {
            let existing = snapshot.confidence(source, &target, relationship_type);
            if existing.is_some_and(|c| c.score() >= candidate.confidence.score()) {
                return None;
            }
            Some(
                Relationship::new(
                    source.clone(),
                    target,
                    relationship_type,
                    candidate.confidence,
                    DiscoveryMethod::Transitive,
                )
                .with_evidence(Evidence::Chain(candidate.intermediates)),
            )
        })
        .collect()
}

/// Extend the chain in `path` by every followable link of its last node
fn walk(
    snapshot: &GraphSnapshot,
    config: &DiscoveryConfig,
    path: &mut Vec<EntityId>,
    composed: Option<RelationshipType>,
    confidence: Confidence,
    best: &mut BTreeMap<(EntityId, RelationshipType), Candidate>,
) {
    let Some(current) = path.last() else {
        return;
    };
    let links = snapshot.links(current);

    for link in links
        .iter()
        .filter(|l| l.confidence.score() >= config.min_edge_confidence)
        .take(config.max_fanout_per_node)
    {
        // a revisit, including a return to the source, ends the chain
        if path.contains(&link.target) {
            continue;
        }

        let chain_type = compose(composed, link.relationship_type);
        let chain_confidence = confidence.min(link.confidence);
        let hops = path.len();

        if hops >= 2 {
            let key = (link.target.clone(), chain_type);
            let stronger = best
                .get(&key)
                .is_none_or(|c| chain_confidence.score() > c.confidence.score());
            if stronger {
                best.insert(
                    key,
                    Candidate {
                        confidence: chain_confidence,
                        intermediates: path[1..].to_vec(),
                    },
                );
            }
        }

        if hops < config.max_chain_length {
            path.push(link.target.clone());
            walk(snapshot, config, path, Some(chain_type), chain_confidence, best);
            path.pop();
        }
    }
}

/// Type of a chain after appending an edge of type `next`
///
/// A chain whose edges all share one type keeps it; any mix is `related_to`.
pub fn compose(chain: Option<RelationshipType>, next: RelationshipType) -> RelationshipType {
    match chain {
        None => next,
        Some(t) if t == next => t,
        Some(_) => RelationshipType::RelatedTo,
    }
}

impl Iterator for Discovery {
    type Item = Relationship;

    fn next(&mut self) -> Option<Self::Item> {
        if self.proposals.is_none() {
            self.proposals = Some(self.close().into_iter());
        }

        if let Some(relationship) = self.proposals.as_mut().and_then(Iterator::next) {
            self.proposed += 1;
            return Some(relationship);
        }

        if !self.finished {
            self.finished = true;
            info!("Discovery complete: {} relationships proposed", self.proposed);
        }
        None
    }
}
