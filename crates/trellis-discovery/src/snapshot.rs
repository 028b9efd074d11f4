//! Point-in-time copy of the relationship graph

use std::collections::{BTreeMap, HashMap};
use trellis_domain::traits::RelationshipStore;
use trellis_domain::{Confidence, EdgeKey, EntityId, Relationship, RelationshipType};

/// An outgoing edge that may be part of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Entity the edge points to
    pub target: EntityId,
    /// Type of the edge
    pub relationship_type: RelationshipType,
    /// Confidence of the edge
    pub confidence: Confidence,
}

/// Immutable copy of the edges discovery reads
///
/// Every accepted edge is kept for the no-regression check. Only directly
/// derived edges become chain links, so chains are always built from direct
/// relationships. Links are held per source in (confidence desc, target,
/// type) order.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    confidences: HashMap<EdgeKey, Confidence>,
    links: BTreeMap<EntityId, Vec<Link>>,
}

impl GraphSnapshot {
    /// Build a snapshot from a list of edges
    pub fn from_relationships(relationships: impl IntoIterator<Item = Relationship>) -> Self {
        let mut confidences: HashMap<EdgeKey, Confidence> = HashMap::new();
        let mut links: BTreeMap<EntityId, Vec<Link>> = BTreeMap::new();

        for rel in relationships {
            let key = rel.key();
            let stronger = confidences
                .get(&key)
                .is_none_or(|c| rel.confidence.score() > c.score());
            if !stronger {
                continue;
            }
            confidences.insert(key, rel.confidence);

            if rel.discovery_method.is_direct() {
                let out = links.entry(rel.source).or_default();
                out.retain(|l| {
                    !(l.target == rel.target && l.relationship_type == rel.relationship_type)
                });
                out.push(Link {
                    target: rel.target,
                    relationship_type: rel.relationship_type,
                    confidence: rel.confidence,
                });
            }
        }

        for out in links.values_mut() {
            sort_links(out);
        }

        Self { confidences, links }
    }

    /// Apply an upsert of `relationship` the way a store merges it
    ///
    /// Only a strictly higher confidence changes anything. A direct link with
    /// the same key stays a link and takes the new confidence. Returns whether
    /// the snapshot changed.
    pub fn raise(&mut self, relationship: &Relationship) -> bool {
        let key = relationship.key();
        let stronger = self
            .confidences
            .get(&key)
            .is_none_or(|c| relationship.confidence.score() > c.score());
        if !stronger {
            return false;
        }
        self.confidences.insert(key, relationship.confidence);

        if let Some(out) = self.links.get_mut(&relationship.source) {
            let link = out.iter_mut().find(|l| {
                l.target == relationship.target
                    && l.relationship_type == relationship.relationship_type
            });
            if let Some(link) = link {
                link.confidence = relationship.confidence;
                sort_links(out);
            }
        }
        true
    }

    /// Copy every edge of a store in one read
    pub fn capture<S: RelationshipStore>(store: &S) -> Result<Self, S::Error> {
        Ok(Self::from_relationships(store.relationships()?))
    }

    /// Confidence of the accepted edge for a key, if any
    pub fn confidence(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Option<Confidence> {
        let key = EdgeKey {
            source: source.clone(),
            target: target.clone(),
            relationship_type,
        };
        self.confidences.get(&key).copied()
    }

    /// Outgoing links of `id`, strongest first
    pub fn links(&self, id: &EntityId) -> &[Link] {
        self.links.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entities with at least one outgoing link, sorted
    pub fn sources(&self) -> impl Iterator<Item = &EntityId> {
        self.links.keys()
    }

    /// Number of edges in the snapshot
    pub fn len(&self) -> usize {
        self.confidences.len()
    }

    /// Whether the snapshot has no edges
    pub fn is_empty(&self) -> bool {
        self.confidences.is_empty()
    }
}

/// Strongest first, then by target and type
fn sort_links(links: &mut [Link]) {
    links.sort_by(|a, b| {
        b.confidence
            .score()
            .total_cmp(&a.confidence.score())
            .then_with(|| a.target.cmp(&b.target))
            .then_with(|| a.relationship_type.cmp(&b.relationship_type))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_domain::DiscoveryMethod;

    fn edge(s: &str, t: &str, rt: RelationshipType, c: f64, m: DiscoveryMethod) -> Relationship {
        Relationship::new(s, t, rt, c, m)
    }

    #[test]
    fn test_links_ordered_strongest_first() {
        let snapshot = GraphSnapshot::from_relationships(vec![
            edge("a", "c", RelationshipType::Uses, 0.6, DiscoveryMethod::Pattern),
            edge("a", "b", RelationshipType::Uses, 0.9, DiscoveryMethod::Pattern),
            edge("a", "d", RelationshipType::Uses, 0.6, DiscoveryMethod::Pattern),
        ]);

        let targets: Vec<_> = snapshot
            .links(&EntityId::new("a"))
            .iter()
            .map(|l| l.target.as_str())
            .collect();
        assert_eq!(targets, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_transitive_edges_are_not_links() {
        let snapshot = GraphSnapshot::from_relationships(vec![edge(
            "a",
            "c",
            RelationshipType::DependsOn,
            0.7,
            DiscoveryMethod::Transitive,
        )]);

        assert!(snapshot.links(&EntityId::new("a")).is_empty());
        assert_eq!(
            snapshot.confidence(
                &EntityId::new("a"),
                &EntityId::new("c"),
                RelationshipType::DependsOn
            ),
            Some(Confidence::new(0.7))
        );
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_keep_strongest() {
        let snapshot = GraphSnapshot::from_relationships(vec![
            edge("a", "b", RelationshipType::Uses, 0.5, DiscoveryMethod::Pattern),
            edge("a", "b", RelationshipType::Uses, 0.8, DiscoveryMethod::Pattern),
            edge("a", "b", RelationshipType::Uses, 0.6, DiscoveryMethod::Pattern),
        ]);

        let links = snapshot.links(&EntityId::new("a"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].confidence.score(), 0.8);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_raise_strengthens_direct_link() {
        let mut snapshot = GraphSnapshot::from_relationships(vec![
            edge("a", "b", RelationshipType::Uses, 0.8, DiscoveryMethod::Pattern),
            edge("a", "c", RelationshipType::Uses, 0.4, DiscoveryMethod::Pattern),
        ]);

        let raised = edge("a", "c", RelationshipType::Uses, 0.9, DiscoveryMethod::Transitive);
        assert!(snapshot.raise(&raised));
        assert!(!snapshot.raise(&raised));

        let links = snapshot.links(&EntityId::new("a"));
        assert_eq!(links[0].target.as_str(), "c");
        assert_eq!(links[0].confidence.score(), 0.9);
    }

    #[test]
    fn test_raise_new_key_is_not_a_link() {
        let mut snapshot = GraphSnapshot::default();
        let proposal = edge("a", "c", RelationshipType::Uses, 0.7, DiscoveryMethod::Transitive);

        assert!(snapshot.raise(&proposal));
        assert!(snapshot.links(&EntityId::new("a")).is_empty());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_unknown_entity_has_no_links() {
        let snapshot = GraphSnapshot::default();
        assert!(snapshot.links(&EntityId::new("x")).is_empty());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.sources().count(), 0);
    }
}
