//! Relationship module - typed, confidence-scored directed edges

use crate::{Confidence, DiscoveryMethod, EntityId, Evidence, Result, TrellisError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the engine a relationship type comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// Derived from a similarity tier
    Similarity,
    /// Derived from a keyword pattern in an observation
    Pattern,
    /// Derived from the declared kinds of the pair
    Kind,
}

/// Type of relationship between two entities (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Similarity at or above the high tier
    VerySimilarTo,
    /// Similarity in the middle tier
    SimilarTo,
    /// Default fallback, also the composed type of mixed chains
    RelatedTo,

    /// Source uses target (pattern or kind derived)
    Uses,
    /// Source extends target
    Extends,
    /// Source depends on target
    DependsOn,
    /// Source is part of target
    PartOf,
    /// Source implements target
    Implements,
    /// Source requires target
    Requires,
    /// Source connects to target
    ConnectsTo,

    /// Source (a library) is used by target (a project)
    UsedBy,
    /// Source (a service) serves target (a project)
    Serves,
    /// Source (a test) tests target (a project)
    Tests,
    /// Source (a project) is tested by target (a test)
    TestedBy,
    /// Source (a concept) applies to target (a project)
    AppliesTo,
}

impl RelationshipType {
    /// Every relationship type, in declaration order
    pub const ALL: [RelationshipType; 15] = [
        RelationshipType::VerySimilarTo,
        RelationshipType::SimilarTo,
        RelationshipType::RelatedTo,
        RelationshipType::Uses,
        RelationshipType::Extends,
        RelationshipType::DependsOn,
        RelationshipType::PartOf,
        RelationshipType::Implements,
        RelationshipType::Requires,
        RelationshipType::ConnectsTo,
        RelationshipType::UsedBy,
        RelationshipType::Serves,
        RelationshipType::Tests,
        RelationshipType::TestedBy,
        RelationshipType::AppliesTo,
    ];

    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::VerySimilarTo => "very_similar_to",
            RelationshipType::SimilarTo => "similar_to",
            RelationshipType::RelatedTo => "related_to",
            RelationshipType::Uses => "uses",
            RelationshipType::Extends => "extends",
            RelationshipType::DependsOn => "depends_on",
            RelationshipType::PartOf => "part_of",
            RelationshipType::Implements => "implements",
            RelationshipType::Requires => "requires",
            RelationshipType::ConnectsTo => "connects_to",
            RelationshipType::UsedBy => "used_by",
            RelationshipType::Serves => "serves",
            RelationshipType::Tests => "tests",
            RelationshipType::TestedBy => "tested_by",
            RelationshipType::AppliesTo => "applies_to",
        }
    }

    /// Parse a type from its string name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Where this type is produced
    ///
    /// `uses` is both pattern- and kind-derived; it reports `Pattern`.
    pub fn origin(&self) -> TypeOrigin {
        match self {
            RelationshipType::VerySimilarTo
            | RelationshipType::SimilarTo
            | RelationshipType::RelatedTo => TypeOrigin::Similarity,
            RelationshipType::Uses
            | RelationshipType::Extends
            | RelationshipType::DependsOn
            | RelationshipType::PartOf
            | RelationshipType::Implements
            | RelationshipType::Requires
            | RelationshipType::ConnectsTo => TypeOrigin::Pattern,
            RelationshipType::UsedBy
            | RelationshipType::Serves
            | RelationshipType::Tests
            | RelationshipType::TestedBy
            | RelationshipType::AppliesTo => TypeOrigin::Kind,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = TrellisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| TrellisError::InvalidInput(format!("Unknown relationship type: {}", s)))
    }
}

/// Identity of an edge: at most one accepted edge exists per key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    /// Source entity
    pub source: EntityId,
    /// Target entity
    pub target: EntityId,
    /// Relationship type
    pub relationship_type: RelationshipType,
}

/// A directed, typed, confidence-scored edge between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Source entity
    pub source: EntityId,

    /// Target entity
    pub target: EntityId,

    /// Type of relationship
    pub relationship_type: RelationshipType,

    /// Confidence of the judgment
    pub confidence: Confidence,

    /// How the edge was derived
    pub discovery_method: DiscoveryMethod,

    /// Supporting snippet or chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,

    /// Raw similarity score used in the derivation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl Relationship {
    /// Create a new relationship without evidence or similarity
    pub fn new(
        source: impl Into<EntityId>,
        target: impl Into<EntityId>,
        relationship_type: RelationshipType,
        confidence: impl Into<Confidence>,
        discovery_method: DiscoveryMethod,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type,
            confidence: confidence.into(),
            discovery_method,
            evidence: None,
            similarity: None,
        }
    }

    /// Attach evidence
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Attach the raw similarity score
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// The (source, target, type) identity of this edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            relationship_type: self.relationship_type,
        }
    }

    /// Whether source and target are the same entity
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Check the structural invariants an accepted edge must hold
    ///
    /// # Errors
    /// `InvalidInput` for an empty endpoint id or a self-loop
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() || self.target.is_empty() {
            return Err(TrellisError::InvalidInput(
                "Relationship endpoints must have non-empty ids".to_string(),
            ));
        }
        if self.is_self_loop() {
            return Err(TrellisError::InvalidInput(format!(
                "Self-loop on entity {} is not allowed",
                self.source
            )));
        }
        Ok(())
    }

    /// Apply the dedup/priority rule for an incoming edge with the same key
    ///
    /// The existing edge wins unless the incoming confidence is strictly
    /// higher. On a win the confidence and evidence are taken from the
    /// incoming edge. Its discovery method and raw similarity are taken too,
    /// except that a directly derived edge is never turned `transitive`; such
    /// an edge keeps its own method and similarity.
    pub fn merge(&mut self, incoming: Relationship) -> UpsertOutcome {
        debug_assert_eq!(self.key(), incoming.key());

        if incoming.confidence.score() <= self.confidence.score() {
            return UpsertOutcome::Unchanged;
        }

        self.confidence = incoming.confidence;
        self.evidence = incoming.evidence;
        // A direct edge stays direct
        if incoming.discovery_method.is_direct() || !self.discovery_method.is_direct() {
            self.discovery_method = incoming.discovery_method;
            self.similarity = incoming.similarity;
        }

        UpsertOutcome::Merged
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {} {} via {}",
            self.source, self.relationship_type, self.target, self.confidence, self.discovery_method
        )
    }
}

/// Result of inserting an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertOutcome {
    /// No edge existed for the key; the edge was added
    Inserted,
    /// An edge existed and was updated with a strictly higher confidence
    Merged,
    /// An edge existed with equal or higher confidence; nothing changed
    Unchanged,
}

/// Direction of edges to follow from an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Edges where the entity is the source
    Outgoing,
    /// Edges where the entity is the target
    Incoming,
    /// Both of the above
    Both,
}

/// One edge seen from an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The entity on the other end of the edge
    pub entity: EntityId,
    /// Relationship type of the edge
    pub relationship_type: RelationshipType,
    /// Confidence of the edge
    pub confidence: Confidence,
    /// Direction of the edge relative to the queried entity
    pub direction: Direction,
}
