//! Relationship type classification

use crate::ClassifierConfig;
use tracing::debug;
use trellis_domain::{
    Confidence, DiscoveryMethod, Entity, EntityKind, Evidence, Relationship, RelationshipType,
    Result, TrellisError,
};

/// Maps a pair of entities and their similarity to one typed, scored edge
///
/// The classifier is stateless apart from its policy, so a single instance
/// can be shared across threads and pairs classified fully in parallel.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a new Classifier with the given configuration
    ///
    /// # Errors
    /// `InvalidInput` if the configuration does not validate
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a Classifier with default configuration
    pub fn default_config() -> Self {
        Self {
            config: ClassifierConfig::default(),
        }
    }

    /// The active policy
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the directed pair `a → b`
    ///
    /// A matching kind rule decides the type, with confidence raised to at
    /// least the kind floor. Otherwise the similarity tier decides and the
    /// confidence is the similarity itself.
    ///
    /// # Errors
    /// `InvalidInput` if both entities share an id, or if `similarity` is
    /// outside [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use trellis_classifier::Classifier;
    /// use trellis_domain::{Entity, EntityKind, RelationshipType};
    ///
    /// let a = Entity::new("pytest", "pytest", EntityKind::Library);
    /// let b = Entity::new("pytest-cov", "pytest-cov", EntityKind::Library);
    ///
    /// let rel = Classifier::default_config().classify(&a, &b, 0.88).unwrap();
    /// assert_eq!(rel.relationship_type, RelationshipType::VerySimilarTo);
    /// assert_eq!(rel.confidence.score(), 0.88);
    /// ```
    pub fn classify(&self, a: &Entity, b: &Entity, similarity: f64) -> Result<Relationship> {
        if a.id == b.id {
            return Err(TrellisError::InvalidInput(format!(
                "Cannot classify entity {} against itself",
                a.id
            )));
        }
        if !(0.0..=1.0).contains(&similarity) {
            return Err(TrellisError::InvalidInput(format!(
                "Similarity must be in [0, 1], got {}",
                similarity
            )));
        }

        let relationship = match self.kind_rule(&a.kind, &b.kind) {
            Some(relationship_type) => {
                let confidence = Confidence::new(similarity)
                    .max(Confidence::new(self.config.kind_confidence_floor));
                Relationship::new(
                    a.id.clone(),
                    b.id.clone(),
                    relationship_type,
                    confidence,
                    DiscoveryMethod::TypeHeuristic,
                )
                .with_evidence(Evidence::text(format!(
                    "{} {} {}",
                    a.kind, relationship_type, b.kind
                )))
            }
            None => Relationship::new(
                a.id.clone(),
                b.id.clone(),
                self.similarity_tier(similarity),
                similarity,
                DiscoveryMethod::Similarity,
            ),
        }
        .with_similarity(similarity);

        debug!(
            "Classified {} -> {} as {} ({}, similarity {:.3})",
            a.id, b.id, relationship.relationship_type, relationship.confidence, similarity
        );

        Ok(relationship)
    }

    /// The similarity tier for a score; lower bounds are inclusive
    pub fn similarity_tier(&self, similarity: f64) -> RelationshipType {
        if similarity >= self.config.very_similar_threshold {
            RelationshipType::VerySimilarTo
        } else if similarity >= self.config.similar_threshold {
            RelationshipType::SimilarTo
        } else {
            RelationshipType::RelatedTo
        }
    }

    /// The kind-derived type for an ordered pair of kinds, if any rule matches
    pub fn kind_rule(&self, source: &EntityKind, target: &EntityKind) -> Option<RelationshipType> {
        self.config
            .kind_rules
            .iter()
            .find(|rule| &rule.source_kind == source && &rule.target_kind == target)
            .map(|rule| rule.relationship_type)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::default_config()
    }
}
