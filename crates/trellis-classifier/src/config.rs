//! Classifier policy constants
//!
//! Tier boundaries, the kind-evidence floor, and the kind rule table live here
//! so they can be tuned without touching the classification algorithm.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use trellis_domain::{EntityKind, RelationshipType, Result, TrellisError, TypeOrigin};

/// Lower bound (inclusive) of the `very_similar_to` tier
pub const VERY_SIMILAR_THRESHOLD: f64 = 0.85;

/// Lower bound (inclusive) of the `similar_to` tier
pub const SIMILAR_THRESHOLD: f64 = 0.75;

/// Minimum confidence of a kind-derived judgment
pub const KIND_CONFIDENCE_FLOOR: f64 = 0.6;

/// An asymmetric kind pattern: an ordered pair of kinds and the type it implies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRule {
    /// Declared kind of the source entity
    pub source_kind: EntityKind,

    /// Declared kind of the target entity
    pub target_kind: EntityKind,

    /// Type emitted for the ordered pair
    pub relationship_type: RelationshipType,
}

impl KindRule {
    /// Create a new rule
    pub fn new(
        source_kind: EntityKind,
        target_kind: EntityKind,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source_kind,
            target_kind,
            relationship_type,
        }
    }
}

/// The built-in kind rules
///
/// library→project, service→project, test↔project, and concept→project.
pub fn default_kind_rules() -> Vec<KindRule> {
    use EntityKind::*;
    use RelationshipType as R;

    vec![
        KindRule::new(Library, Project, R::UsedBy),
        KindRule::new(Project, Library, R::Uses),
        KindRule::new(Service, Project, R::Serves),
        KindRule::new(Test, Project, R::Tests),
        KindRule::new(Project, Test, R::TestedBy),
        KindRule::new(Concept, Project, R::AppliesTo),
    ]
}

/// Configuration for the relationship type classifier
///
/// # Examples
///
/// ```
/// use trellis_classifier::ClassifierConfig;
///
/// let config = ClassifierConfig::default();
/// assert_eq!(config.very_similar_threshold, 0.85);
/// assert_eq!(config.similar_threshold, 0.75);
/// assert_eq!(config.kind_confidence_floor, 0.6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Similarity at or above this yields `very_similar_to`
    pub very_similar_threshold: f64,

    /// Similarity at or above this (and below the high tier) yields `similar_to`
    pub similar_threshold: f64,

    /// Kind-derived judgments are at least this confident
    pub kind_confidence_floor: f64,

    /// Ordered kind pairs that override the similarity tier
    #[serde(default = "default_kind_rules")]
    pub kind_rules: Vec<KindRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            very_similar_threshold: VERY_SIMILAR_THRESHOLD,
            similar_threshold: SIMILAR_THRESHOLD,
            kind_confidence_floor: KIND_CONFIDENCE_FLOOR,
            kind_rules: default_kind_rules(),
        }
    }
}

impl ClassifierConfig {
    /// Strict preset: higher tier boundaries, weaker kind evidence
    pub fn strict() -> Self {
        Self {
            very_similar_threshold: 0.9,
            similar_threshold: 0.8,
            kind_confidence_floor: 0.5,
            kind_rules: default_kind_rules(),
        }
    }

    /// Lenient preset: lower tier boundaries, stronger kind evidence
    pub fn lenient() -> Self {
        Self {
            very_similar_threshold: 0.8,
            similar_threshold: 0.65,
            kind_confidence_floor: 0.65,
            kind_rules: default_kind_rules(),
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// `InvalidInput` if a threshold lies outside [0, 1], the tiers are out of
    /// order, a kind pair appears twice, or a rule emits a similarity type
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("very_similar_threshold", self.very_similar_threshold),
            ("similar_threshold", self.similar_threshold),
            ("kind_confidence_floor", self.kind_confidence_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrellisError::InvalidInput(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.similar_threshold > self.very_similar_threshold {
            return Err(TrellisError::InvalidInput(format!(
                "similar_threshold {} cannot exceed very_similar_threshold {}",
                self.similar_threshold, self.very_similar_threshold
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.kind_rules {
            if !seen.insert((&rule.source_kind, &rule.target_kind)) {
                return Err(TrellisError::InvalidInput(format!(
                    "Duplicate kind rule for {} -> {}",
                    rule.source_kind, rule.target_kind
                )));
            }
            if rule.relationship_type.origin() == TypeOrigin::Similarity {
                return Err(TrellisError::InvalidInput(format!(
                    "Kind rule {} -> {} cannot emit similarity type {}",
                    rule.source_kind, rule.target_kind, rule.relationship_type
                )));
            }
        }

        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| TrellisError::InvalidInput(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TrellisError::InvalidInput(format!("Failed to serialize to TOML: {}", e)))
    }
}
