//! Configuration for the Extractor
//!
//! The keyword-pattern library is data: each [`PatternRule`] pairs a
//! relationship type with the phrases that indicate it. Adding a relationship
//! type means adding a rule, not a branch.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use trellis_domain::{RelationshipType, Result, TrellisError};

/// Fixed confidence of a pattern-derived candidate (medium-high textual evidence)
pub const PATTERN_CONFIDENCE: f64 = 0.7;

/// A phrase template `X <phrase> Y` for one relationship type
///
/// The subject slot `X` is the entity whose observations are scanned; the
/// object slot `Y` is the text following the phrase, resolved against known
/// entity names. Whitespace inside a phrase matches any run of whitespace and
/// matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Type emitted when one of the phrases matches
    pub relationship_type: RelationshipType,

    /// Phrases indicating the relationship
    pub phrases: Vec<String>,
}

impl PatternRule {
    /// Create a new rule
    pub fn new(relationship_type: RelationshipType, phrases: &[&str]) -> Self {
        Self {
            relationship_type,
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// The built-in pattern library, one rule per pattern-derived type
pub fn default_rules() -> Vec<PatternRule> {
    use RelationshipType as R;

    vec![
        PatternRule::new(R::Uses, &["uses", "utilizes", "leverages", "is built with"]),
        PatternRule::new(R::Extends, &["extends", "inherits from", "builds on"]),
        PatternRule::new(R::DependsOn, &["depends on", "relies on", "is dependent on"]),
        PatternRule::new(
            R::PartOf,
            &["is part of", "belongs to", "is a component of", "is a module of"],
        ),
        PatternRule::new(R::Implements, &["implements", "is an implementation of"]),
        PatternRule::new(R::Requires, &["requires", "needs"]),
        PatternRule::new(
            R::ConnectsTo,
            &["connects to", "integrates with", "communicates with", "talks to"],
        ),
    ]
}

/// Configuration for the Extractor
///
/// # Examples
///
/// ```
/// use trellis_extractor::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// assert_eq!(config.pattern_confidence, 0.7);
/// assert_eq!(config.rules.len(), 7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Confidence assigned to every pattern-derived candidate
    pub pattern_confidence: f64,

    /// The keyword-pattern library
    #[serde(default = "default_rules")]
    pub rules: Vec<PatternRule>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pattern_confidence: PATTERN_CONFIDENCE,
            rules: default_rules(),
        }
    }
}

impl ExtractorConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// `InvalidInput` for a confidence outside [0, 1], a rule without
    /// phrases, a blank phrase, or two rules for the same type
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pattern_confidence) {
            return Err(TrellisError::InvalidInput(format!(
                "pattern_confidence must be in [0, 1], got {}",
                self.pattern_confidence
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.relationship_type) {
                return Err(TrellisError::InvalidInput(format!(
                    "Duplicate pattern rule for {}",
                    rule.relationship_type
                )));
            }
            if rule.phrases.is_empty() {
                return Err(TrellisError::InvalidInput(format!(
                    "Pattern rule for {} has no phrases",
                    rule.relationship_type
                )));
            }
            if rule.phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(TrellisError::InvalidInput(format!(
                    "Pattern rule for {} has a blank phrase",
                    rule.relationship_type
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
