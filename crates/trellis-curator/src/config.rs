//! Configuration for Curator operations
//!
//! Bundles the similarity gate, the discovery schedule, and the policy of each
//! engine component.

use crate::CuratorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trellis_classifier::ClassifierConfig;
use trellis_discovery::DiscoveryConfig;
use trellis_extractor::ExtractorConfig;

/// Configuration for the Curator service
///
/// # Examples
///
/// ```
/// use trellis_curator::CuratorConfig;
///
/// let config = CuratorConfig::default();
/// assert_eq!(config.min_similarity, 0.5);
/// assert_eq!(config.discovery_interval_minutes, 60);
///
/// let config = CuratorConfig::strict();
/// assert_eq!(config.discovery.max_chain_length, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Pairs below this similarity are not classified, unless their kinds
    /// match a kind rule
    pub min_similarity: f64,

    /// How often the worker runs discovery (in minutes)
    pub discovery_interval_minutes: u64,

    /// Dry-run mode: compute candidates and log them without upserting
    #[serde(default)]
    pub dry_run: bool,

    /// Classifier policy
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Pattern library
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Discovery bounds
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            discovery_interval_minutes: 60,
            dry_run: false,
            classifier: ClassifierConfig::default(),
            extractor: ExtractorConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl CuratorConfig {
    /// Fewer, stronger links: only similar pairs, short chains
    pub fn strict() -> Self {
        Self {
            min_similarity: 0.75,
            discovery_interval_minutes: 30,
            dry_run: false,
            classifier: ClassifierConfig::strict(),
            extractor: ExtractorConfig::default(),
            discovery: DiscoveryConfig::strict(),
        }
    }

    /// More links: weakly similar pairs, longer chains, infrequent discovery
    pub fn lenient() -> Self {
        Self {
            min_similarity: 0.3,
            discovery_interval_minutes: 120,
            dry_run: false,
            classifier: ClassifierConfig::lenient(),
            extractor: ExtractorConfig::default(),
            discovery: DiscoveryConfig::lenient(),
        }
    }

    /// Get discovery interval as Duration
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_minutes * 60)
    }

    /// Validate this configuration and every component configuration
    pub fn validate(&self) -> Result<(), CuratorError> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(CuratorError::Config(format!(
                "min_similarity must be in [0, 1], got {}",
                self.min_similarity
            )));
        }
        if self.discovery_interval_minutes == 0 {
            return Err(CuratorError::Config(
                "discovery_interval_minutes must be positive".to_string(),
            ));
        }

        self.classifier
            .validate()
            .and_then(|_| self.extractor.validate())
            .and_then(|_| self.discovery.validate())
            .map_err(|e| CuratorError::Config(e.to_string()))
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, CuratorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| CuratorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, CuratorError> {
        toml::to_string_pretty(self)
            .map_err(|e| CuratorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
