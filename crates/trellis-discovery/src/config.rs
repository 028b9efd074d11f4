//! Configuration for transitive discovery

use serde::{Deserialize, Serialize};
use trellis_domain::{Result, TrellisError};

/// Bounds on the chains the discoverer explores
///
/// # Examples
///
/// ```
/// use trellis_discovery::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default();
/// assert_eq!(config.max_chain_length, 3);
/// assert_eq!(config.max_fanout_per_node, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Longest chain followed, in hops (at least 2)
    pub max_chain_length: usize,

    /// Highest-confidence outgoing edges followed per node (at least 1)
    pub max_fanout_per_node: usize,

    /// Edges below this confidence are never part of a chain
    pub min_edge_confidence: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_chain_length: 3,
            max_fanout_per_node: 10,
            min_edge_confidence: 0.0,
        }
    }
}

impl DiscoveryConfig {
    /// Short chains over strong edges only
    pub fn strict() -> Self {
        Self {
            max_chain_length: 2,
            max_fanout_per_node: 5,
            min_edge_confidence: 0.5,
        }
    }

    /// Longer chains over every edge
    pub fn lenient() -> Self {
        Self {
            max_chain_length: 4,
            max_fanout_per_node: 20,
            min_edge_confidence: 0.0,
        }
    }

    /// Validate the bounds
    ///
    /// # Errors
    /// `InvalidInput` for a chain length below 2, a zero fanout, or an edge
    /// confidence outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if self.max_chain_length < 2 {
            return Err(TrellisError::InvalidInput(format!(
                "max_chain_length must be at least 2, got {}",
                self.max_chain_length
            )));
        }

        if self.max_fanout_per_node == 0 {
            return Err(TrellisError::InvalidInput(
                "max_fanout_per_node must be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_edge_confidence) {
            return Err(TrellisError::InvalidInput(format!(
                "min_edge_confidence must be in [0, 1], got {}",
                self.min_edge_confidence
            )));
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
