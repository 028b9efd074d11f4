//! Provenance tracking: how an edge was derived and what supports it

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a relationship was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Similarity tier of the classifier
    Similarity,

    /// Keyword pattern found in an observation
    Pattern,

    /// Declared-kind heuristic of the classifier
    TypeHeuristic,

    /// Composition of a chain of direct edges
    Transitive,
}

impl DiscoveryMethod {
    /// Get the method name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMethod::Similarity => "similarity",
            DiscoveryMethod::Pattern => "pattern",
            DiscoveryMethod::TypeHeuristic => "type_heuristic",
            DiscoveryMethod::Transitive => "transitive",
        }
    }

    /// Parse a method from its string name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "similarity" => Some(DiscoveryMethod::Similarity),
            "pattern" => Some(DiscoveryMethod::Pattern),
            "type_heuristic" => Some(DiscoveryMethod::TypeHeuristic),
            "transitive" => Some(DiscoveryMethod::Transitive),
            _ => None,
        }
    }

    /// Whether the edge was derived directly from the entities themselves
    pub fn is_direct(&self) -> bool {
        !matches!(self, DiscoveryMethod::Transitive)
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence attached to a relationship for auditability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Evidence {
    /// Verbatim text snippet, e.g. the matched phrase of a pattern
    Text(String),

    /// Ordered intermediate entity ids of a transitive chain
    Chain(Vec<EntityId>),
}

impl Evidence {
    /// Text evidence
    pub fn text(snippet: impl Into<String>) -> Self {
        Evidence::Text(snippet.into())
    }

    /// The intermediate ids if this is chain evidence
    pub fn chain(&self) -> Option<&[EntityId]> {
        match self {
            Evidence::Chain(ids) => Some(ids),
            Evidence::Text(_) => None,
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::Text(snippet) => f.write_str(snippet),
            Evidence::Chain(ids) => {
                let parts: Vec<&str> = ids.iter().map(EntityId::as_str).collect();
                f.write_str(&parts.join(" -> "))
            }
        }
    }
}
