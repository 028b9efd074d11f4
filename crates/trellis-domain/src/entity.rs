//! Entity module - the nodes relationships are derived between
//!
//! Entities are owned by an external entity store. The engine only reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of an entity, as assigned by the entity store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an identifier from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is the empty string
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Declared kind of an entity
///
/// An open but small set: the named variants are the ones the classifier has
/// heuristics for, anything else is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A reusable code library or package
    Library,
    /// A project or application
    Project,
    /// A running service
    Service,
    /// A test suite or test module
    Test,
    /// An abstract concept, technique, or pattern
    Concept,
    /// Any other declared kind
    Other(String),
}

impl EntityKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Library => "library",
            EntityKind::Project => "project",
            EntityKind::Service => "service",
            EntityKind::Test => "test",
            EntityKind::Concept => "concept",
            EntityKind::Other(kind) => kind,
        }
    }

    /// Parse a kind from a string (case-insensitive, never fails)
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "library" => EntityKind::Library,
            "project" => EntityKind::Project,
            "service" => EntityKind::Service,
            "test" => EntityKind::Test,
            "concept" => EntityKind::Concept,
            _ => EntityKind::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed node in the knowledge graph
///
/// Observations are free-text notes in insertion order; they are the evidence
/// source for pattern extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: EntityId,

    /// Display name, used to resolve references in observations
    pub name: String,

    /// Declared kind
    pub kind: EntityKind,

    /// Ordered, append-only observation strings
    #[serde(default)]
    pub observations: Vec<String>,
}

impl Entity {
    /// Create an entity with no observations
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            observations: Vec::new(),
        }
    }

    /// Append an observation
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observations.push(observation.into());
        self
    }
}
