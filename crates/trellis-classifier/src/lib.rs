//! Trellis Classifier
//!
//! Decides what kind of relationship connects a pair of entities, and how
//! confident that judgment is, from their similarity score and declared kinds.
//!
//! The classifier produces exactly one edge per call:
//! - A matching kind rule (library→project, service→project, test↔project,
//!   concept→project) yields a kind-derived type with confidence at least the
//!   configured floor
//! - Otherwise the similarity tier yields `very_similar_to`, `similar_to`, or
//!   the `related_to` fallback, with confidence equal to the similarity
//!
//! Pattern-derived edges come from `trellis-extractor` and are merged into the
//! graph alongside, not chosen between.
//!
//! # Examples
//!
//! ```
//! use trellis_classifier::{Classifier, ClassifierConfig};
//! use trellis_domain::{Entity, EntityKind, RelationshipType};
//!
//! let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
//!
//! let lib = Entity::new("serde", "serde", EntityKind::Library);
//! let app = Entity::new("trellis", "trellis", EntityKind::Project);
//!
//! let rel = classifier.classify(&lib, &app, 0.4).unwrap();
//! assert_eq!(rel.relationship_type, RelationshipType::UsedBy);
//! assert_eq!(rel.confidence.score(), 0.6);
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;

pub use classifier::Classifier;
pub use config::{
    default_kind_rules, ClassifierConfig, KindRule, KIND_CONFIDENCE_FLOOR, SIMILAR_THRESHOLD,
    VERY_SIMILAR_THRESHOLD,
};
