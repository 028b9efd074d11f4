//! Trellis Extractor
//!
//! Finds relationships stated in an entity's free-text observations.
//!
//! # Overview
//!
//! Each rule in the pattern library pairs a relationship type with phrases
//! such as "depends on" or "is part of". An observation of entity `X`
//! containing `<phrase> Y`, where `Y` names a known entity, yields a
//! candidate `X -[type]-> Y` with the phrase as evidence.
//!
//! ```text
//! observations → PatternLibrary → NameIndex → candidates (lazy)
//! ```
//!
//! Candidates carry a fixed confidence (0.7 by default) and the `pattern`
//! discovery method. Phrases whose object does not name a known entity are
//! skipped silently.
//!
//! # Example Usage
//!
//! ```
//! use trellis_extractor::{Extractor, ExtractorConfig};
//! use trellis_domain::{Entity, EntityKind, RelationshipType};
//!
//! let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
//!
//! let api = Entity::new("api", "api-gateway", EntityKind::Service)
//!     .with_observation("The gateway connects to Redis for rate limiting");
//! let redis = Entity::new("redis", "Redis", EntityKind::Service);
//!
//! let known = vec![api.clone(), redis];
//! let candidates: Vec<_> = extractor.extract(&api, &known).collect();
//!
//! assert_eq!(candidates.len(), 1);
//! assert_eq!(candidates[0].relationship_type, RelationshipType::ConnectsTo);
//! assert_eq!(candidates[0].target.as_str(), "redis");
//! ```

#![warn(missing_docs)]

mod config;
mod extractor;
mod patterns;
mod resolver;


pub use config::{default_rules, ExtractorConfig, PatternRule, PATTERN_CONFIDENCE};
pub use extractor::{Extraction, Extractor};
pub use patterns::{PatternLibrary, PhraseMatch, PhraseMatcher};
pub use resolver::NameIndex;
