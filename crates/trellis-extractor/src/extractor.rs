//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::patterns::PatternLibrary;
use crate::resolver::NameIndex;
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use trellis_domain::{
    Confidence, DiscoveryMethod, Entity, EntityId, Evidence, Relationship, RelationshipType,
    Result,
};

/// Scans observations for relationship-indicating language
///
/// Extraction is a pure function of its inputs. Every call to
/// [`extract`](Self::extract) builds fresh state.
#[derive(Debug, Clone)]
pub struct Extractor {
    library: PatternLibrary,
    confidence: Confidence,
}

impl Extractor {
    /// Create a new Extractor, compiling the pattern library
    ///
    /// # Errors
    /// `InvalidInput` if the configuration does not validate or a phrase
    /// cannot be compiled
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            library: PatternLibrary::compile(&config.rules)?,
            confidence: Confidence::new(config.pattern_confidence),
        })
    }

    /// The compiled pattern library
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Candidate relationships found in `entity`'s observations
    ///
    /// The returned sequence is lazy: observations are scanned one at a time
    /// as candidates are consumed. Each candidate has the scanned entity as
    /// source, the resolved entity as target, and the matched phrase as
    /// evidence. A (target, type) pair is yielded at most once per call.
    ///
    /// # Examples
    ///
    /// ```
    /// use trellis_extractor::{Extractor, ExtractorConfig};
    /// use trellis_domain::{Entity, EntityKind, RelationshipType};
    ///
    /// let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
    /// let pytest = Entity::new("pytest", "pytest", EntityKind::Library);
    /// let cov = Entity::new("pytest-cov", "pytest-cov", EntityKind::Library)
    ///     .with_observation("pytest-cov depends on pytest");
    ///
    /// let known = vec![pytest, cov.clone()];
    /// let found: Vec<_> = extractor.extract(&cov, &known).collect();
    ///
    /// assert_eq!(found.len(), 1);
    /// assert_eq!(found[0].relationship_type, RelationshipType::DependsOn);
    /// ```
    pub fn extract<'a>(
        &'a self,
        entity: &'a Entity,
        known_entities: &'a [Entity],
    ) -> Extraction<'a> {
        Extraction {
            extractor: self,
            entity,
            names: NameIndex::new(known_entities),
            next_observation: 0,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    fn scan_observation(
        &self,
        entity: &Entity,
        observation: &str,
        names: &NameIndex<'_>,
    ) -> Vec<Relationship> {
        let mut candidates = Vec::new();

        for (relationship_type, hit) in self.library.scan(observation) {
            let Some(target) = names.resolve(hit.object_text) else {
                debug!(
                    "Unresolved {} object after '{}' in observation of {}",
                    relationship_type, hit.phrase, entity.id
                );
                continue;
            };

            if *target == entity.id {
                debug!("Skipping self-reference of {} via '{}'", entity.id, hit.phrase);
                continue;
            }

            candidates.push(
                Relationship::new(
                    entity.id.clone(),
                    target.clone(),
                    relationship_type,
                    self.confidence,
                    DiscoveryMethod::Pattern,
                )
                .with_evidence(Evidence::text(hit.phrase)),
            );
        }

        candidates
    }
}

/// Lazy sequence of pattern-derived candidates for one entity
///
/// Created by [`Extractor::extract`]. Calling `extract` again restarts the
/// scan from the first observation.
pub struct Extraction<'a> {
    extractor: &'a Extractor,
    entity: &'a Entity,
    names: NameIndex<'a>,
    next_observation: usize,
    pending: VecDeque<Relationship>,
    seen: HashSet<(EntityId, RelationshipType)>,
}

impl Iterator for Extraction<'_> {
    type Item = Relationship;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(candidate) = self.pending.pop_front() {
                let key = (candidate.target.clone(), candidate.relationship_type);
                if self.seen.insert(key) {
                    return Some(candidate);
                }
            }

            let observation = self.entity.observations.get(self.next_observation)?;
            self.next_observation += 1;

            self.pending = self
                .extractor
                .scan_observation(self.entity, observation, &self.names)
                .into();
        }
    }
}
