//! Linking and discovery workflows over the engine components

use crate::{CuratorConfig, CuratorError, CuratorMetrics};
use std::fmt::Display;
use std::time::Instant;
use tracing::{debug, info, warn};
use trellis_classifier::Classifier;
use trellis_discovery::discover;
use trellis_domain::traits::{EntityStore, RelationshipStore, SimilarityProvider};
use trellis_domain::{Entity, EntityId, Relationship, TrellisError, UpsertOutcome};
use trellis_extractor::Extractor;

/// An item that failed without aborting its batch
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFailure {
    /// Entity being linked when the failure happened
    pub entity: EntityId,
    /// Rendered error
    pub reason: String,
}

/// Outcome of a link run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkReport {
    /// Entities linked
    pub entities: usize,
    /// Candidates computed by the classifier and the extractor
    pub candidates: usize,
    /// New edges
    pub inserted: usize,
    /// Existing edges strengthened
    pub merged: usize,
    /// Candidates no stronger than the existing edge
    pub unchanged: usize,
    /// Candidates not written because of dry run
    pub skipped: usize,
    /// Per-item failures
    pub failures: Vec<LinkFailure>,
}

impl LinkReport {
    /// Edges inserted or merged
    pub fn written(&self) -> usize {
        self.inserted + self.merged
    }

    /// Whether every item succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, applied: Option<UpsertOutcome>) {
        match applied {
            Some(UpsertOutcome::Inserted) => self.inserted += 1,
            Some(UpsertOutcome::Merged) => self.merged += 1,
            Some(UpsertOutcome::Unchanged) => self.unchanged += 1,
            None => self.skipped += 1,
        }
    }
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Transitive edges proposed by the discoverer
    pub proposed: usize,
    /// New edges
    pub inserted: usize,
    /// Existing edges strengthened
    pub merged: usize,
    /// Proposals no stronger than the existing edge
    pub unchanged: usize,
    /// Proposals not written because of dry run
    pub skipped: usize,
    /// Proposals the store rejected
    pub failures: Vec<String>,
}

impl DiscoveryReport {
    fn record(&mut self, applied: Option<UpsertOutcome>) {
        match applied {
            Some(UpsertOutcome::Inserted) => self.inserted += 1,
            Some(UpsertOutcome::Merged) => self.merged += 1,
            Some(UpsertOutcome::Unchanged) => self.unchanged += 1,
            None => self.skipped += 1,
        }
    }
}

/// Caller-side orchestration of the inference engine
///
/// Links entities by classifying them against every other known entity and
/// extracting pattern relationships from their observations, then upserts
/// the candidates. Discovery runs derive transitive edges from the result.
///
/// # Examples
///
/// ```
/// use trellis_curator::{Curator, CuratorConfig};
/// use trellis_graph::RelationshipGraph;
///
/// let graph = RelationshipGraph::new();
/// let mut curator = Curator::new(CuratorConfig::default()).unwrap();
///
/// let report = curator.run_discovery(&graph).unwrap();
/// assert_eq!(report.proposed, 0);
/// assert_eq!(curator.metrics().discovery_runs, 1);
/// ```
#[derive(Debug)]
pub struct Curator {
    config: CuratorConfig,
    classifier: Classifier,
    extractor: Extractor,
    metrics: CuratorMetrics,
}

impl Curator {
    /// Create a new Curator with the given configuration
    ///
    /// # Errors
    /// `Config` if any part of the configuration is invalid
    pub fn new(config: CuratorConfig) -> Result<Self, CuratorError> {
        config.validate()?;
        let classifier = Classifier::new(config.classifier.clone())
            .map_err(|e| CuratorError::Config(e.to_string()))?;
        let extractor = Extractor::new(config.extractor.clone())
            .map_err(|e| CuratorError::Config(e.to_string()))?;

        Ok(Self {
            config,
            classifier,
            extractor,
            metrics: CuratorMetrics::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &CuratorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Link one entity against every other known entity
    ///
    /// Pairs are classified in the direction `id → other` when their
    /// similarity reaches `min_similarity` or a kind rule matches their
    /// kinds. Pattern candidates come from the entity's own observations.
    ///
    /// # Errors
    /// `NotFound` if the entity does not exist, `Collaborator` if the entity
    /// store cannot be read. Failures of single pairs or upserts are
    /// collected in the report instead.
    pub fn link_entity<E, P, R>(
        &mut self,
        entities: &E,
        similarity: &P,
        store: &R,
        id: &EntityId,
    ) -> Result<LinkReport, CuratorError>
    where
        E: EntityStore,
        E::Error: Display,
        P: SimilarityProvider,
        P::Error: Display,
        R: RelationshipStore,
        R::Error: Display,
    {
        let start = Instant::now();

        let entity = entities
            .get_entity(id)
            .map_err(|e| CuratorError::Collaborator(e.to_string()))?
            .ok_or_else(|| TrellisError::NotFound(format!("Entity {} not found", id)))?;
        let known = entities
            .list_entities()
            .map_err(|e| CuratorError::Collaborator(e.to_string()))?;

        let mut report = LinkReport::default();
        self.link_loaded(&entity, &known, similarity, store, &mut report);
        self.finish_link_run(&report, start);

        Ok(report)
    }

    /// Link every known entity, continuing past per-item failures
    ///
    /// # Errors
    /// `Collaborator` if the entity list cannot be read
    pub fn link_all<E, P, R>(
        &mut self,
        entities: &E,
        similarity: &P,
        store: &R,
    ) -> Result<LinkReport, CuratorError>
    where
        E: EntityStore,
        E::Error: Display,
        P: SimilarityProvider,
        P::Error: Display,
        R: RelationshipStore,
        R::Error: Display,
    {
        let start = Instant::now();

        let known = entities
            .list_entities()
            .map_err(|e| CuratorError::Collaborator(e.to_string()))?;

        let mut report = LinkReport::default();
        for entity in &known {
            self.link_loaded(entity, &known, similarity, store, &mut report);
        }
        self.finish_link_run(&report, start);

        Ok(report)
    }

    /// Discover transitive edges and upsert them
    ///
    /// # Errors
    /// `Engine` if the discovery bounds are invalid or the store cannot be
    /// read. Rejected upserts are collected in the report.
    pub fn run_discovery<R>(&mut self, store: &R) -> Result<DiscoveryReport, CuratorError>
    where
        R: RelationshipStore,
        R::Error: Display,
    {
        let start = Instant::now();
        let mut report = DiscoveryReport::default();

        for proposal in discover(store, &self.config.discovery)? {
            report.proposed += 1;
            match self.apply(store, proposal) {
                Ok(applied) => report.record(applied),
                Err(reason) => {
                    warn!("Discovery upsert failed: {}", reason);
                    self.metrics.record_failure();
                    report.failures.push(reason);
                }
            }
        }

        self.metrics.record_discovery_run();
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;

        info!(
            "Discovery run completed: {} proposed, {} inserted, {} merged, {} unchanged, {} failures",
            report.proposed,
            report.inserted,
            report.merged,
            report.unchanged,
            report.failures.len()
        );

        Ok(report)
    }

    fn link_loaded<P, R>(
        &mut self,
        entity: &Entity,
        known: &[Entity],
        similarity: &P,
        store: &R,
        report: &mut LinkReport,
    ) where
        P: SimilarityProvider,
        P::Error: Display,
        R: RelationshipStore,
        R::Error: Display,
    {
        report.entities += 1;

        let mut candidates = Vec::new();
        for other in known.iter().filter(|other| other.id != entity.id) {
            let score = match similarity.similarity(&entity.id, &other.id) {
                Ok(score) => score,
                Err(e) => {
                    self.fail(
                        report,
                        &entity.id,
                        format!("similarity of {} and {}: {}", entity.id, other.id, e),
                    );
                    continue;
                }
            };

            let kind_rule = self.classifier.kind_rule(&entity.kind, &other.kind);
            if score < self.config.min_similarity && kind_rule.is_none() {
                continue;
            }

            match self.classifier.classify(entity, other, score) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => self.fail(report, &entity.id, e.to_string()),
            }
        }
        candidates.extend(self.extractor.extract(entity, known));

        report.candidates += candidates.len();
        for candidate in candidates {
            match self.apply(store, candidate) {
                Ok(applied) => report.record(applied),
                Err(reason) => self.fail(report, &entity.id, reason),
            }
        }
    }

    /// Upsert a candidate, or only log it in dry run; `None` means skipped
    fn apply<R>(
        &mut self,
        store: &R,
        candidate: Relationship,
    ) -> Result<Option<UpsertOutcome>, String>
    where
        R: RelationshipStore,
        R::Error: Display,
    {
        if self.config.dry_run {
            debug!("[DRY RUN] Would upsert {}", candidate);
            self.metrics.record_skip();
            return Ok(None);
        }

        let method = candidate.discovery_method;
        let rendered = candidate.to_string();
        let outcome = store
            .upsert(candidate)
            .map_err(|e| format!("upsert of {}: {}", rendered, e))?;
        self.metrics.record_outcome(method, outcome);
        Ok(Some(outcome))
    }

    fn fail(&mut self, report: &mut LinkReport, entity: &EntityId, reason: String) {
        warn!("Linking {} failed: {}", entity, reason);
        self.metrics.record_failure();
        report.failures.push(LinkFailure {
            entity: entity.clone(),
            reason,
        });
    }

    fn finish_link_run(&mut self, report: &LinkReport, start: Instant) {
        self.metrics.record_link_run();
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;

        info!(
            "Link run completed: {} entities, {} candidates, {} inserted, {} merged, {} unchanged, {} failures",
            report.entities,
            report.candidates,
            report.inserted,
            report.merged,
            report.unchanged,
            report.failures.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use trellis_domain::{DiscoveryMethod, EntityKind, RelationshipType};
    use trellis_graph::RelationshipGraph;

    // Mock entity store for testing
    struct MockEntities {
        entities: Vec<Entity>,
        broken: bool,
    }

    impl MockEntities {
        fn new(entities: Vec<Entity>) -> Self {
            Self {
                entities,
                broken: false,
            }
        }
    }

    impl EntityStore for MockEntities {
        type Error = String;

        fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>, Self::Error> {
            if self.broken {
                return Err("entity store offline".to_string());
            }
            Ok(self.entities.iter().find(|e| &e.id == id).cloned())
        }

        fn list_entities(&self) -> Result<Vec<Entity>, Self::Error> {
            if self.broken {
                return Err("entity store offline".to_string());
            }
            Ok(self.entities.clone())
        }
    }

    // Symmetric similarity table; unknown pairs score 0.0
    #[derive(Default)]
    struct MockSimilarity {
        scores: HashMap<(String, String), f64>,
        failing: HashSet<String>,
    }

    impl MockSimilarity {
        fn with(mut self, a: &str, b: &str, score: f64) -> Self {
            self.scores.insert((a.to_string(), b.to_string()), score);
            self.scores.insert((b.to_string(), a.to_string()), score);
            self
        }

        fn failing_for(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }
    }

    impl SimilarityProvider for MockSimilarity {
        type Error = String;

        fn similarity(&self, a: &EntityId, b: &EntityId) -> Result<f64, Self::Error> {
            if self.failing.contains(a.as_str()) || self.failing.contains(b.as_str()) {
                return Err(format!("no embedding for {} or {}", a, b));
            }
            Ok(self
                .scores
                .get(&(a.to_string(), b.to_string()))
                .copied()
                .unwrap_or(0.0))
        }
    }

    fn curator() -> Curator {
        Curator::new(CuratorConfig::default()).unwrap()
    }

    fn library(id: &str) -> Entity {
        Entity::new(id, id, EntityKind::Library)
    }

    #[test]
    fn test_link_entity_classifies_similar_pair() {
        let entities = MockEntities::new(vec![library("pytest"), library("pytest-cov")]);
        let similarity = MockSimilarity::default().with("pytest", "pytest-cov", 0.88);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let report = curator
            .link_entity(&entities, &similarity, &graph, &EntityId::new("pytest"))
            .unwrap();

        assert_eq!(report.entities, 1);
        assert_eq!(report.inserted, 1);
        assert!(report.is_clean());

        let edge = graph
            .get(
                &EntityId::new("pytest"),
                &EntityId::new("pytest-cov"),
                RelationshipType::VerySimilarTo,
            )
            .unwrap()
            .unwrap();
        assert_eq!(edge.confidence.score(), 0.88);
        assert_eq!(edge.similarity, Some(0.88));
        assert_eq!(edge.discovery_method, DiscoveryMethod::Similarity);
    }

    #[test]
    fn test_link_entity_skips_dissimilar_pair() {
        let entities = MockEntities::new(vec![library("serde"), library("tokio")]);
        let similarity = MockSimilarity::default().with("serde", "tokio", 0.2);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let report = curator
            .link_entity(&entities, &similarity, &graph, &EntityId::new("serde"))
            .unwrap();

        assert_eq!(report.candidates, 0);
        assert!(graph.is_empty().unwrap());
    }

    #[test]
    fn test_kind_rule_links_below_similarity_gate() {
        let entities = MockEntities::new(vec![
            library("pytest"),
            Entity::new("webapp", "webapp", EntityKind::Project),
        ]);
        let similarity = MockSimilarity::default().with("pytest", "webapp", 0.1);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        curator
            .link_entity(&entities, &similarity, &graph, &EntityId::new("pytest"))
            .unwrap();

        let edge = graph
            .get(
                &EntityId::new("pytest"),
                &EntityId::new("webapp"),
                RelationshipType::UsedBy,
            )
            .unwrap()
            .unwrap();
        assert_eq!(edge.confidence.score(), 0.6);
        assert_eq!(edge.discovery_method, DiscoveryMethod::TypeHeuristic);
    }

    #[test]
    fn test_link_entity_extracts_patterns() {
        let entities = MockEntities::new(vec![
            Entity::new("api-gateway", "api-gateway", EntityKind::Service)
                .with_observation("Connects to Redis for session storage"),
            Entity::new("redis", "Redis", EntityKind::Service),
        ]);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let report = curator
            .link_entity(
                &entities,
                &MockSimilarity::default(),
                &graph,
                &EntityId::new("api-gateway"),
            )
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert!(graph
            .has_edge(
                &EntityId::new("api-gateway"),
                &EntityId::new("redis"),
                RelationshipType::ConnectsTo
            )
            .unwrap());
        assert_eq!(curator.metrics().inserted[&DiscoveryMethod::Pattern], 1);
    }

    #[test]
    fn test_link_entity_not_found() {
        let entities = MockEntities::new(vec![library("pytest")]);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let err = curator
            .link_entity(
                &entities,
                &MockSimilarity::default(),
                &graph,
                &EntityId::new("missing"),
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_entity_store_failure_is_collaborator_error() {
        let mut entities = MockEntities::new(vec![library("pytest")]);
        entities.broken = true;
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let err = curator
            .link_all(&entities, &MockSimilarity::default(), &graph)
            .unwrap_err();
        assert!(matches!(err, CuratorError::Collaborator(_)));
    }

    #[test]
    fn test_link_all_continues_past_failures() {
        let entities = MockEntities::new(vec![library("a"), library("b"), library("c")]);
        let similarity = MockSimilarity::default()
            .with("a", "b", 0.8)
            .failing_for("c");
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let report = curator.link_all(&entities, &similarity, &graph).unwrap();

        assert_eq!(report.entities, 3);
        // a -> b and b -> a
        assert_eq!(report.inserted, 2);
        // a/c, b/c, c/a, c/b
        assert_eq!(report.failures.len(), 4);
        assert_eq!(curator.metrics().failures, 4);
        assert!(graph
            .has_edge(
                &EntityId::new("b"),
                &EntityId::new("a"),
                RelationshipType::SimilarTo
            )
            .unwrap());
    }

    #[test]
    fn test_out_of_range_similarity_is_recorded() {
        let entities = MockEntities::new(vec![library("a"), library("b")]);
        let similarity = MockSimilarity::default().with("a", "b", 1.7);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        let report = curator
            .link_entity(&entities, &similarity, &graph, &EntityId::new("a"))
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entity, EntityId::new("a"));
        assert!(graph.is_empty().unwrap());
    }

    #[test]
    fn test_relinking_is_unchanged() {
        let entities = MockEntities::new(vec![library("a"), library("b")]);
        let similarity = MockSimilarity::default().with("a", "b", 0.9);
        let graph = RelationshipGraph::new();
        let mut curator = curator();

        curator.link_all(&entities, &similarity, &graph).unwrap();
        let second = curator.link_all(&entities, &similarity, &graph).unwrap();

        assert_eq!(second.written(), 0);
        assert_eq!(second.unchanged, 2);
        assert_eq!(curator.metrics().link_runs, 2);
        assert_eq!(graph.len().unwrap(), 2);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let config = CuratorConfig {
            dry_run: true,
            ..Default::default()
        };
        let entities = MockEntities::new(vec![library("a"), library("b")]);
        let similarity = MockSimilarity::default().with("a", "b", 0.9);
        let graph = RelationshipGraph::new();
        let mut curator = Curator::new(config).unwrap();

        let report = curator.link_all(&entities, &similarity, &graph).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.skipped, 2);
        assert!(graph.is_empty().unwrap());
        assert_eq!(curator.metrics().skipped, 2);
    }

    #[test]
    fn test_run_discovery_upserts_proposals() {
        let graph = RelationshipGraph::new();
        for (s, t, c) in [("a", "b", 0.9), ("b", "c", 0.7)] {
            graph
                .upsert(Relationship::new(
                    s,
                    t,
                    RelationshipType::DependsOn,
                    c,
                    DiscoveryMethod::Pattern,
                ))
                .unwrap();
        }
        let mut curator = curator();

        let report = curator.run_discovery(&graph).unwrap();
        assert_eq!(report.proposed, 1);
        assert_eq!(report.inserted, 1);

        let edge = graph
            .get(
                &EntityId::new("a"),
                &EntityId::new("c"),
                RelationshipType::DependsOn,
            )
            .unwrap()
            .unwrap();
        assert_eq!(edge.discovery_method, DiscoveryMethod::Transitive);
        assert_eq!(edge.confidence.score(), 0.7);

        let again = curator.run_discovery(&graph).unwrap();
        assert_eq!(again.proposed, 0);
        assert_eq!(curator.metrics().discovery_runs, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CuratorConfig {
            min_similarity: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            Curator::new(config),
            Err(CuratorError::Config(_))
        ));
    }
}
