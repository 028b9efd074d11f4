//! End-to-end linking and discovery against the SQLite store

use std::collections::HashMap;
use tempfile::TempDir;
use trellis_curator::{Curator, CuratorConfig, CuratorWorker};
use trellis_domain::traits::{EntityStore, RelationshipStore, SimilarityProvider};
use trellis_domain::{DiscoveryMethod, Entity, EntityId, EntityKind, RelationshipType};
use trellis_graph::RelationshipGraph;
use trellis_store::SqliteRelationshipStore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct Catalog {
    entities: HashMap<EntityId, Entity>,
}

impl Catalog {
    /// app -> requests -> urllib3 through observations only
    fn dependency_chain() -> Self {
        let entities = [
            Entity::new("app", "app", EntityKind::Service)
                .with_observation("depends on requests for HTTP calls"),
            Entity::new("requests", "requests", EntityKind::Service)
                .with_observation("depends on urllib3 internally"),
            Entity::new("urllib3", "urllib3", EntityKind::Service),
        ];
        Self {
            entities: entities.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }
}

impl EntityStore for Catalog {
    type Error = String;

    fn get_entity(&self, id: &EntityId) -> Result<Option<Entity>, Self::Error> {
        Ok(self.entities.get(id).cloned())
    }

    fn list_entities(&self) -> Result<Vec<Entity>, Self::Error> {
        let mut all: Vec<_> = self.entities.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

struct Unrelated;

impl SimilarityProvider for Unrelated {
    type Error = String;

    fn similarity(&self, _a: &EntityId, _b: &EntityId) -> Result<f64, Self::Error> {
        Ok(0.1)
    }
}

fn id(s: &str) -> EntityId {
    EntityId::new(s)
}

#[test]
fn test_link_then_discover() {
    init_tracing();
    let store = SqliteRelationshipStore::in_memory().unwrap();
    let mut curator = Curator::new(CuratorConfig::default()).unwrap();

    let linked = curator
        .link_all(&Catalog::dependency_chain(), &Unrelated, &store)
        .unwrap();
    assert_eq!(linked.entities, 3);
    assert_eq!(linked.inserted, 2);
    assert!(linked.is_clean());

    let discovered = curator.run_discovery(&store).unwrap();
    assert_eq!(discovered.proposed, 1);
    assert_eq!(discovered.inserted, 1);

    let edge = store
        .get(&id("app"), &id("urllib3"), RelationshipType::DependsOn)
        .unwrap()
        .unwrap();
    assert_eq!(edge.discovery_method, DiscoveryMethod::Transitive);
    assert_eq!(edge.confidence.score(), 0.7);
    assert_eq!(
        edge.evidence.as_ref().and_then(|e| e.chain()),
        Some(&[id("requests")][..])
    );

    let again = curator.run_discovery(&store).unwrap();
    assert_eq!(again.proposed, 0);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_link_single_entity_missing() {
    init_tracing();
    let store = SqliteRelationshipStore::in_memory().unwrap();
    let mut curator = Curator::new(CuratorConfig::default()).unwrap();

    let err = curator
        .link_entity(&Catalog::dependency_chain(), &Unrelated, &store, &id("nope"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_dry_run_leaves_store_empty() {
    init_tracing();
    let store = SqliteRelationshipStore::in_memory().unwrap();
    let config = CuratorConfig {
        dry_run: true,
        ..Default::default()
    };
    let mut curator = Curator::new(config).unwrap();

    let linked = curator
        .link_all(&Catalog::dependency_chain(), &Unrelated, &store)
        .unwrap();

    assert_eq!(linked.candidates, 2);
    assert_eq!(linked.skipped, 2);
    assert_eq!(store.count().unwrap(), 0);
    assert!(curator.metrics().summary().contains("Skipped (dry run): 2"));
}

#[test]
fn test_persisted_edges_hydrate_graph() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trellis.db");

    {
        let store = SqliteRelationshipStore::open(&path).unwrap();
        let mut curator = Curator::new(CuratorConfig::default()).unwrap();
        curator
            .link_all(&Catalog::dependency_chain(), &Unrelated, &store)
            .unwrap();
        curator.run_discovery(&store).unwrap();
    }

    let store = SqliteRelationshipStore::open(&path).unwrap();
    let graph = RelationshipGraph::new();
    assert_eq!(graph.hydrate(&store).unwrap(), 3);
    assert!(graph
        .has_edge(&id("app"), &id("urllib3"), RelationshipType::DependsOn)
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_worker_discovers_after_linking() {
    init_tracing();
    let store = SqliteRelationshipStore::in_memory().unwrap();
    let mut worker = CuratorWorker::new(CuratorConfig::default()).unwrap();

    worker
        .curator_mut()
        .link_all(&Catalog::dependency_chain(), &Unrelated, &store)
        .unwrap();
    let reports = worker.run_cycles(&store, 2).await.unwrap();

    assert_eq!(reports[0].inserted, 1);
    assert_eq!(reports[1].proposed, 0);
    assert_eq!(worker.metrics().link_runs, 1);
    assert_eq!(worker.metrics().discovery_runs, 2);
}
