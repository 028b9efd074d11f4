//! Discovery against a live RelationshipGraph

use proptest::prelude::*;
use trellis_discovery::{discover, DiscoveryConfig};
use trellis_domain::{DiscoveryMethod, EntityId, Relationship, RelationshipType};
use trellis_graph::RelationshipGraph;

fn graph_with(edges: &[(&str, &str, RelationshipType, f64)]) -> RelationshipGraph {
    let graph = RelationshipGraph::new();
    for (s, t, rt, c) in edges {
        graph
            .upsert(Relationship::new(*s, *t, *rt, *c, DiscoveryMethod::Pattern))
            .unwrap();
    }
    graph
}

fn chain_length(max_chain_length: usize) -> DiscoveryConfig {
    DiscoveryConfig {
        max_chain_length,
        ..Default::default()
    }
}

#[test]
fn test_depends_on_chain_composes() {
    let graph = graph_with(&[
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
    ]);

    let found: Vec<_> = discover(&graph, &chain_length(2)).unwrap().collect();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source, EntityId::new("A"));
    assert_eq!(found[0].target, EntityId::new("C"));
    assert_eq!(found[0].relationship_type, RelationshipType::DependsOn);
    assert_eq!(found[0].confidence.score(), 0.7);
    assert_eq!(found[0].discovery_method, DiscoveryMethod::Transitive);
}

#[test]
fn test_mixed_chain_composes_to_related_to() {
    let graph = graph_with(&[
        ("A", "B", RelationshipType::Uses, 0.9),
        ("B", "C", RelationshipType::Implements, 0.8),
    ]);

    let found: Vec<_> = discover(&graph, &chain_length(2)).unwrap().collect();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].relationship_type, RelationshipType::RelatedTo);
    assert_eq!(found[0].confidence.score(), 0.8);
}

#[test]
fn test_stronger_existing_edge_untouched() {
    let graph = graph_with(&[
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
        ("A", "C", RelationshipType::DependsOn, 0.8),
    ]);

    let found: Vec<_> = discover(&graph, &chain_length(2)).unwrap().collect();
    assert!(found.is_empty());

    let kept = graph
        .get(
            &EntityId::new("A"),
            &EntityId::new("C"),
            RelationshipType::DependsOn,
        )
        .unwrap()
        .unwrap();
    assert_eq!(kept.confidence.score(), 0.8);
}

#[test]
fn test_second_run_after_upsert_is_empty() {
    let graph = graph_with(&[
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
        ("C", "D", RelationshipType::Uses, 0.8),
        ("D", "A", RelationshipType::Uses, 0.6),
    ]);
    let config = DiscoveryConfig::default();

    let first: Vec<_> = discover(&graph, &config).unwrap().collect();
    assert!(!first.is_empty());
    for rel in first {
        graph.upsert(rel).unwrap();
    }

    assert_eq!(discover(&graph, &config).unwrap().count(), 0);
}

fn assert_closed(graph: &RelationshipGraph, config: &DiscoveryConfig) {
    let first: Vec<_> = discover(graph, config).unwrap().collect();
    assert!(!first.is_empty());
    for rel in first {
        graph.upsert(rel).unwrap();
    }

    let second: Vec<_> = discover(graph, config)
        .unwrap()
        .map(|r| r.to_string())
        .collect();
    assert!(second.is_empty(), "second run proposed {:?}", second);
}

#[test]
fn test_second_run_empty_when_proposal_raises_direct_edge() {
    let graph = graph_with(&[
        ("Z", "A", RelationshipType::DependsOn, 0.9),
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
        ("A", "C", RelationshipType::DependsOn, 0.4),
    ]);

    assert_closed(&graph, &chain_length(2));

    let z_to_c = graph
        .get(
            &EntityId::new("Z"),
            &EntityId::new("C"),
            RelationshipType::DependsOn,
        )
        .unwrap()
        .unwrap();
    assert_eq!(z_to_c.confidence.score(), 0.7);
}

#[test]
fn test_second_run_empty_on_long_chain_with_weak_shortcut() {
    let graph = graph_with(&[
        ("Y", "Z", RelationshipType::DependsOn, 0.9),
        ("Z", "A", RelationshipType::DependsOn, 0.9),
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
        ("A", "C", RelationshipType::DependsOn, 0.4),
    ]);

    assert_closed(&graph, &DiscoveryConfig::default());

    let shortcut = graph
        .get(
            &EntityId::new("A"),
            &EntityId::new("C"),
            RelationshipType::DependsOn,
        )
        .unwrap()
        .unwrap();
    assert_eq!(shortcut.confidence.score(), 0.7);
    assert_eq!(shortcut.discovery_method, DiscoveryMethod::Pattern);
}

#[test]
fn test_snapshot_ignores_later_writes() {
    let graph = graph_with(&[
        ("A", "B", RelationshipType::DependsOn, 0.9),
        ("B", "C", RelationshipType::DependsOn, 0.7),
    ]);

    let discovery = discover(&graph, &chain_length(2)).unwrap();
    graph
        .upsert(Relationship::new(
            "A",
            "C",
            RelationshipType::DependsOn,
            0.95,
            DiscoveryMethod::Pattern,
        ))
        .unwrap();

    assert_eq!(discovery.count(), 1);
}

#[test]
fn test_invalid_bounds_fail_at_call_time() {
    let graph = RelationshipGraph::new();
    assert!(discover(&graph, &chain_length(1)).is_err());
}

fn edge_strategy() -> impl Strategy<Value = (usize, usize, RelationshipType, f64, DiscoveryMethod)> {
    (
        0usize..6,
        0usize..6,
        prop::sample::select(vec![
            RelationshipType::Uses,
            RelationshipType::DependsOn,
            RelationshipType::PartOf,
        ]),
        prop::sample::select(vec![0.3, 0.5, 0.7, 0.9]),
        prop::sample::select(vec![
            DiscoveryMethod::Pattern,
            DiscoveryMethod::Similarity,
            DiscoveryMethod::Transitive,
        ]),
    )
}

fn config_strategy() -> impl Strategy<Value = DiscoveryConfig> {
    (2usize..=4, 1usize..=4, prop::sample::select(vec![0.0, 0.5])).prop_map(
        |(max_chain_length, max_fanout_per_node, min_edge_confidence)| DiscoveryConfig {
            max_chain_length,
            max_fanout_per_node,
            min_edge_confidence,
        },
    )
}

fn build(edges: &[(usize, usize, RelationshipType, f64, DiscoveryMethod)]) -> RelationshipGraph {
    let graph = RelationshipGraph::new();
    for (s, t, rt, c, method) in edges {
        if s == t {
            continue;
        }
        graph
            .upsert(Relationship::new(
                format!("n{}", s),
                format!("n{}", t),
                *rt,
                *c,
                *method,
            ))
            .unwrap();
    }
    graph
}

proptest! {
    #[test]
    fn prop_never_self_loops(
        edges in prop::collection::vec(edge_strategy(), 0..24),
        config in config_strategy(),
    ) {
        let graph = build(&edges);

        for rel in discover(&graph, &config).unwrap() {
            prop_assert_ne!(&rel.source, &rel.target);
            prop_assert_eq!(rel.discovery_method, DiscoveryMethod::Transitive);
            let chain = rel.evidence.as_ref().and_then(|e| e.chain()).unwrap();
            prop_assert!(!chain.is_empty() && chain.len() < config.max_chain_length);
            prop_assert!(!chain.contains(&rel.source) && !chain.contains(&rel.target));
        }
    }

    #[test]
    fn prop_second_run_is_empty(
        edges in prop::collection::vec(edge_strategy(), 0..24),
        config in config_strategy(),
    ) {
        let graph = build(&edges);

        let first: Vec<_> = discover(&graph, &config).unwrap().collect();
        for rel in first {
            graph.upsert(rel).unwrap();
        }

        let second: Vec<_> = discover(&graph, &config).unwrap().collect();
        prop_assert!(second.is_empty(), "second run proposed {:?}", second);
    }
}
