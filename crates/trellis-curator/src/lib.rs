//! Trellis Curator
//!
//! Caller-side orchestration of the relationship inference engine.
//!
//! # Overview
//!
//! The Curator wires the engine components to the host's collaborators:
//! - **Linking**: Classifies an entity against every other known entity and
//!   extracts pattern relationships from its observations
//! - **Discovery**: Derives transitive edges from chains of direct edges
//! - **Upserting**: Writes every candidate through a `RelationshipStore`,
//!   where the dedup and priority rule applies
//! - **Metrics**: Counts outcomes per discovery method for monitoring
//!
//! Failures of a single pair or upsert are collected in the run's report and
//! logged at `warn`; they never abort a batch.
//!
//! # Usage
//!
//! ## Linking and discovery
//!
//! ```no_run
//! use trellis_curator::{Curator, CuratorConfig};
//! use trellis_domain::traits::{EntityStore, SimilarityProvider};
//! use trellis_store::SqliteRelationshipStore;
//!
//! # fn link<E, P>(entities: &E, similarity: &P) -> Result<(), Box<dyn std::error::Error>>
//! # where
//! #     E: EntityStore,
//! #     E::Error: std::fmt::Display,
//! #     P: SimilarityProvider,
//! #     P::Error: std::fmt::Display,
//! # {
//! let store = SqliteRelationshipStore::open("trellis.db")?;
//! let mut curator = Curator::new(CuratorConfig::default())?;
//!
//! let linked = curator.link_all(entities, similarity, &store)?;
//! let discovered = curator.run_discovery(&store)?;
//! println!("{} linked, {} discovered", linked.written(), discovered.inserted);
//! println!("{}", curator.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use trellis_curator::CuratorConfig;
//!
//! // Default: similarity gate 0.5, discovery every hour, chains up to 3 hops
//! let config = CuratorConfig::default();
//!
//! // Strict: fewer, stronger links
//! let config = CuratorConfig::strict();
//!
//! // Lenient: more links, longer chains
//! let config = CuratorConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! ```toml
//! min_similarity = 0.5
//! discovery_interval_minutes = 60
//! dry_run = false
//!
//! [discovery]
//! max_chain_length = 3
//! max_fanout_per_node = 10
//! min_edge_confidence = 0.0
//! ```

#![warn(missing_docs)]

mod config;
mod curator;
mod error;
mod metrics;
mod worker;

pub use config::CuratorConfig;
pub use curator::{Curator, DiscoveryReport, LinkFailure, LinkReport};
pub use error::CuratorError;
pub use metrics::CuratorMetrics;
pub use worker::CuratorWorker;
