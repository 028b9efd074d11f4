//! Trellis Graph
//!
//! The in-memory home of accepted relationships. [`RelationshipGraph`] owns
//! deduplication: at most one edge per (source, target, type), no self-loops,
//! and no confidence regressions on re-insertion.
//!
//! The graph is passed explicitly to whoever needs it. Discovery reads it
//! through the [`RelationshipStore`](trellis_domain::traits::RelationshipStore)
//! trait, which the SQLite store in `trellis-store` implements as well.

#![warn(missing_docs)]

mod graph;

pub use graph::RelationshipGraph;
