//! Trellis Discovery
//!
//! Finds relationships implied by chains of direct relationships.
//!
//! For every entity `A`, [`discover`] follows up to `max_fanout_per_node`
//! strongest outgoing edges per node, for up to `max_chain_length` hops. A
//! chain `A → B → … → Z` proposes `A → Z` when:
//!
//! - `Z` is not `A`, and no node repeats within the chain
//! - the composed type is the shared type of every edge, or `related_to`
//!   for a mixed chain
//! - its confidence, the weakest edge in the chain, beats any existing
//!   `A → Z` edge of the composed type
//!
//! Proposals are submitted by the caller through the graph's normal upsert
//! path. Once they are, a second run over the same edges proposes nothing.

#![warn(missing_docs)]

mod config;
mod discoverer;
mod snapshot;

pub use config::DiscoveryConfig;
pub use discoverer::{compose, discover, Discovery};
pub use snapshot::{GraphSnapshot, Link};
