//! Topology module - Graph model and algorithms for the router network

pub mod engine;
pub mod graph;
pub mod invariants;

pub use engine::{Hop, PathCost, PathEngine, PathResult};
pub use graph::{GraphStore, LinkChange, LinkStatus, MAX_WEIGHT};
pub use invariants::InvariantChecker;
