//! # Topology - Router network model and path engine
//!
//! Maintains a mutable network of named routers connected by weighted,
//! undirected links, and answers shortest-path queries between any two of them.
//!
//! ## Components
//!
//! - **GraphStore**: the authoritative set of routers and links
//! - **PathEngine**: Dijkstra over an immutable snapshot of the store
//! - **ConsistencyGuard**: serializes mutations and hands out snapshots
//! - **InvariantChecker**: audits a snapshot for internal corruption

pub mod config;
pub mod guard;
pub mod topology;

pub use config::{SelectionStrategy, TopologyConfig};
pub use guard::{ConsistencyGuard, Snapshot};
pub use topology::{
    engine::{Hop, PathCost, PathEngine, PathResult, UNREACHABLE_WEIGHT},
    graph::{GraphStore, LinkChange, LinkStatus, MAX_WEIGHT},
    invariants::{InvariantChecker, InvariantViolation, ViolationSeverity},
};

/// Error types for topology operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("Router already exists: {0}")]
    AlreadyExists(String),

    #[error("Router not found: {0}")]
    UnknownNode(String),

    #[error("Invalid link weight: {0}")]
    InvalidWeight(f64),

    #[error("Cannot link router {0} to itself")]
    SelfLink(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl TopologyError {
    /// Whether the caller can recover by changing its request.
    ///
    /// Invariant violations mean the store itself is corrupt and are never
    /// the caller's fault.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TopologyError::InvariantViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;
