//! Consistency guard - the single synchronization point over the store
//!
//! Mutations run one at a time under the write lock. Readers take the read
//! lock only long enough to clone an `Arc` of the current store, so every
//! query works on an immutable point-in-time snapshot and never sees a
//! half-applied mutation. Each mutation validates against the settled store
//! first; only a mutation that will actually write copies a store that live
//! snapshots still share (`Arc::make_mut`), leaving those snapshots intact.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::config::TopologyConfig;
use crate::topology::engine::{PathEngine, PathResult};
use crate::topology::graph::{GraphStore, LinkChange, LinkStatus};
use crate::topology::invariants::{InvariantChecker, InvariantViolation};
use crate::{Result, TopologyError};

/// Immutable point-in-time view of the store
pub type Snapshot = Arc<GraphStore>;

#[derive(Clone)]
pub struct ConsistencyGuard {
    store: Arc<RwLock<Arc<GraphStore>>>,
    engine: PathEngine,
}

impl Default for ConsistencyGuard {
    fn default() -> Self {
        Self::new(&TopologyConfig::default())
    }
}

impl ConsistencyGuard {
    pub fn new(config: &TopologyConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(Arc::new(GraphStore::new()))),
            engine: PathEngine::new(config),
        }
    }

    /// Wrap an existing store, e.g. one restored from a serialized snapshot.
    ///
    /// The store is audited in strict mode first: any violation, self loops
    /// included, is rejected as `InvariantViolation`.
    pub fn with_store(store: GraphStore, config: &TopologyConfig) -> Result<Self> {
        InvariantChecker::new()
            .with_strict_mode(true)
            .ensure_consistent(&store)?;

        Ok(Self {
            store: Arc::new(RwLock::new(Arc::new(store))),
            engine: PathEngine::new(config),
        })
    }

    pub fn engine(&self) -> PathEngine {
        self.engine
    }

    /// Current state of the store; later mutations do not affect it
    pub async fn snapshot(&self) -> Snapshot {
        self.store.read().await.clone()
    }

    pub async fn add_node(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut current = self.store.write().await;
        if current.contains(&name) {
            return Err(TopologyError::AlreadyExists(name));
        }
        Arc::make_mut(&mut current).add_node(name)
    }

    /// Remove a router and its links. Always succeeds.
    pub async fn remove_node(&self, name: &str) -> bool {
        let mut current = self.store.write().await;
        if !current.contains(name) {
            return false;
        }
        Arc::make_mut(&mut current).remove_node(name)
    }

    pub async fn add_or_update_link(&self, a: &str, b: &str, weight: f64) -> Result<LinkChange> {
        let mut current = self.store.write().await;
        // Reject before make_mut so a failed write never copies a shared store
        current.status_of_link(a, b)?;
        GraphStore::validate_weight(weight)?;
        Arc::make_mut(&mut current).add_or_update_link(a, b, weight)
    }

    /// Remove the link between two routers. Always succeeds.
    pub async fn remove_link(&self, a: &str, b: &str) -> bool {
        let mut current = self.store.write().await;
        if current.weight(a, b).is_none() {
            return false;
        }
        Arc::make_mut(&mut current).remove_link(a, b)
    }

    pub async fn list_nodes(&self) -> Vec<String> {
        self.snapshot().await.list_nodes()
    }

    pub async fn neighbors_of(&self, name: &str) -> Result<IndexMap<String, f64>> {
        self.snapshot().await.neighbors_of(name).cloned()
    }

    pub async fn status_of_link(&self, a: &str, b: &str) -> Result<LinkStatus> {
        self.snapshot().await.status_of_link(a, b)
    }

    /// Shortest path over a snapshot, computed outside the lock
    pub async fn shortest_path(&self, from: &str, to: &str) -> Result<PathResult> {
        let snapshot = self.snapshot().await;
        let result = self.engine.shortest_path(&snapshot, from, to);
        tracing::debug!(
            from = %from,
            to = %to,
            version = snapshot.version(),
            weight = result.as_ref().map(PathResult::weight).ok(),
            "path query"
        );
        result
    }

    pub async fn distances_from(&self, source: &str) -> Result<IndexMap<String, f64>> {
        let snapshot = self.snapshot().await;
        self.engine.distances_from(&snapshot, source)
    }

    pub async fn check_invariants(&self) -> Vec<InvariantViolation> {
        let snapshot = self.snapshot().await;
        InvariantChecker::new().check_all(&snapshot)
    }
}
