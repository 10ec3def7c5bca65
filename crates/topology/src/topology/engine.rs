//! Path engine - Dijkstra shortest paths over a store snapshot
//!
//! Ties between routers at equal tentative distance are broken by insertion
//! order: the router added to the store first is settled first, and neighbors
//! are relaxed in the order their links were created. A fixed sequence of
//! mutations therefore always yields the same path among equal-cost ones.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::graph::GraphStore;
use crate::config::{SelectionStrategy, TopologyConfig};
use crate::{Result, TopologyError};

/// Wire value of the cost of an unreachable route
pub const UNREACHABLE_WEIGHT: f64 = -1.0;

/// One traversed link of a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub weight: f64,
}

/// Total cost of a path query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCost {
    Reachable(f64),
    Unreachable,
}

/// Result of a shortest-path query, rebuilt fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub from: String,
    pub to: String,
    pub cost: PathCost,
    /// Routers visited, source first. Empty when unreachable.
    pub nodes: Vec<String>,
    pub hops: Vec<Hop>,
}

impl PathResult {
    fn trivial(router: &str) -> Self {
        Self {
            from: router.to_string(),
            to: router.to_string(),
            cost: PathCost::Reachable(0.0),
            nodes: vec![router.to_string()],
            hops: Vec::new(),
        }
    }

    fn unreachable(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            cost: PathCost::Unreachable,
            nodes: Vec::new(),
            hops: Vec::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self.cost, PathCost::Reachable(_))
    }

    /// Total weight, or `UNREACHABLE_WEIGHT` when no path exists
    pub fn weight(&self) -> f64 {
        match self.cost {
            PathCost::Reachable(weight) => weight,
            PathCost::Unreachable => UNREACHABLE_WEIGHT,
        }
    }
}

/// Heap entry for Dijkstra's algorithm
#[derive(Clone, Copy, PartialEq)]
struct DijkstraState {
    cost: f64,
    ordinal: usize,
}

impl Eq for DijkstraState {}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, lower ordinal wins ties
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.ordinal.cmp(&self.ordinal))
    }
}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-query search state, indexed by router ordinal
struct Search {
    dist: Vec<f64>,
    prev: Vec<Option<usize>>,
    settled: Vec<bool>,
}

impl Search {
    fn new(size: usize, source: usize) -> Self {
        let mut dist = vec![f64::INFINITY; size];
        dist[source] = 0.0;
        Self {
            dist,
            prev: vec![None; size],
            settled: vec![false; size],
        }
    }
}

/// Stateless shortest-path engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEngine {
    selection: SelectionStrategy,
}

impl PathEngine {
    pub fn new(config: &TopologyConfig) -> Self {
        Self {
            selection: config.selection,
        }
    }

    pub fn with_selection(selection: SelectionStrategy) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> SelectionStrategy {
        self.selection
    }

    /// Find the minimum-weight path between two routers.
    ///
    /// A router queried against itself costs 0 whether or not it is in the
    /// store. Otherwise both routers must exist.
    pub fn shortest_path(&self, graph: &GraphStore, from: &str, to: &str) -> Result<PathResult> {
        if from == to {
            return Ok(PathResult::trivial(from));
        }

        let source = graph
            .ordinal(from)
            .ok_or_else(|| TopologyError::UnknownNode(from.to_string()))?;
        let target = graph
            .ordinal(to)
            .ok_or_else(|| TopologyError::UnknownNode(to.to_string()))?;

        let search = self.run(graph, source, Some(target))?;
        if search.dist[target].is_infinite() {
            return Ok(PathResult::unreachable(from, to));
        }

        Self::reconstruct(graph, &search, source, target, from, to)
    }

    /// Distance from `source` to every router reachable from it, in insertion order
    pub fn distances_from(&self, graph: &GraphStore, source: &str) -> Result<IndexMap<String, f64>> {
        let start = graph
            .ordinal(source)
            .ok_or_else(|| TopologyError::UnknownNode(source.to_string()))?;

        let search = self.run(graph, start, None)?;
        Ok(graph
            .adjacency()
            .keys()
            .zip(search.dist)
            .filter(|(_, dist)| dist.is_finite())
            .map(|(name, dist)| (name.clone(), dist))
            .collect())
    }

    /// Check if a path exists between two routers
    pub fn path_exists(&self, graph: &GraphStore, from: &str, to: &str) -> Result<bool> {
        Ok(self.shortest_path(graph, from, to)?.is_reachable())
    }

    fn run(&self, graph: &GraphStore, source: usize, target: Option<usize>) -> Result<Search> {
        let mut search = Search::new(graph.node_count(), source);
        match self.selection {
            SelectionStrategy::BinaryHeap => Self::run_heap(graph, &mut search, source, target)?,
            SelectionStrategy::LinearScan => Self::run_linear(graph, &mut search, target)?,
        }
        Ok(search)
    }

    fn run_heap(
        graph: &GraphStore,
        search: &mut Search,
        source: usize,
        target: Option<usize>,
    ) -> Result<()> {
        let mut heap = BinaryHeap::new();
        heap.push(DijkstraState { cost: 0.0, ordinal: source });

        while let Some(DijkstraState { ordinal, .. }) = heap.pop() {
            // Stale entry for a router already settled at a lower cost
            if search.settled[ordinal] {
                continue;
            }
            search.settled[ordinal] = true;
            if Some(ordinal) == target {
                break;
            }

            for (next, cost) in Self::relax(graph, search, ordinal)? {
                heap.push(DijkstraState { cost, ordinal: next });
            }
        }
        Ok(())
    }

    fn run_linear(graph: &GraphStore, search: &mut Search, target: Option<usize>) -> Result<()> {
        loop {
            let mut current: Option<usize> = None;
            for (ordinal, dist) in search.dist.iter().enumerate() {
                if search.settled[ordinal] || dist.is_infinite() {
                    continue;
                }
                if current.map_or(true, |best| *dist < search.dist[best]) {
                    current = Some(ordinal);
                }
            }

            let Some(current) = current else {
                return Ok(());
            };
            search.settled[current] = true;
            if Some(current) == target {
                return Ok(());
            }
            Self::relax(graph, search, current)?;
        }
    }

    /// Relax every link out of `current`, returning the routers whose distance improved
    fn relax(graph: &GraphStore, search: &mut Search, current: usize) -> Result<Vec<(usize, f64)>> {
        let adjacency = graph.adjacency();
        let (name, links) = adjacency
            .get_index(current)
            .ok_or_else(|| TopologyError::InvariantViolation(format!("no router at ordinal {}", current)))?;

        let mut improved = Vec::new();
        for (neighbor, weight) in links {
            let next = adjacency.get_index_of(neighbor).ok_or_else(|| {
                TopologyError::InvariantViolation(format!(
                    "link {} - {} references a missing router",
                    name, neighbor
                ))
            })?;
            if search.settled[next] {
                continue;
            }

            let candidate = search.dist[current] + weight;
            if candidate < search.dist[next] {
                search.dist[next] = candidate;
                search.prev[next] = Some(current);
                improved.push((next, candidate));
            }
        }
        Ok(improved)
    }

    fn reconstruct(
        graph: &GraphStore,
        search: &Search,
        source: usize,
        target: usize,
        from: &str,
        to: &str,
    ) -> Result<PathResult> {
        let adjacency = graph.adjacency();
        let name_of = |ordinal: usize| -> Result<String> {
            adjacency
                .get_index(ordinal)
                .map(|(name, _)| name.clone())
                .ok_or_else(|| TopologyError::InvariantViolation(format!("no router at ordinal {}", ordinal)))
        };

        let mut chain = vec![target];
        let mut current = target;
        while current != source {
            current = search.prev[current].ok_or_else(|| {
                TopologyError::InvariantViolation(format!("broken predecessor chain at ordinal {}", current))
            })?;
            chain.push(current);
            if chain.len() > adjacency.len() {
                return Err(TopologyError::InvariantViolation(
                    "predecessor chain contains a cycle".to_string(),
                ));
            }
        }
        chain.reverse();

        let nodes = chain.into_iter().map(name_of).collect::<Result<Vec<_>>>()?;
        let hops = nodes
            .windows(2)
            .map(|pair| -> Result<Hop> {
                let weight = graph.weight(&pair[0], &pair[1]).ok_or_else(|| {
                    TopologyError::InvariantViolation(format!(
                        "path uses missing link {} - {}",
                        pair[0], pair[1]
                    ))
                })?;
                Ok(Hop {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                    weight,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PathResult {
            from: from.to_string(),
            to: to.to_string(),
            cost: PathCost::Reachable(search.dist[target]),
            nodes,
            hops,
        })
    }
}
