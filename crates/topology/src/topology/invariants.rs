//! Topological invariants - Rules the store must always satisfy
//!
//! A violation here never comes from bad caller input: `GraphStore` rejects
//! that up front. Violations mean the store was corrupted, e.g. by a
//! deserialized snapshot or a bug in the consistency guard.

use serde::{Deserialize, Serialize};

use super::graph::{GraphStore, MAX_WEIGHT};
use crate::{Result, TopologyError};

/// A violation of a topological invariant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantViolation {
    pub invariant_name: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub affected_routers: Vec<String>,
}

/// Severity levels for invariant violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    /// Harmless for path queries but should not be there
    Warning,
    /// Path queries may return wrong answers
    Error,
    /// Path queries may fail outright
    Critical,
}

/// Invariant checker for store validation
#[derive(Debug, Clone, Default)]
pub struct InvariantChecker {
    /// Upgrade warnings to errors
    strict_mode: bool,
}

impl InvariantChecker {
    pub fn new() -> Self {
        Self { strict_mode: false }
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Check all invariants against a store
    pub fn check_all(&self, graph: &GraphStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        violations.extend(self.check_no_dangling_links(graph));
        violations.extend(self.check_links_symmetric(graph));
        violations.extend(self.check_no_self_loops(graph));
        violations.extend(self.check_link_weight_validity(graph));

        if self.strict_mode {
            for v in &mut violations {
                if v.severity == ViolationSeverity::Warning {
                    v.severity = ViolationSeverity::Error;
                }
            }
        }

        violations
    }

    /// Fail with the most severe violation at `Error` level or above
    pub fn ensure_consistent(&self, graph: &GraphStore) -> Result<()> {
        match self
            .check_all(graph)
            .into_iter()
            .filter(|v| v.severity >= ViolationSeverity::Error)
            .max_by_key(|v| v.severity)
        {
            Some(violation) => Err(TopologyError::InvariantViolation(violation.message)),
            None => Ok(()),
        }
    }

    /// Every link endpoint must be a router in the store
    fn check_no_dangling_links(&self, graph: &GraphStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for (router, links) in graph.adjacency() {
            for neighbor in links.keys() {
                if !graph.contains(neighbor) {
                    violations.push(InvariantViolation {
                        invariant_name: "no_dangling_links".to_string(),
                        severity: ViolationSeverity::Critical,
                        message: format!(
                            "Link {} - {} references a router that does not exist",
                            router, neighbor
                        ),
                        affected_routers: vec![router.clone(), neighbor.clone()],
                    });
                }
            }
        }

        violations
    }

    /// Each link must be recorded under both endpoints with the same weight
    fn check_links_symmetric(&self, graph: &GraphStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for (router, links) in graph.adjacency() {
            for (neighbor, weight) in links {
                // Dangling links are reported separately
                if !graph.contains(neighbor) {
                    continue;
                }
                match graph.weight(neighbor, router) {
                    None => violations.push(InvariantViolation {
                        invariant_name: "symmetric_links".to_string(),
                        severity: ViolationSeverity::Error,
                        message: format!(
                            "Link {} - {} has no reverse entry",
                            router, neighbor
                        ),
                        affected_routers: vec![router.clone(), neighbor.clone()],
                    }),
                    // Compare each pair once
                    Some(reverse) if reverse != *weight && router < neighbor => {
                        violations.push(InvariantViolation {
                            invariant_name: "symmetric_links".to_string(),
                            severity: ViolationSeverity::Error,
                            message: format!(
                                "Link {} - {} weighs {} one way and {} the other",
                                router, neighbor, weight, reverse
                            ),
                            affected_routers: vec![router.clone(), neighbor.clone()],
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        violations
    }

    fn check_no_self_loops(&self, graph: &GraphStore) -> Vec<InvariantViolation> {
        graph
            .adjacency()
            .iter()
            .filter(|(router, links)| links.contains_key(router.as_str()))
            .map(|(router, _)| InvariantViolation {
                invariant_name: "no_self_loops".to_string(),
                severity: ViolationSeverity::Warning,
                message: format!("Router {} is linked to itself", router),
                affected_routers: vec![router.clone()],
            })
            .collect()
    }

    /// Weights must lie in `0.0..=MAX_WEIGHT` for Dijkstra to be correct
    fn check_link_weight_validity(&self, graph: &GraphStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for (router, links) in graph.adjacency() {
            for (neighbor, weight) in links {
                if !(0.0..=MAX_WEIGHT).contains(weight) {
                    violations.push(InvariantViolation {
                        invariant_name: "non_negative_link_weights".to_string(),
                        severity: ViolationSeverity::Error,
                        message: format!(
                            "Link {} - {} has invalid weight: {}",
                            router, neighbor, weight
                        ),
                        affected_routers: vec![router.clone(), neighbor.clone()],
                    });
                }
            }
        }

        violations
    }
}
