//! Configuration for the topology core

use serde::{Deserialize, Serialize};

/// How the path engine picks the next router to settle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Min-heap keyed by tentative distance, O((V+E) log V)
    #[default]
    BinaryHeap,
    /// Scan every unsettled router on each step, O(V²).
    /// Only sensible for networks of a few dozen routers.
    LinearScan,
}

impl SelectionStrategy {
    /// Parse the short names accepted in environment variables
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heap" | "binary_heap" | "binaryheap" => Some(Self::BinaryHeap),
            "linear" | "linear_scan" | "linearscan" => Some(Self::LinearScan),
            _ => None,
        }
    }
}

/// Core configuration for the topology store and engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TopologyConfig {
    /// Selection structure used by shortest-path queries
    #[serde(default)]
    pub selection: SelectionStrategy,
}

impl TopologyConfig {
    /// Create a minimal configuration
    pub fn minimal() -> Self {
        Self {
            selection: SelectionStrategy::LinearScan,
        }
    }

    pub fn with_selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_heap() {
        assert_eq!(TopologyConfig::default().selection, SelectionStrategy::BinaryHeap);
        assert_eq!(TopologyConfig::minimal().selection, SelectionStrategy::LinearScan);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(SelectionStrategy::parse("heap"), Some(SelectionStrategy::BinaryHeap));
        assert_eq!(SelectionStrategy::parse(" Linear "), Some(SelectionStrategy::LinearScan));
        assert_eq!(SelectionStrategy::parse("linear_scan"), Some(SelectionStrategy::LinearScan));
        assert_eq!(SelectionStrategy::parse("bfs"), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: TopologyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TopologyConfig::default());

        let config: TopologyConfig =
            serde_json::from_str(r#"{"selection":"linear_scan"}"#).unwrap();
        assert_eq!(config.selection, SelectionStrategy::LinearScan);
    }
}
