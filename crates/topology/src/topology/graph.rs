//! Graph model for the router network

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Result, TopologyError};

/// Largest accepted link weight. Path sums stay finite for any store that
/// fits in memory, so "unreachable" always means no path exists.
pub const MAX_WEIGHT: f64 = 1e15;

/// Outcome of a successful `add_or_update_link`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkChange {
    Created,
    Updated,
}

/// What `add_or_update_link` would do for a pair of routers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    WouldCreate,
    WouldUpdate,
}

/// The authoritative set of routers and weighted undirected links.
///
/// Stored as router -> (neighbor -> weight). Every link is recorded under both
/// endpoints with the same weight. Iteration follows insertion order, which
/// the path engine relies on for reproducible tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStore {
    adjacency: IndexMap<String, IndexMap<String, f64>>,
    version: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            adjacency: IndexMap::new(),
            version: 0,
        }
    }

    /// Add a router with no links
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.adjacency.contains_key(&name) {
            return Err(TopologyError::AlreadyExists(name));
        }

        self.adjacency.insert(name.clone(), IndexMap::new());
        self.bump();
        tracing::debug!(router = %name, version = self.version, "router added");
        Ok(())
    }

    /// Remove a router and every link touching it.
    ///
    /// Returns whether anything was removed; an absent router is not an error.
    pub fn remove_node(&mut self, name: &str) -> bool {
        let Some(neighbors) = self.adjacency.shift_remove(name) else {
            return false;
        };

        for neighbor in neighbors.keys() {
            if let Some(links) = self.adjacency.get_mut(neighbor) {
                links.shift_remove(name);
            }
        }
        self.bump();
        tracing::debug!(
            router = %name,
            dropped_links = neighbors.len(),
            version = self.version,
            "router removed"
        );
        true
    }

    /// Create a link between two routers, or overwrite the weight of an existing one
    pub fn add_or_update_link(&mut self, a: &str, b: &str, weight: f64) -> Result<LinkChange> {
        let change = match self.status_of_link(a, b)? {
            LinkStatus::WouldCreate => LinkChange::Created,
            LinkStatus::WouldUpdate => LinkChange::Updated,
        };
        Self::validate_weight(weight)?;

        // Both endpoints exist, checked by status_of_link
        if let Some(links) = self.adjacency.get_mut(a) {
            links.insert(b.to_string(), weight);
        }
        if let Some(links) = self.adjacency.get_mut(b) {
            links.insert(a.to_string(), weight);
        }
        self.bump();
        tracing::debug!(from = %a, to = %b, weight, ?change, version = self.version, "link set");
        Ok(change)
    }

    /// Remove the link between two routers.
    ///
    /// Returns whether a link was removed; missing routers or links are not errors.
    pub fn remove_link(&mut self, a: &str, b: &str) -> bool {
        if !self.adjacency.contains_key(a) || !self.adjacency.contains_key(b) {
            return false;
        }

        let mut removed = false;
        if let Some(links) = self.adjacency.get_mut(a) {
            removed |= links.shift_remove(b).is_some();
        }
        if let Some(links) = self.adjacency.get_mut(b) {
            removed |= links.shift_remove(a).is_some();
        }
        if removed {
            self.bump();
            tracing::debug!(from = %a, to = %b, version = self.version, "link removed");
        }
        removed
    }

    /// Link weights must lie in `0.0..=MAX_WEIGHT`
    pub fn validate_weight(weight: f64) -> Result<f64> {
        if (0.0..=MAX_WEIGHT).contains(&weight) {
            Ok(weight)
        } else {
            Err(TopologyError::InvalidWeight(weight))
        }
    }

    /// Preview what `add_or_update_link` would do
    pub fn status_of_link(&self, a: &str, b: &str) -> Result<LinkStatus> {
        let links = self
            .adjacency
            .get(a)
            .ok_or_else(|| TopologyError::UnknownNode(a.to_string()))?;
        if !self.adjacency.contains_key(b) {
            return Err(TopologyError::UnknownNode(b.to_string()));
        }
        if a == b {
            return Err(TopologyError::SelfLink(a.to_string()));
        }

        if links.contains_key(b) {
            Ok(LinkStatus::WouldUpdate)
        } else {
            Ok(LinkStatus::WouldCreate)
        }
    }

    /// Names of all routers, in insertion order
    pub fn list_nodes(&self) -> Vec<String> {
        self.adjacency.keys().cloned().collect()
    }

    /// Directly linked routers and the weight of each link
    pub fn neighbors_of(&self, name: &str) -> Result<&IndexMap<String, f64>> {
        self.adjacency
            .get(name)
            .ok_or_else(|| TopologyError::UnknownNode(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Weight of the link between two routers, if one exists
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        self.adjacency.get(a).and_then(|links| links.get(b)).copied()
    }

    /// Every undirected link exactly once, as (a, b, weight) with `a` added before `b`
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(move |(ordinal, (name, links))| {
                links.iter().filter_map(move |(neighbor, weight)| {
                    match self.adjacency.get_index_of(neighbor) {
                        Some(other) if other > ordinal => {
                            Some((name.as_str(), neighbor.as_str(), *weight))
                        }
                        _ => None,
                    }
                })
            })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn link_count(&self) -> usize {
        self.links().count()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of state-changing mutations applied so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Position of a router in insertion order
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.adjacency.get_index_of(name)
    }

    pub(crate) fn adjacency(&self) -> &IndexMap<String, IndexMap<String, f64>> {
        &self.adjacency
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(nodes: &[&str]) -> GraphStore {
        let mut store = GraphStore::new();
        for node in nodes {
            store.add_node(*node).unwrap();
        }
        store
    }

    #[test]
    fn test_add_node() {
        let mut store = GraphStore::new();
        store.add_node("A").unwrap();

        assert!(store.list_nodes().contains(&"A".to_string()));
        assert_eq!(
            store.add_node("A"),
            Err(TopologyError::AlreadyExists("A".to_string()))
        );
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let store = store_with(&["a", "A"]);
        assert_eq!(store.list_nodes(), vec!["a", "A"]);
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut store = store_with(&["A", "B"]);

        assert_eq!(store.add_or_update_link("A", "B", 4.5), Ok(LinkChange::Created));
        assert_eq!(store.neighbors_of("A").unwrap().get("B"), Some(&4.5));
        assert_eq!(store.neighbors_of("B").unwrap().get("A"), Some(&4.5));
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn test_relink_updates_weight() {
        let mut store = store_with(&["A", "B"]);
        store.add_or_update_link("A", "B", 1.0).unwrap();

        assert_eq!(store.add_or_update_link("B", "A", 9.0), Ok(LinkChange::Updated));
        assert_eq!(store.weight("A", "B"), Some(9.0));
        assert_eq!(store.weight("B", "A"), Some(9.0));
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn test_link_validation() {
        let mut store = store_with(&["A", "B"]);

        assert_eq!(
            store.add_or_update_link("A", "Z", 1.0),
            Err(TopologyError::UnknownNode("Z".to_string()))
        );
        assert_eq!(
            store.add_or_update_link("Y", "B", 1.0),
            Err(TopologyError::UnknownNode("Y".to_string()))
        );
        assert_eq!(
            store.add_or_update_link("A", "B", -1.0),
            Err(TopologyError::InvalidWeight(-1.0))
        );
        assert!(matches!(
            store.add_or_update_link("A", "B", f64::NAN),
            Err(TopologyError::InvalidWeight(_))
        ));
        assert_eq!(
            store.add_or_update_link("A", "A", 1.0),
            Err(TopologyError::SelfLink("A".to_string()))
        );
        assert_eq!(store.link_count(), 0);
    }

    #[test]
    fn test_zero_weight_is_allowed() {
        let mut store = store_with(&["A", "B"]);
        assert_eq!(store.add_or_update_link("A", "B", 0.0), Ok(LinkChange::Created));
    }

    #[test]
    fn test_weight_upper_bound() {
        let mut store = store_with(&["A", "B"]);

        assert_eq!(
            store.add_or_update_link("A", "B", MAX_WEIGHT),
            Ok(LinkChange::Created)
        );
        for weight in [MAX_WEIGHT * 2.0, f64::MAX, f64::INFINITY] {
            assert_eq!(
                store.add_or_update_link("A", "B", weight),
                Err(TopologyError::InvalidWeight(weight))
            );
        }
        assert_eq!(store.weight("A", "B"), Some(MAX_WEIGHT));
    }

    #[test]
    fn test_failed_mutation_keeps_version() {
        let mut store = store_with(&["A", "B"]);
        let version = store.version();

        let _ = store.add_node("A");
        let _ = store.add_or_update_link("A", "B", -3.0);
        let _ = store.add_or_update_link("A", "C", 3.0);
        assert!(!store.remove_node("C"));
        assert!(!store.remove_link("A", "B"));

        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut store = store_with(&["A", "B", "D"]);
        store.add_or_update_link("A", "D", 1.0).unwrap();
        store.add_or_update_link("B", "D", 2.0).unwrap();
        store.add_or_update_link("A", "B", 6.0).unwrap();

        assert!(store.remove_node("D"));
        assert!(!store.remove_node("D"));

        assert!(!store.list_nodes().contains(&"D".to_string()));
        assert!(!store.neighbors_of("A").unwrap().contains_key("D"));
        assert!(!store.neighbors_of("B").unwrap().contains_key("D"));
        assert!(store.links().all(|(a, b, _)| a != "D" && b != "D"));
        assert_eq!(
            store.add_or_update_link("A", "D", 1.0),
            Err(TopologyError::UnknownNode("D".to_string()))
        );
    }

    #[test]
    fn test_remove_link() {
        let mut store = store_with(&["A", "B", "C"]);
        store.add_or_update_link("A", "B", 1.0).unwrap();

        assert!(store.remove_link("B", "A"));
        assert!(store.neighbors_of("A").unwrap().is_empty());
        assert!(store.neighbors_of("B").unwrap().is_empty());

        // Absent link and absent router are both no-ops
        assert!(!store.remove_link("A", "B"));
        assert!(!store.remove_link("A", "Q"));
        assert!(!store.remove_link("A", "A"));
    }

    #[test]
    fn test_status_of_link() {
        let mut store = store_with(&["A", "B"]);

        assert_eq!(store.status_of_link("A", "B"), Ok(LinkStatus::WouldCreate));
        store.add_or_update_link("A", "B", 2.0).unwrap();
        assert_eq!(store.status_of_link("B", "A"), Ok(LinkStatus::WouldUpdate));
        assert_eq!(
            store.status_of_link("A", "C"),
            Err(TopologyError::UnknownNode("C".to_string()))
        );
    }

    #[test]
    fn test_neighbors_of_unknown() {
        let store = store_with(&["A"]);
        assert!(store.neighbors_of("A").unwrap().is_empty());
        assert_eq!(
            store.neighbors_of("B"),
            Err(TopologyError::UnknownNode("B".to_string()))
        );
    }

    #[test]
    fn test_links_listed_once_in_insertion_order() {
        let mut store = store_with(&["A", "B", "C"]);
        store.add_or_update_link("C", "A", 3.0).unwrap();
        store.add_or_update_link("B", "A", 1.0).unwrap();

        let links: Vec<_> = store.links().collect();
        assert_eq!(links, vec![("A", "C", 3.0), ("A", "B", 1.0)]);
    }

    #[test]
    fn test_ordinal_follows_insertion() {
        let mut store = store_with(&["X", "Y", "Z"]);
        assert_eq!(store.ordinal("Z"), Some(2));

        store.remove_node("X");
        assert_eq!(store.ordinal("Y"), Some(0));
        assert_eq!(store.ordinal("Z"), Some(1));
        assert_eq!(store.ordinal("X"), None);
    }
}
