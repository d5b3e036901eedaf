//! Dependency graph produced by reference resolution.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::Resource;

/// A read-only dependency graph over resolved resources.
///
/// An edge `from -> to` means `from` depends on `to`: `to` must be
/// provisioned first. Adjacency is kept in both directions, and every map
/// and set is ordered, so iteration never depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    /// Resolved resources, by id.
    resources: BTreeMap<String, Resource>,
    /// For each id, the ids it depends on.
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// For each id, the ids that depend on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Creates a graph with the given nodes and no edges.
    pub(crate) fn with_nodes(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut graph = Self::default();
        for resource in resources {
            graph.dependencies.insert(resource.id.clone(), BTreeSet::new());
            graph.dependents.insert(resource.id.clone(), BTreeSet::new());
            graph.resources.insert(resource.id.clone(), resource);
        }
        graph
    }

    /// Adds a `from` depends-on `to` edge. Both nodes must already exist.
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) {
        if let Some(deps) = self.dependencies.get_mut(from) {
            deps.insert(to.to_string());
        }
        if let Some(deps) = self.dependents.get_mut(to) {
            deps.insert(from.to_string());
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Node ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Returns true if the node exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Returns the resolved resource for a node.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Ids the node depends on, sorted.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(id)
    }

    /// Ids that depend on the node, sorted.
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.dependents.get(id)
    }

    /// All edges as `(from, to)` pairs, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.dependencies
            .iter()
            .flat_map(|(from, deps)| deps.iter().map(move |to| (from.as_str(), to.as_str())))
            .collect()
    }

    /// The depends-on adjacency, used by the planner.
    pub(crate) const fn dependency_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.dependencies
    }

    /// The reversed adjacency, used by the planner for teardown.
    pub(crate) const fn dependent_map(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::with_nodes(
            ["a", "b", "c"].map(|id| Resource::new(id, ResourceKind::Cluster)),
        );
        graph.add_edge("b", "a");
        graph.add_edge("c", "a");
        graph.add_edge("c", "a");
        graph
    }

    #[test]
    fn test_edges_are_deduplicated() {
        let graph = graph();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges(), vec![("b", "a"), ("c", "a")]);
    }

    #[test]
    fn test_both_directions_tracked() {
        let graph = graph();
        let dependents: Vec<&String> = graph.dependents_of("a").unwrap().iter().collect();
        assert_eq!(dependents, vec!["b", "c"]);
        assert!(graph.dependencies_of("a").unwrap().is_empty());
        assert!(graph.dependencies_of("zzz").is_none());
    }
}
