//! Dependency graph - edge declarations, cycle detection, topological order
//!
//! Edges point from a dependent to its dependency. The graph is validated
//! eagerly: `finalize_and_validate` runs cycle detection once and caches a
//! deterministic topological order; after that the edge set is immutable.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::resource::ResourceId;

/// How strongly a dependent is bound to its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrength {
    /// Dependency must exist and, if monitored, be healthy before the
    /// dependent starts
    Hard,
    /// Ordering only; no readiness gating
    Soft,
}

/// Directed edge: `from` depends on `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ResourceId,
    pub to: ResourceId,
    pub strength: EdgeStrength,
}

/// DFS coloring for cycle detection
#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// The set of registered identifiers plus the declared edges over them
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    finalized: bool,
    topo: Vec<ResourceId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an edge. Both endpoints must already be registered; the
    /// graph must not be finalized yet.
    pub fn add_edge(
        &mut self,
        registry: &Registry,
        from: impl Into<ResourceId>,
        to: impl Into<ResourceId>,
        strength: EdgeStrength,
    ) -> Result<()> {
        if self.finalized {
            return Err(Error::GraphFinalized);
        }
        let from = from.into();
        let to = to.into();
        if !registry.contains(&from) {
            return Err(Error::UnknownResource(from));
        }
        if !registry.contains(&to) {
            return Err(Error::UnknownResource(to));
        }
        self.edges.push(DependencyEdge { from, to, strength });
        Ok(())
    }

    /// All declared edges in declaration order
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Edges whose dependent is `id`, in declaration order
    pub fn dependencies_of<'a>(
        &'a self,
        id: &'a ResourceId,
    ) -> impl Iterator<Item = &'a DependencyEdge> {
        self.edges.iter().filter(move |edge| &edge.from == id)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Validate acyclicity and cache the topological order.
    ///
    /// Cycle detection is eager DFS coloring; the reported cycle is the
    /// first back edge found, listed in cycle order. The cached order
    /// respects every hard and soft edge and breaks ties by registration
    /// order, so repeated finalization of the same declarations always
    /// yields the same order.
    pub fn finalize_and_validate(&mut self, registry: &Registry) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.detect_cycle(registry)?;
        self.topo = self.compute_order(registry);
        self.finalized = true;
        Ok(())
    }

    /// The cached topological order: every dependency precedes its dependents
    pub fn topological_order(&self) -> Result<&[ResourceId]> {
        if !self.finalized {
            return Err(Error::GraphNotFinalized);
        }
        Ok(&self.topo)
    }

    fn detect_cycle(&self, registry: &Registry) -> Result<()> {
        let ids: Vec<&ResourceId> = registry.all().map(|node| &node.id).collect();
        let adjacency = self.adjacency(registry);
        let mut colors = vec![Color::White; ids.len()];
        let mut stack: Vec<usize> = Vec::new();

        for start in 0..ids.len() {
            if colors[start] != Color::White {
                continue;
            }
            if let Some(cycle) = Self::visit(start, &adjacency, &mut colors, &mut stack) {
                return Err(Error::CyclicDependency(
                    cycle.into_iter().map(|pos| ids[pos].clone()).collect(),
                ));
            }
        }
        Ok(())
    }

    fn visit(
        node: usize,
        adjacency: &[Vec<usize>],
        colors: &mut [Color],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        colors[node] = Color::Gray;
        stack.push(node);

        for &dep in &adjacency[node] {
            match colors[dep] {
                Color::Gray => {
                    // Back edge: the minimal cycle is the stack suffix
                    // starting at the revisited node.
                    let start = stack.iter().position(|&n| n == dep).unwrap_or(0);
                    return Some(stack[start..].to_vec());
                }
                Color::White => {
                    if let Some(cycle) = Self::visit(dep, adjacency, colors, stack) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        stack.pop();
        colors[node] = Color::Black;
        None
    }

    /// Kahn's algorithm with a min-heap on registration position, so nodes
    /// with no relative constraint come out in registration order.
    fn compute_order(&self, registry: &Registry) -> Vec<ResourceId> {
        let ids: Vec<&ResourceId> = registry.all().map(|node| &node.id).collect();
        let mut remaining = vec![0usize; ids.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];

        for edge in &self.edges {
            let (Some(from), Some(to)) =
                (registry.position(&edge.from), registry.position(&edge.to))
            else {
                continue;
            };
            remaining[from] += 1;
            dependents[to].push(from);
        }

        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(pos, _)| Reverse(pos))
            .collect();

        let mut order = Vec::with_capacity(ids.len());
        while let Some(Reverse(pos)) = ready.pop() {
            order.push(ids[pos].clone());
            for &dependent in &dependents[pos] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
        order
    }

    fn adjacency(&self, registry: &Registry) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); registry.len()];
        for edge in &self.edges {
            let (Some(from), Some(to)) =
                (registry.position(&edge.from), registry.position(&edge.to))
            else {
                continue;
            };
            adjacency[from].push(to);
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{NetworkSpec, ResourceNode, ResourceSpec};

    fn registry_of(ids: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for id in ids {
            registry
                .register(ResourceNode::new(
                    *id,
                    ResourceSpec::Network(NetworkSpec {
                        domain: "test.internal".into(),
                        max_zones: 2,
                    }),
                ))
                .unwrap();
        }
        registry
    }

    fn order_of(graph: &DependencyGraph) -> Vec<&str> {
        graph
            .topological_order()
            .unwrap()
            .iter()
            .map(ResourceId::as_str)
            .collect()
    }

    #[test]
    fn test_add_edge_rejects_unknown_endpoints() {
        let registry = registry_of(&["a"]);
        let mut graph = DependencyGraph::new();

        let err = graph
            .add_edge(&registry, "a", "ghost", EdgeStrength::Hard)
            .unwrap_err();
        assert_eq!(err, Error::UnknownResource(ResourceId::from("ghost")));

        let err = graph
            .add_edge(&registry, "ghost", "a", EdgeStrength::Hard)
            .unwrap_err();
        assert_eq!(err, Error::UnknownResource(ResourceId::from("ghost")));
    }

    #[test]
    fn test_order_requires_finalization() {
        let graph = DependencyGraph::new();
        assert_eq!(graph.topological_order().unwrap_err(), Error::GraphNotFinalized);
    }

    #[test]
    fn test_finalized_graph_is_immutable() {
        let registry = registry_of(&["a", "b"]);
        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "a", "b", EdgeStrength::Hard)
            .unwrap();
        graph.finalize_and_validate(&registry).unwrap();

        let err = graph
            .add_edge(&registry, "b", "a", EdgeStrength::Soft)
            .unwrap_err();
        assert_eq!(err, Error::GraphFinalized);
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let registry = registry_of(&["svc", "db", "net"]);
        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "svc", "db", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "db", "net", EdgeStrength::Hard)
            .unwrap();
        graph.finalize_and_validate(&registry).unwrap();

        assert_eq!(order_of(&graph), vec!["net", "db", "svc"]);
    }

    #[test]
    fn test_soft_edges_constrain_order() {
        let registry = registry_of(&["a", "b"]);
        let mut graph = DependencyGraph::new();
        // a registered first, but softly depends on b.
        graph
            .add_edge(&registry, "a", "b", EdgeStrength::Soft)
            .unwrap();
        graph.finalize_and_validate(&registry).unwrap();

        assert_eq!(order_of(&graph), vec!["b", "a"]);
    }

    #[test]
    fn test_unconstrained_nodes_keep_registration_order() {
        let registry = registry_of(&["gamma", "alpha", "beta"]);
        let mut graph = DependencyGraph::new();
        graph.finalize_and_validate(&registry).unwrap();

        assert_eq!(order_of(&graph), vec!["gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_order_is_deterministic_across_rebuilds() {
        let build = || {
            let registry = registry_of(&["e", "d", "c", "b", "a"]);
            let mut graph = DependencyGraph::new();
            graph
                .add_edge(&registry, "a", "c", EdgeStrength::Hard)
                .unwrap();
            graph
                .add_edge(&registry, "b", "c", EdgeStrength::Soft)
                .unwrap();
            graph.finalize_and_validate(&registry).unwrap();
            graph
                .topological_order()
                .unwrap()
                .iter()
                .map(|id| id.as_str().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn test_cycle_reported_in_cycle_order() {
        let registry = registry_of(&["a", "b", "c"]);
        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "a", "b", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "b", "c", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "c", "a", EdgeStrength::Hard)
            .unwrap();

        let err = graph.finalize_and_validate(&registry).unwrap_err();
        match err {
            Error::CyclicDependency(cycle) => {
                let ids: Vec<&str> = cycle.iter().map(ResourceId::as_str).collect();
                assert_eq!(ids, vec!["a", "b", "c"]);
            }
            other => panic!("expected CyclicDependency, got: {other:?}"),
        }
        assert!(!graph.is_finalized());
    }

    #[test]
    fn test_minimal_cycle_excludes_lead_in_path() {
        // d -> a -> b -> a: the cycle is [a, b], not [d, a, b].
        let registry = registry_of(&["d", "a", "b"]);
        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "d", "a", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "a", "b", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "b", "a", EdgeStrength::Hard)
            .unwrap();

        let err = graph.finalize_and_validate(&registry).unwrap_err();
        match err {
            Error::CyclicDependency(cycle) => {
                let ids: Vec<&str> = cycle.iter().map(ResourceId::as_str).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn test_self_edge_is_a_cycle() {
        let registry = registry_of(&["a"]);
        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "a", "a", EdgeStrength::Soft)
            .unwrap();

        let err = graph.finalize_and_validate(&registry).unwrap_err();
        assert_eq!(err, Error::CyclicDependency(vec![ResourceId::from("a")]));
    }
}
