//! Resource registry - the insertion-ordered store of declared resources
//!
//! The registry is the single source of truth during reference resolution
//! and the sole owner of every node for the lifetime of the process.
//! Registration is the only mutation path; registration order is preserved
//! and serves as the deterministic tie-break for every ordering computed
//! downstream.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::resource::{ResourceId, ResourceNode, ResourceSpec};

/// Insertion-ordered store of resource nodes keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Vec<ResourceNode>,
    index: HashMap<ResourceId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, failing if the identifier is already taken
    pub fn register(&mut self, node: ResourceNode) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(Error::DuplicateIdentifier(node.id.clone()));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Look up a node by identifier
    pub fn get(&self, id: &ResourceId) -> Result<&ResourceNode> {
        self.index
            .get(id)
            .map(|&pos| &self.nodes[pos])
            .ok_or_else(|| Error::UnknownResource(id.clone()))
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    /// Registration position of `id`; the global ordering tie-break
    pub fn position(&self, id: &ResourceId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All nodes in registration order. The iterator is lazy and
    /// restartable: call again for a fresh pass.
    pub fn all(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter()
    }

    /// Health checks monitoring `target`, in registration order
    pub fn checks_monitoring<'a>(
        &'a self,
        target: &'a ResourceId,
    ) -> impl Iterator<Item = &'a ResourceNode> {
        self.nodes.iter().filter(move |node| match &node.spec {
            ResourceSpec::HealthCheck(check) => &check.monitors == target,
            _ => false,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ComputeClusterSpec, HealthCheckSpec, NetworkSpec, ProbeProtocol};

    fn network(id: &str) -> ResourceNode {
        ResourceNode::new(
            id,
            ResourceSpec::Network(NetworkSpec {
                domain: "test.internal".into(),
                max_zones: 2,
            }),
        )
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new();
        registry.register(network("net-a")).unwrap();

        let node = registry.get(&ResourceId::from("net-a")).unwrap();
        assert_eq!(node.id.as_str(), "net-a");
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut registry = Registry::new();
        registry.register(network("net-a")).unwrap();

        let err = registry.register(network("net-a")).unwrap_err();
        assert_eq!(err, Error::DuplicateIdentifier(ResourceId::from("net-a")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_unknown_resource() {
        let registry = Registry::new();
        let err = registry.get(&ResourceId::from("missing")).unwrap_err();
        assert_eq!(err, Error::UnknownResource(ResourceId::from("missing")));
    }

    #[test]
    fn test_all_preserves_registration_order_and_restarts() {
        let mut registry = Registry::new();
        for id in ["c", "a", "b"] {
            registry.register(network(id)).unwrap();
        }

        let first: Vec<&str> = registry.all().map(|n| n.id.as_str()).collect();
        let second: Vec<&str> = registry.all().map(|n| n.id.as_str()).collect();
        assert_eq!(first, vec!["c", "a", "b"]);
        assert_eq!(first, second);
        assert_eq!(registry.position(&ResourceId::from("a")), Some(1));
    }

    #[test]
    fn test_checks_monitoring_filters_by_target() {
        let mut registry = Registry::new();
        registry.register(network("db"))
            .unwrap();
        registry
            .register(ResourceNode::new(
                "cluster",
                ResourceSpec::ComputeCluster(ComputeClusterSpec {
                    namespace: "svc.local".into(),
                }),
            ))
            .unwrap();
        registry
            .register(ResourceNode::new(
                "db-probe",
                ResourceSpec::HealthCheck(HealthCheckSpec {
                    monitors: ResourceId::from("db"),
                    protocol: ProbeProtocol::Tcp,
                    interval_secs: 30,
                    failure_threshold: 3,
                }),
            ))
            .unwrap();

        let target = ResourceId::from("db");
        let checks: Vec<&str> = registry
            .checks_monitoring(&target)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(checks, vec!["db-probe"]);

        let other = ResourceId::from("cluster");
        assert_eq!(registry.checks_monitoring(&other).count(), 0);
    }
}
