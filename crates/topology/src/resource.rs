//! Resource model - identifiers, kinds, and kind-specific attributes
//!
//! A resource is a tagged variant: an identifier plus a kind-specific
//! attribute record. Derived connection values (addresses, ports,
//! credential references) are computed by the resolver, never stored here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a declared resource, unique within a topology
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind tag of a resource node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Database,
    MessageCluster,
    ComputeCluster,
    HealthCheck,
    Service,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Database => "database",
            Self::MessageCluster => "message_cluster",
            Self::ComputeCluster => "compute_cluster",
            Self::HealthCheck => "health_check",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Virtual network carrying the internal traffic between resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Internal DNS suffix; reachable addresses are derived as `<id>.<domain>`
    pub domain: String,
    /// Availability zones the network spans
    pub max_zones: u8,
}

/// Relational database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub engine: String,
    pub version: String,
    pub storage_gb: u32,
    /// Username whose secret is generated out-of-band; dependents receive a
    /// credential reference, never the secret itself
    pub credential: String,
    /// Explicit endpoint host; when absent the address facet is derived from
    /// the database's hard network dependency
    pub host: Option<String>,
    /// Explicit endpoint port; when absent the engine's default port is used
    pub port: Option<u16>,
}

/// Message-streaming cluster (Kafka-style broker group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageClusterSpec {
    pub version: String,
    /// Bootstrap endpoints handed to dependents
    pub brokers: Vec<String>,
    /// Broker sizing hint, opaque to the planner
    pub broker_instance: Option<String>,
}

/// Compute cluster that hosts deployable services; structural only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeClusterSpec {
    /// Service-discovery namespace for services placed on the cluster
    pub namespace: String,
}

/// Probe protocol used by a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeProtocol {
    Tcp,
    Http,
}

/// Asynchronous health probe attached to another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    /// Resource whose readiness this check reports on
    pub monitors: ResourceId,
    pub protocol: ProbeProtocol,
    pub interval_secs: u32,
    /// Consecutive probe failures after which the check is terminally failed
    pub failure_threshold: u32,
}

/// Deployable service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Container image reference
    pub image: String,
    pub ports: Vec<u16>,
    pub cpu: u32,
    pub memory_mib: u32,
    /// Literal environment entries; these always override derived entries
    pub env: BTreeMap<String, String>,
    /// Log destination; defaults to a group named after the image
    pub log_group: Option<String>,
    pub log_retention_days: u32,
    /// Whether the service is exposed outside the network
    pub public: bool,
}

/// Kind-specific attribute record of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSpec {
    Network(NetworkSpec),
    Database(DatabaseSpec),
    MessageCluster(MessageClusterSpec),
    ComputeCluster(ComputeClusterSpec),
    HealthCheck(HealthCheckSpec),
    Service(ServiceSpec),
}

/// A declared resource: identifier plus kind-specific attributes.
///
/// Created once at declaration time and owned by the [`crate::Registry`]
/// for its entire lifetime; attributes are immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: ResourceId,
    pub spec: ResourceSpec,
}

impl ResourceNode {
    pub fn new(id: impl Into<ResourceId>, spec: ResourceSpec) -> Self {
        Self {
            id: id.into(),
            spec,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self.spec {
            ResourceSpec::Network(_) => ResourceKind::Network,
            ResourceSpec::Database(_) => ResourceKind::Database,
            ResourceSpec::MessageCluster(_) => ResourceKind::MessageCluster,
            ResourceSpec::ComputeCluster(_) => ResourceKind::ComputeCluster,
            ResourceSpec::HealthCheck(_) => ResourceKind::HealthCheck,
            ResourceSpec::Service(_) => ResourceKind::Service,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceSpec> {
        match &self.spec {
            ResourceSpec::Service(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_health_check(&self) -> Option<&HealthCheckSpec> {
        match &self.spec {
            ResourceSpec::HealthCheck(spec) => Some(spec),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_matches_spec_variant() {
        let node = ResourceNode::new(
            "core-net",
            ResourceSpec::Network(NetworkSpec {
                domain: "deploy.internal".into(),
                max_zones: 2,
            }),
        );
        assert_eq!(node.kind(), ResourceKind::Network);
        assert_eq!(node.kind().to_string(), "network");
    }

    #[test]
    fn test_accessors_are_kind_checked() {
        let node = ResourceNode::new(
            "probe",
            ResourceSpec::HealthCheck(HealthCheckSpec {
                monitors: ResourceId::from("db"),
                protocol: ProbeProtocol::Tcp,
                interval_secs: 30,
                failure_threshold: 3,
            }),
        );
        assert!(node.as_health_check().is_some());
        assert!(node.as_service().is_none());
    }
}
