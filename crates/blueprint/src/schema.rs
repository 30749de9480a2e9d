//! Blueprint schema - serde types for the TOML declaration format
//!
//! Each resource kind is an array of tables keyed by `id`, plus
//! `[[dependency]]` entries for explicit edges. Declaration order is
//! meaningful: resources register kind-major (networks, databases, message
//! clusters, compute clusters, health checks, services), in file order
//! within each kind, and that order is the tie-break for every plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use topology::{
    ComputeClusterSpec, DatabaseSpec, EdgeStrength, HealthCheckSpec, MessageClusterSpec,
    NetworkSpec, ProbeProtocol, ResourceId, ResourceNode, ResourceSpec, ServiceSpec,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDecl {
    pub id: String,
    /// Internal DNS suffix for derived addresses
    pub domain: String,
    #[serde(default = "default_max_zones")]
    pub max_zones: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDecl {
    pub id: String,
    #[serde(default = "default_engine")]
    pub engine: String,
    pub version: String,
    #[serde(default = "default_storage_gb")]
    pub storage_gb: u32,
    /// Username for the generated credential
    #[serde(default = "default_credential")]
    pub credential: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageClusterDecl {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub broker_instance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeClusterDecl {
    pub id: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckDecl {
    pub id: String,
    /// Resource this check probes
    pub monitors: String,
    #[serde(default = "default_protocol")]
    pub protocol: ProbeProtocol,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u32,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    #[serde(default = "default_memory_mib")]
    pub memory_mib: u32,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub log_group: Option<String>,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyDecl {
    pub from: String,
    pub to: String,
    #[serde(default = "default_strength")]
    pub strength: EdgeStrength,
}

fn default_max_zones() -> u8 {
    2
}

fn default_engine() -> String {
    "postgres".to_string()
}

fn default_storage_gb() -> u32 {
    20
}

fn default_credential() -> String {
    "admin_user".to_string()
}

fn default_protocol() -> ProbeProtocol {
    ProbeProtocol::Tcp
}

fn default_interval_secs() -> u32 {
    30
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cpu() -> u32 {
    256
}

fn default_memory_mib() -> u32 {
    512
}

fn default_log_retention_days() -> u32 {
    1
}

fn default_strength() -> EdgeStrength {
    EdgeStrength::Hard
}

impl NetworkDecl {
    pub fn into_node(self) -> ResourceNode {
        ResourceNode::new(
            self.id,
            ResourceSpec::Network(NetworkSpec {
                domain: self.domain,
                max_zones: self.max_zones,
            }),
        )
    }
}

impl DatabaseDecl {
    pub fn into_node(self) -> ResourceNode {
        ResourceNode::new(
            self.id,
            ResourceSpec::Database(DatabaseSpec {
                engine: self.engine,
                version: self.version,
                storage_gb: self.storage_gb,
                credential: self.credential,
                host: self.host,
                port: self.port,
            }),
        )
    }
}

impl MessageClusterDecl {
    pub fn into_node(self) -> ResourceNode {
        ResourceNode::new(
            self.id,
            ResourceSpec::MessageCluster(MessageClusterSpec {
                version: self.version,
                brokers: self.brokers,
                broker_instance: self.broker_instance,
            }),
        )
    }
}

impl ComputeClusterDecl {
    pub fn into_node(self) -> ResourceNode {
        ResourceNode::new(
            self.id,
            ResourceSpec::ComputeCluster(ComputeClusterSpec {
                namespace: self.namespace,
            }),
        )
    }
}

impl HealthCheckDecl {
    pub fn into_node(self) -> ResourceNode {
        ResourceNode::new(
            self.id,
            ResourceSpec::HealthCheck(HealthCheckSpec {
                monitors: ResourceId::from(self.monitors),
                protocol: self.protocol,
                interval_secs: self.interval_secs,
                failure_threshold: self.failure_threshold,
            }),
        )
    }
}

impl ServiceDecl {
    pub fn into_node(self) -> ResourceNode {
        // Log destination defaults to a group named after the image.
        let log_group = self
            .log_group
            .unwrap_or_else(|| format!("/deploy/{}", self.image));
        ResourceNode::new(
            self.id,
            ResourceSpec::Service(ServiceSpec {
                image: self.image,
                ports: self.ports,
                cpu: self.cpu,
                memory_mib: self.memory_mib,
                env: self.env,
                log_group: Some(log_group),
                log_retention_days: self.log_retention_days,
                public: self.public,
            }),
        )
    }
}
