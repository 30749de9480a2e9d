//! # Topology
//!
//! Core model for planning a multi-service deployment topology.
//!
//! This crate turns a declarative description of infrastructure resources
//! and their dependencies into:
//!
//! - a validated, acyclic dependency graph with a deterministic
//!   topological order,
//! - a resolved environment per deployable service (addresses, ports,
//!   credential references derived from the things the service depends on),
//! - a staged provisioning plan with health-gated readiness, where every
//!   stage is safe to dispatch concurrently.
//!
//! It performs no I/O: declarations arrive from an external loader, health
//! status arrives from an external prober, and the emitted plan is handed
//! to an external executor.
//!
//! ## Example
//!
//! ```
//! use topology::{
//!     DatabaseSpec, DependencyGraph, EdgeStrength, HealthGate, NetworkSpec, Registry,
//!     ResourceId, ResourceNode, ResourceSpec, ServiceSpec,
//! };
//!
//! let mut registry = Registry::new();
//! registry.register(ResourceNode::new(
//!     "net",
//!     ResourceSpec::Network(NetworkSpec { domain: "deploy.internal".into(), max_zones: 2 }),
//! ))?;
//! registry.register(ResourceNode::new(
//!     "orders-db",
//!     ResourceSpec::Database(DatabaseSpec {
//!         engine: "postgres".into(),
//!         version: "17.2".into(),
//!         storage_gb: 20,
//!         credential: "admin_user".into(),
//!         host: None,
//!         port: None,
//!     }),
//! ))?;
//! registry.register(ResourceNode::new(
//!     "orders",
//!     ResourceSpec::Service(ServiceSpec {
//!         image: "orders".into(),
//!         ports: vec![4000],
//!         cpu: 256,
//!         memory_mib: 512,
//!         env: Default::default(),
//!         log_group: None,
//!         log_retention_days: 1,
//!         public: false,
//!     }),
//! ))?;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_edge(&registry, "orders-db", "net", EdgeStrength::Hard)?;
//! graph.add_edge(&registry, "orders", "orders-db", EdgeStrength::Hard)?;
//! graph.finalize_and_validate(&registry)?;
//!
//! let gate = HealthGate::from_registry(&registry);
//! let plan = topology::plan(&registry, &graph, &gate)?;
//!
//! assert_eq!(plan.stages.len(), 3);
//! let env = &plan.service_env[&ResourceId::from("orders")];
//! assert_eq!(env.get("DATABASE_ADDRESS"), Some("orders-db.deploy.internal"));
//! # Ok::<(), topology::Error>(())
//! ```

pub mod error;
pub mod graph;
pub mod health;
pub mod planner;
pub mod registry;
pub mod resolver;
pub mod resource;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use graph::{DependencyEdge, DependencyGraph, EdgeStrength};
pub use health::{HealthGate, HealthSnapshot, HealthStatus, ProbeOutcome};
pub use planner::{plan, ProvisioningPlan, Stage, StageGate};
pub use registry::Registry;
pub use resolver::{resolve, ResolvedConfiguration};
pub use resource::{
    ComputeClusterSpec, DatabaseSpec, HealthCheckSpec, MessageClusterSpec, NetworkSpec,
    ProbeProtocol, ResourceId, ResourceKind, ResourceNode, ResourceSpec, ServiceSpec,
};
