//! # Blueprint
//!
//! Loading and validation of stagehand topology declarations.
//!
//! A blueprint is a TOML document declaring the resources of a deployment
//! topology and the dependency edges between them. Building a blueprint
//! yields a populated [`topology::Registry`] and a finalized
//! [`topology::DependencyGraph`], ready for resolution and planning.
//!
//! ## Example
//!
//! ```
//! let blueprint = blueprint::Blueprint::from_str(r#"
//!     [[network]]
//!     id = "backbone"
//!     domain = "deploy.internal"
//!
//!     [[database]]
//!     id = "orders-db"
//!     version = "17.2"
//!
//!     [[service]]
//!     id = "orders"
//!     image = "orders"
//!     ports = [4000]
//!
//!     [[dependency]]
//!     from = "orders-db"
//!     to = "backbone"
//!
//!     [[dependency]]
//!     from = "orders"
//!     to = "orders-db"
//! "#)?;
//!
//! let (registry, graph) = blueprint.build()?;
//! assert_eq!(registry.len(), 3);
//! assert!(graph.is_finalized());
//! # Ok::<(), blueprint::Error>(())
//! ```

mod error;
pub mod schema;

pub use error::{Error, Result};
pub use schema::{
    ComputeClusterDecl, DatabaseDecl, DependencyDecl, HealthCheckDecl, MessageClusterDecl,
    NetworkDecl, ServiceDecl,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use topology::{DependencyGraph, EdgeStrength, HealthGate, ProbeOutcome, Registry, ResourceId};

/// A parsed topology declaration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub network: Vec<NetworkDecl>,
    #[serde(default)]
    pub database: Vec<DatabaseDecl>,
    #[serde(default)]
    pub message_cluster: Vec<MessageClusterDecl>,
    #[serde(default)]
    pub compute_cluster: Vec<ComputeClusterDecl>,
    #[serde(default)]
    pub health_check: Vec<HealthCheckDecl>,
    #[serde(default)]
    pub service: Vec<ServiceDecl>,
    #[serde(default)]
    pub dependency: Vec<DependencyDecl>,
}

impl Blueprint {
    /// Load a blueprint from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a blueprint from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let blueprint: Self = toml::from_str(content)?;
        blueprint.validate()?;
        Ok(blueprint)
    }

    /// Declaration-level validation: identifier shape and check targets.
    ///
    /// Reference-level problems (duplicates, dangling edges, cycles) are
    /// the topology core's job and surface from [`Blueprint::build`].
    pub fn validate(&self) -> Result<()> {
        for id in self.declared_ids() {
            if !valid_id(id) {
                return Err(Error::Validation(format!(
                    "invalid identifier '{id}': expected lowercase kebab-case"
                )));
            }
        }
        for check in &self.health_check {
            if self.health_check.iter().any(|other| other.id == check.monitors) {
                return Err(Error::Validation(format!(
                    "health check '{}' monitors another health check '{}'",
                    check.id, check.monitors
                )));
            }
        }
        Ok(())
    }

    /// Build the registry and the finalized dependency graph.
    ///
    /// Resources register kind-major in declaration order. Every health
    /// check contributes an implicit hard edge to the resource it monitors;
    /// explicit `[[dependency]]` edges follow in declaration order.
    pub fn build(&self) -> Result<(Registry, DependencyGraph)> {
        let mut registry = Registry::new();
        for decl in &self.network {
            registry.register(decl.clone().into_node())?;
        }
        for decl in &self.database {
            registry.register(decl.clone().into_node())?;
        }
        for decl in &self.message_cluster {
            registry.register(decl.clone().into_node())?;
        }
        for decl in &self.compute_cluster {
            registry.register(decl.clone().into_node())?;
        }
        for decl in &self.health_check {
            registry.register(decl.clone().into_node())?;
        }
        for decl in &self.service {
            registry.register(decl.clone().into_node())?;
        }

        let mut graph = DependencyGraph::new();
        for check in &self.health_check {
            graph.add_edge(
                &registry,
                check.id.as_str(),
                check.monitors.as_str(),
                EdgeStrength::Hard,
            )?;
        }
        for dep in &self.dependency {
            graph.add_edge(&registry, dep.from.as_str(), dep.to.as_str(), dep.strength)?;
        }
        graph.finalize_and_validate(&registry)?;

        Ok((registry, graph))
    }

    fn declared_ids(&self) -> impl Iterator<Item = &str> {
        self.network
            .iter()
            .map(|decl| decl.id.as_str())
            .chain(self.database.iter().map(|decl| decl.id.as_str()))
            .chain(self.message_cluster.iter().map(|decl| decl.id.as_str()))
            .chain(self.compute_cluster.iter().map(|decl| decl.id.as_str()))
            .chain(self.health_check.iter().map(|decl| decl.id.as_str()))
            .chain(self.service.iter().map(|decl| decl.id.as_str()))
    }
}

fn valid_id(id: &str) -> bool {
    static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
    ID_PATTERN
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("identifier pattern is valid"))
        .is_match(id)
}

// ============================================================================
// Health reports
// ============================================================================

/// Probe outcomes reported for one health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeDecl {
    pub check: String,
    #[serde(default)]
    pub outcomes: Vec<ProbeOutcome>,
}

/// External probe results, replayed into a [`HealthGate`].
///
/// This is the file-based stand-in for the external prober collaborator:
/// the core never originates health data itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub probe: Vec<ProbeDecl>,
}

impl HealthReport {
    /// Load a health report from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a health report from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replay every recorded outcome into the gate, in report order
    pub fn apply(&self, gate: &mut HealthGate) -> Result<()> {
        for probe in &self.probe {
            let check = ResourceId::from(probe.check.as_str());
            for &outcome in &probe.outcomes {
                gate.observe(&check, outcome)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::HealthStatus;

    const MINIMAL: &str = r#"
        [[network]]
        id = "backbone"
        domain = "deploy.internal"

        [[database]]
        id = "orders-db"
        version = "17.2"

        [[health_check]]
        id = "orders-db-probe"
        monitors = "orders-db"

        [[service]]
        id = "orders"
        image = "orders"
        ports = [4000]
        env = { PORT = "4000" }

        [[dependency]]
        from = "orders-db"
        to = "backbone"

        [[dependency]]
        from = "orders"
        to = "orders-db"
    "#;

    #[test]
    fn test_parse_and_build_minimal() {
        let blueprint = Blueprint::from_str(MINIMAL).unwrap();
        let (registry, graph) = blueprint.build().unwrap();

        assert_eq!(registry.len(), 4);
        assert!(graph.is_finalized());

        // Kind-major registration order.
        let order: Vec<&str> = registry.all().map(|node| node.id.as_str()).collect();
        assert_eq!(order, vec!["backbone", "orders-db", "orders-db-probe", "orders"]);
    }

    #[test]
    fn test_defaults_applied() {
        let blueprint = Blueprint::from_str(MINIMAL).unwrap();

        let database = &blueprint.database[0];
        assert_eq!(database.engine, "postgres");
        assert_eq!(database.storage_gb, 20);
        assert_eq!(database.credential, "admin_user");

        let check = &blueprint.health_check[0];
        assert_eq!(check.interval_secs, 30);
        assert_eq!(check.failure_threshold, 3);

        let dep = &blueprint.dependency[0];
        assert_eq!(dep.strength, EdgeStrength::Hard);
    }

    #[test]
    fn test_built_topology_plans() {
        let blueprint = Blueprint::from_str(MINIMAL).unwrap();
        let (registry, graph) = blueprint.build().unwrap();

        let mut gate = HealthGate::from_registry(&registry);
        gate.observe(
            &ResourceId::from("orders-db-probe"),
            ProbeOutcome::Up,
        )
        .unwrap();

        let plan = topology::plan(&registry, &graph, &gate).unwrap();
        let stages: Vec<Vec<&str>> = plan
            .stages
            .iter()
            .map(|stage| stage.members.iter().map(ResourceId::as_str).collect())
            .collect();
        assert_eq!(
            stages,
            vec![vec!["backbone"], vec!["orders-db"], vec!["orders"]]
        );

        let env = &plan.service_env[&ResourceId::from("orders")];
        assert_eq!(env.get("PORT"), Some("4000"));
        assert_eq!(
            env.get("DATABASE_ADDRESS"),
            Some("orders-db.deploy.internal")
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blueprint.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let blueprint = Blueprint::load(&path).unwrap();
        assert_eq!(blueprint.service.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Blueprint::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let err = Blueprint::from_str(
            r#"
            [[network]]
            id = "Backbone_Net"
            domain = "deploy.internal"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_check_monitoring_a_check_rejected() {
        let err = Blueprint::from_str(
            r#"
            [[health_check]]
            id = "probe-a"
            monitors = "probe-b"

            [[health_check]]
            id = "probe-b"
            monitors = "probe-a"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_dangling_dependency_surfaces_from_core() {
        let blueprint = Blueprint::from_str(
            r#"
            [[service]]
            id = "orders"
            image = "orders"

            [[dependency]]
            from = "orders"
            to = "ghost-db"
            "#,
        )
        .unwrap();

        let err = blueprint.build().unwrap_err();
        assert!(matches!(
            err,
            Error::Topology(topology::Error::UnknownResource(_))
        ));
    }

    #[test]
    fn test_duplicate_identifier_surfaces_from_core() {
        let blueprint = Blueprint::from_str(
            r#"
            [[network]]
            id = "shared"
            domain = "deploy.internal"

            [[service]]
            id = "shared"
            image = "shared"
            "#,
        )
        .unwrap();

        let err = blueprint.build().unwrap_err();
        assert!(matches!(
            err,
            Error::Topology(topology::Error::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn test_cycle_surfaces_from_core() {
        let blueprint = Blueprint::from_str(
            r#"
            [[service]]
            id = "a"
            image = "a"

            [[service]]
            id = "b"
            image = "b"

            [[dependency]]
            from = "a"
            to = "b"

            [[dependency]]
            from = "b"
            to = "a"
            "#,
        )
        .unwrap();

        let err = blueprint.build().unwrap_err();
        assert!(matches!(
            err,
            Error::Topology(topology::Error::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_health_report_replays_into_gate() {
        let blueprint = Blueprint::from_str(MINIMAL).unwrap();
        let (registry, _graph) = blueprint.build().unwrap();
        let mut gate = HealthGate::from_registry(&registry);

        let report = HealthReport::from_str(
            r#"
            [[probe]]
            check = "orders-db-probe"
            outcomes = ["down", "down", "down"]
            "#,
        )
        .unwrap();
        report.apply(&mut gate).unwrap();

        assert_eq!(
            gate.status(&ResourceId::from("orders-db-probe")),
            Some(HealthStatus::Failed)
        );
    }

    #[test]
    fn test_health_report_unknown_check() {
        let blueprint = Blueprint::from_str(MINIMAL).unwrap();
        let (registry, _graph) = blueprint.build().unwrap();
        let mut gate = HealthGate::from_registry(&registry);

        let report = HealthReport::from_str(
            r#"
            [[probe]]
            check = "ghost-probe"
            outcomes = ["up"]
            "#,
        )
        .unwrap();

        let err = report.apply(&mut gate).unwrap_err();
        assert!(matches!(
            err,
            Error::Topology(topology::Error::UnknownResource(_))
        ));
    }
}
