//! Reference resolution - computing each service's environment
//!
//! Resolution walks a service's hard dependencies, derives each
//! dependency's exposed facet (the kind-specific, well-known connection
//! values under the fixed `<KIND>_<FACET>` naming convention), and merges
//! the service's literal entries on top. Literals always win, so explicit
//! configuration overrides inference.
//!
//! Resolution is pure: given an unchanged registry and graph, re-running it
//! yields byte-identical output, which is what makes re-planning idempotent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, EdgeStrength};
use crate::registry::Registry;
use crate::resource::{DatabaseSpec, MessageClusterSpec, ResourceId, ResourceSpec};

/// Resolved environment for a single service, ordered by variable name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedConfiguration {
    pub entries: BTreeMap<String, String>,
}

impl ResolvedConfiguration {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute the resolved environment for `service_id`.
///
/// Derived facet entries from hard dependencies are merged first; the
/// service's declared literals are merged last and override any derived
/// entry with the same name. Two same-kind dependencies producing the same
/// derived name is ambiguous wiring and fails rather than silently picking
/// a winner.
pub fn resolve(
    registry: &Registry,
    graph: &DependencyGraph,
    service_id: &ResourceId,
) -> Result<ResolvedConfiguration> {
    if !graph.is_finalized() {
        return Err(Error::GraphNotFinalized);
    }

    let node = registry.get(service_id)?;
    let ResourceSpec::Service(service) = &node.spec else {
        return Err(Error::UnresolvedReference {
            service: service_id.clone(),
            dependency: service_id.clone(),
            reason: format!("resolution target is a {}, not a service", node.kind()),
        });
    };

    let mut entries: BTreeMap<String, String> = BTreeMap::new();

    for edge in graph.dependencies_of(service_id) {
        if edge.strength != EdgeStrength::Hard {
            continue;
        }
        let dependency = registry.get(&edge.to)?;
        let facet = match &dependency.spec {
            ResourceSpec::Database(spec) => database_facet(registry, graph, &dependency.id, spec),
            ResourceSpec::MessageCluster(spec) => message_cluster_facet(spec),
            // Structural kinds expose no facet.
            _ => Ok(Vec::new()),
        };
        let facet = facet.map_err(|reason| Error::UnresolvedReference {
            service: service_id.clone(),
            dependency: dependency.id.clone(),
            reason,
        })?;

        for (name, value) in facet {
            if entries.insert(name.clone(), value).is_some() {
                return Err(Error::UnresolvedReference {
                    service: service_id.clone(),
                    dependency: dependency.id.clone(),
                    reason: format!(
                        "derived entry {name} collides with another dependency of the same kind"
                    ),
                });
            }
        }
    }

    // Declared literals override derived entries of the same name.
    for (name, value) in &service.env {
        entries.insert(name.clone(), value.clone());
    }

    Ok(ResolvedConfiguration { entries })
}

/// Database facet: reachable address, port, and a credential reference.
///
/// The credential is propagated as a `secret://` reference, never as a
/// literal secret value.
fn database_facet(
    registry: &Registry,
    graph: &DependencyGraph,
    id: &ResourceId,
    spec: &DatabaseSpec,
) -> std::result::Result<Vec<(String, String)>, String> {
    let host = match &spec.host {
        Some(host) => host.clone(),
        None => {
            let domain = network_domain_of(registry, graph, id).ok_or_else(|| {
                "database has no explicit host and no hard network dependency to derive one from"
                    .to_string()
            })?;
            format!("{id}.{domain}")
        }
    };

    let port = match spec.port {
        Some(port) => port,
        None => default_engine_port(&spec.engine).ok_or_else(|| {
            format!(
                "no default port known for engine '{}'; declare one explicitly",
                spec.engine
            )
        })?,
    };

    Ok(vec![
        ("DATABASE_ADDRESS".to_string(), host),
        ("DATABASE_PORT".to_string(), port.to_string()),
        (
            "DATABASE_CREDENTIAL".to_string(),
            format!("secret://{id}/{}", spec.credential),
        ),
    ])
}

/// Message cluster facet: the comma-joined bootstrap endpoint list
fn message_cluster_facet(
    spec: &MessageClusterSpec,
) -> std::result::Result<Vec<(String, String)>, String> {
    if spec.brokers.is_empty() {
        return Err("message cluster declares no bootstrap brokers".to_string());
    }
    Ok(vec![(
        "MESSAGE_CLUSTER_BOOTSTRAP_SERVERS".to_string(),
        spec.brokers.join(","),
    )])
}

/// Domain of the first hard network dependency of `id`, if any
fn network_domain_of(
    registry: &Registry,
    graph: &DependencyGraph,
    id: &ResourceId,
) -> Option<String> {
    graph
        .dependencies_of(id)
        .filter(|edge| edge.strength == EdgeStrength::Hard)
        .find_map(|edge| match registry.get(&edge.to) {
            Ok(node) => match &node.spec {
                ResourceSpec::Network(network) => Some(network.domain.clone()),
                _ => None,
            },
            Err(_) => None,
        })
}

fn default_engine_port(engine: &str) -> Option<u16> {
    match engine {
        "postgres" | "postgresql" => Some(5432),
        "mysql" | "mariadb" => Some(3306),
        _ => None,
    }
}
