//! Error types for the topology core

use thiserror::Error;

use crate::resource::ResourceId;

/// Errors raised while declaring, validating, resolving, or planning a topology
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A resource identifier was registered twice
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(ResourceId),

    /// An identifier does not name a registered resource
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// An ordering query was made before the graph was finalized
    #[error("dependency graph is not finalized")]
    GraphNotFinalized,

    /// An edge was added after the graph was finalized
    #[error("dependency graph is finalized and can no longer be modified")]
    GraphFinalized,

    /// The declared edges contain a cycle; carries the offending cycle in cycle order
    #[error("cyclic dependency: {}", join_cycle(.0))]
    CyclicDependency(Vec<ResourceId>),

    /// A hard dependency's facet could not be computed for the requesting service
    #[error("unresolved reference from '{service}' to '{dependency}': {reason}")]
    UnresolvedReference {
        service: ResourceId,
        dependency: ResourceId,
        reason: String,
    },

    /// One or more monitored resources reported a terminal health failure;
    /// carries every transitively blocked dependent, not just the first
    #[error("blocked by failed dependency: failed [{}], blocked [{}]", join_ids(.failed), join_ids(.blocked))]
    BlockedByFailedDependency {
        failed: Vec<ResourceId>,
        blocked: Vec<ResourceId>,
    },
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, Error>;

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_cycle(ids: &[ResourceId]) -> String {
    let mut parts: Vec<&str> = ids.iter().map(ResourceId::as_str).collect();
    // Repeat the head so the rendered path closes the loop.
    let head = parts.first().copied();
    if let Some(head) = head {
        parts.push(head);
    }
    parts.join(" -> ")
}
