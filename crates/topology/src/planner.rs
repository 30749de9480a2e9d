//! Provisioning planner - stage layering with health-gated readiness
//!
//! The planner turns a finalized graph into an ordered list of stages.
//! Everything in one stage has every hard dependency in an earlier stage
//! and may be dispatched concurrently by the external executor; the core
//! only guarantees that this is safe, it performs no dispatch itself.
//!
//! Health checks are registered resources but never stage members: they
//! surface as per-stage gate annotations naming the checks that must
//! report ready before the stage may start. Edges that point at a check
//! are normalized to the resource the check monitors.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, EdgeStrength};
use crate::health::{HealthGate, HealthStatus};
use crate::registry::Registry;
use crate::resolver::{self, ResolvedConfiguration};
use crate::resource::{ResourceId, ResourceKind, ResourceSpec};

/// A health confirmation required before a stage may start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageGate {
    /// The health check that must report ready
    pub check: ResourceId,
    /// The resource the check monitors
    pub monitors: ResourceId,
}

/// Resources with no unresolved hard dependency among them; safe to
/// create concurrently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Members in registration order
    pub members: Vec<ResourceId>,
    /// Checks that must confirm before this stage starts
    pub gates: Vec<StageGate>,
}

/// Ordered, annotated provisioning plan.
///
/// A derived, disposable artifact: recompute it after any change to the
/// declarations or a fresh health cycle; it holds no independent identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningPlan {
    pub stages: Vec<Stage>,
    /// Resolved environment per service
    pub service_env: BTreeMap<ResourceId, ResolvedConfiguration>,
}

impl ProvisioningPlan {
    /// Stage index a resource was placed in
    pub fn stage_of(&self, id: &ResourceId) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.members.contains(id))
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Compute a provisioning plan from the registry, the finalized graph, and
/// a point-in-time snapshot of the health gate.
///
/// Any monitored resource whose check has terminally failed makes the whole
/// plan fail with `BlockedByFailedDependency`, reporting every transitively
/// blocked dependent rather than the first one encountered.
pub fn plan(
    registry: &Registry,
    graph: &DependencyGraph,
    gate: &HealthGate,
) -> Result<ProvisioningPlan> {
    if !graph.is_finalized() {
        return Err(Error::GraphNotFinalized);
    }
    let snapshot = gate.snapshot();

    let ids: Vec<&ResourceId> = registry.all().map(|node| &node.id).collect();
    let is_check: Vec<bool> = registry
        .all()
        .map(|node| node.kind() == ResourceKind::HealthCheck)
        .collect();
    let count = ids.len();

    // Normalized dependency lists per node. Edges declared by a check are
    // implicit ordering for the check itself, which never enters a stage,
    // so they are skipped; edges pointing at a check count against the
    // monitored resource instead.
    let mut hard = vec![Vec::new(); count];
    let mut soft = vec![Vec::new(); count];
    let mut hard_dependents = vec![Vec::new(); count];
    for edge in graph.edges() {
        let Some(from) = registry.position(&edge.from) else {
            continue;
        };
        if is_check[from] {
            continue;
        }
        let target = normalize(registry, &edge.to)?;
        let to = registry
            .position(target)
            .ok_or_else(|| Error::UnknownResource(target.clone()))?;
        if to == from {
            // A dependency on the node's own check adds no ordering.
            continue;
        }
        match edge.strength {
            EdgeStrength::Hard => {
                hard[from].push(to);
                hard_dependents[to].push(from);
            }
            EdgeStrength::Soft => soft[from].push(to),
        }
    }

    // Terminal health failures block the plan as a whole. The failed set is
    // the monitored resources themselves; the blocked set is every hard
    // dependent reachable from them.
    let failed: Vec<usize> = (0..count)
        .filter(|&pos| !is_check[pos] && snapshot.status_of(ids[pos]) == HealthStatus::Failed)
        .collect();
    if !failed.is_empty() {
        let blocked = transitive_dependents(&failed, &hard_dependents);
        return Err(Error::BlockedByFailedDependency {
            failed: failed.iter().map(|&pos| ids[pos].clone()).collect(),
            blocked: blocked.iter().map(|&pos| ids[pos].clone()).collect(),
        });
    }

    // Resolution happens before layering so a design error in the wiring is
    // caught even when the offending service would land in a late stage.
    let mut service_env = BTreeMap::new();
    for node in registry.all() {
        if let ResourceSpec::Service(_) = node.spec {
            let config = resolver::resolve(registry, graph, &node.id)?;
            service_env.insert(node.id.clone(), config);
        }
    }

    let stage_index = layer(&ids, &is_check, &hard, &soft)?;

    let stage_count = stage_index
        .iter()
        .filter(|&&stage| stage != usize::MAX)
        .map(|&stage| stage + 1)
        .max()
        .unwrap_or(0);

    let mut stages: Vec<Stage> = vec![Stage::default(); stage_count];
    for (pos, &stage) in stage_index.iter().enumerate() {
        if stage != usize::MAX {
            stages[stage].members.push(ids[pos].clone());
        }
    }

    // Gate annotations: a stage must wait for every check that monitors one
    // of its members' hard dependencies.
    for (pos, &stage) in stage_index.iter().enumerate() {
        if stage == usize::MAX {
            continue;
        }
        for &dep in &hard[pos] {
            for check in registry.checks_monitoring(ids[dep]) {
                stages[stage].gates.push(StageGate {
                    check: check.id.clone(),
                    monitors: ids[dep].clone(),
                });
            }
        }
    }
    for stage in &mut stages {
        stage
            .gates
            .sort_by_key(|gate| registry.position(&gate.check).unwrap_or(usize::MAX));
        stage.gates.dedup();
    }

    Ok(ProvisioningPlan {
        stages,
        service_env,
    })
}

/// Follow a chain of health checks to the resource actually monitored
fn normalize<'a>(registry: &'a Registry, id: &'a ResourceId) -> Result<&'a ResourceId> {
    let mut current = id;
    let mut hops = 0;
    loop {
        let node = registry.get(current)?;
        match &node.spec {
            ResourceSpec::HealthCheck(check) => {
                hops += 1;
                if hops > registry.len() {
                    // Checks monitoring each other in a loop.
                    return Err(Error::CyclicDependency(vec![id.clone()]));
                }
                current = &check.monitors;
            }
            _ => return Ok(current),
        }
    }
}

/// Every hard dependent reachable from `failed`, excluding the failed
/// nodes themselves, in registration order
fn transitive_dependents(failed: &[usize], hard_dependents: &[Vec<usize>]) -> Vec<usize> {
    let mut seen = vec![false; hard_dependents.len()];
    let mut queue: VecDeque<usize> = failed.iter().copied().collect();
    for &pos in failed {
        seen[pos] = true;
    }
    let mut blocked = Vec::new();
    while let Some(pos) = queue.pop_front() {
        for &dependent in &hard_dependents[pos] {
            if !seen[dependent] {
                seen[dependent] = true;
                blocked.push(dependent);
                queue.push_back(dependent);
            }
        }
    }
    blocked.sort_unstable();
    blocked
}

/// Kahn-variant layering over the normalized constraints.
///
/// A hard dependency pushes the dependent at least one stage later; a soft
/// dependency only requires the predecessor to be scheduled no later than
/// the dependent. Ready nodes are taken in registration order, keeping the
/// result reproducible. Returns `usize::MAX` for health checks, which have
/// no stage.
fn layer(
    ids: &[&ResourceId],
    is_check: &[bool],
    hard: &[Vec<usize>],
    soft: &[Vec<usize>],
) -> Result<Vec<usize>> {
    let count = ids.len();
    let mut remaining = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for pos in 0..count {
        if is_check[pos] {
            continue;
        }
        remaining[pos] = hard[pos].len() + soft[pos].len();
        for &dep in hard[pos].iter().chain(&soft[pos]) {
            dependents[dep].push(pos);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|&pos| !is_check[pos] && remaining[pos] == 0)
        .map(Reverse)
        .collect();

    let mut stage_index = vec![usize::MAX; count];
    let mut placed = 0usize;
    while let Some(Reverse(pos)) = ready.pop() {
        let hard_floor = hard[pos]
            .iter()
            .map(|&dep| stage_index[dep] + 1)
            .max()
            .unwrap_or(0);
        let soft_floor = soft[pos]
            .iter()
            .map(|&dep| stage_index[dep])
            .max()
            .unwrap_or(0);
        stage_index[pos] = hard_floor.max(soft_floor);
        placed += 1;

        for &dependent in &dependents[pos] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    let member_count = is_check.iter().filter(|&&check| !check).count();
    if placed != member_count {
        // Normalized constraints formed a cycle the raw edge set did not
        // express (checks gating each other's targets).
        let stuck: Vec<ResourceId> = (0..count)
            .filter(|&pos| !is_check[pos] && stage_index[pos] == usize::MAX)
            .map(|pos| ids[pos].clone())
            .collect();
        return Err(Error::CyclicDependency(stuck));
    }

    Ok(stage_index)
}
