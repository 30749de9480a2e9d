//! Simulated stage executor
//!
//! Dispatches each stage's members in parallel - members of one stage
//! carry no mutual ordering constraint, which is exactly what the planner
//! guarantees - then reports probe outcomes for the checks monitoring the
//! stage's members and re-checks the gates before advancing. Creation
//! itself is simulated; real provisioning belongs to an external executor.

use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;

use topology::{
    DependencyGraph, HealthGate, HealthStatus, ProbeOutcome, Registry, ResourceId,
};

/// Options for a walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Number of parallel jobs within a stage
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            verbose: false,
        }
    }
}

/// How a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every stage was dispatched and confirmed
    Completed,
    /// A monitored resource terminally failed; carries the planner's
    /// exhaustive report
    Blocked {
        failed: Vec<ResourceId>,
        blocked: Vec<ResourceId>,
    },
    /// A gate never confirmed; the walk stopped in front of `stage`
    Stalled {
        stage: usize,
        waiting_on: Vec<ResourceId>,
    },
}

/// Summary of a walk
#[derive(Debug, Clone)]
pub struct WalkSummary {
    pub stages_completed: usize,
    pub created: usize,
    pub outcome: WalkOutcome,
}

/// Progress callback for walk operations
pub trait StageProgress {
    /// Called when a stage starts dispatching
    fn on_stage_start(&mut self, index: usize, total: usize, members: &[ResourceId]);

    /// Called when a member's simulated creation completes
    fn on_resource_created(&mut self, id: &ResourceId);

    /// Called when a stage is fully confirmed
    fn on_stage_complete(&mut self, index: usize);
}

/// No-op progress callback
pub struct NoProgress;

impl StageProgress for NoProgress {
    fn on_stage_start(&mut self, _index: usize, _total: usize, _members: &[ResourceId]) {}
    fn on_resource_created(&mut self, _id: &ResourceId) {}
    fn on_stage_complete(&mut self, _index: usize) {}
}

/// Walk the plan for `registry`/`graph` stage by stage.
///
/// `observations` supplies the probe outcomes replayed for each check once
/// the resource it monitors has been created; checks without an entry are
/// reported up. The gate is mutated as the walk progresses, so a caller can
/// inspect the final health state afterwards.
pub fn walk<P: StageProgress>(
    registry: &Registry,
    graph: &DependencyGraph,
    gate: &mut HealthGate,
    observations: &BTreeMap<ResourceId, Vec<ProbeOutcome>>,
    opts: &WalkOptions,
    progress: &mut P,
) -> Result<WalkSummary> {
    let plan = topology::plan(registry, graph, gate)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let mut summary = WalkSummary {
        stages_completed: 0,
        created: 0,
        outcome: WalkOutcome::Completed,
    };

    for (index, stage) in plan.stages.iter().enumerate() {
        // Gates first: every check guarding this stage must be ready.
        let snapshot = gate.snapshot();
        if stage
            .gates
            .iter()
            .any(|g| snapshot.status_of(&g.monitors) == HealthStatus::Failed)
        {
            // Re-plan for the exhaustive failed/blocked report.
            summary.outcome = match topology::plan(registry, graph, gate) {
                Err(topology::Error::BlockedByFailedDependency { failed, blocked }) => {
                    WalkOutcome::Blocked { failed, blocked }
                }
                _ => WalkOutcome::Blocked {
                    failed: Vec::new(),
                    blocked: stage.members.clone(),
                },
            };
            return Ok(summary);
        }

        let waiting: Vec<ResourceId> = stage
            .gates
            .iter()
            .filter(|g| !snapshot.is_satisfied(&g.monitors))
            .map(|g| g.check.clone())
            .collect();
        if !waiting.is_empty() {
            summary.outcome = WalkOutcome::Stalled {
                stage: index,
                waiting_on: waiting,
            };
            return Ok(summary);
        }

        progress.on_stage_start(index, plan.stages.len(), &stage.members);

        // Members of one stage are mutually unordered: fan out.
        let verbose = opts.verbose;
        pool.install(|| {
            stage.members.par_iter().for_each(|id| {
                if verbose {
                    log::info!("created {id}");
                } else {
                    log::debug!("created {id}");
                }
            });
        });
        for id in &stage.members {
            progress.on_resource_created(id);
        }
        summary.created += stage.members.len();

        // The external prober speaks: replay outcomes for every check
        // monitoring something created in this stage.
        for member in &stage.members {
            for check in registry.checks_monitoring(member) {
                match observations.get(&check.id) {
                    Some(outcomes) => {
                        for &outcome in outcomes {
                            gate.observe(&check.id, outcome)?;
                        }
                    }
                    None => gate.observe(&check.id, ProbeOutcome::Up)?,
                }
            }
        }

        progress.on_stage_complete(index);
        summary.stages_completed += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::{
        DatabaseSpec, EdgeStrength, HealthCheckSpec, NetworkSpec, ProbeProtocol, ResourceNode,
        ResourceSpec, ServiceSpec,
    };

    /// Network -> monitored database -> service fixture
    fn fixture() -> (Registry, DependencyGraph) {
        let mut registry = Registry::new();
        registry
            .register(ResourceNode::new(
                "net",
                ResourceSpec::Network(NetworkSpec {
                    domain: "deploy.internal".into(),
                    max_zones: 2,
                }),
            ))
            .unwrap();
        registry
            .register(ResourceNode::new(
                "db",
                ResourceSpec::Database(DatabaseSpec {
                    engine: "postgres".into(),
                    version: "17.2".into(),
                    storage_gb: 20,
                    credential: "admin_user".into(),
                    host: None,
                    port: None,
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
        registry
            .register(ResourceNode::new(
                "api",
                ResourceSpec::Service(ServiceSpec {
                    image: "api".into(),
                    ports: vec![4000],
                    cpu: 256,
                    memory_mib: 512,
                    env: BTreeMap::new(),
                    log_group: None,
                    log_retention_days: 1,
                    public: false,
                }),
            ))
            .unwrap();

        let mut graph = DependencyGraph::new();
        graph
            .add_edge(&registry, "db", "net", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "db-probe", "db", EdgeStrength::Hard)
            .unwrap();
        graph
            .add_edge(&registry, "api", "db", EdgeStrength::Hard)
            .unwrap();
        graph.finalize_and_validate(&registry).unwrap();
        (registry, graph)
    }

    #[test]
    fn test_walk_completes_with_healthy_probes() {
        let (registry, graph) = fixture();
        let mut gate = HealthGate::from_registry(&registry);

        let summary = walk(
            &registry,
            &graph,
            &mut gate,
            &BTreeMap::new(),
            &WalkOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(summary.outcome, WalkOutcome::Completed);
        assert_eq!(summary.stages_completed, 3);
        assert_eq!(summary.created, 3);
    }

    #[test]
    fn test_walk_blocks_on_terminal_failure() {
        let (registry, graph) = fixture();
        let mut gate = HealthGate::from_registry(&registry);

        let mut observations = BTreeMap::new();
        observations.insert(
            ResourceId::from("db-probe"),
            vec![ProbeOutcome::Down, ProbeOutcome::Down, ProbeOutcome::Down],
        );

        let summary = walk(
            &registry,
            &graph,
            &mut gate,
            &observations,
            &WalkOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        match summary.outcome {
            WalkOutcome::Blocked { failed, blocked } => {
                let failed: Vec<&str> = failed.iter().map(ResourceId::as_str).collect();
                let blocked: Vec<&str> = blocked.iter().map(ResourceId::as_str).collect();
                assert_eq!(failed, vec!["db"]);
                assert_eq!(blocked, vec!["api"]);
            }
            other => panic!("expected Blocked, got: {other:?}"),
        }
        // Network and database stages were dispatched before the gate tripped.
        assert_eq!(summary.stages_completed, 2);
        assert_eq!(summary.created, 2);
    }

    #[test]
    fn test_walk_stalls_on_silent_probe() {
        let (registry, graph) = fixture();
        let mut gate = HealthGate::from_registry(&registry);

        // The probe never reports anything.
        let mut observations = BTreeMap::new();
        observations.insert(ResourceId::from("db-probe"), Vec::new());

        let summary = walk(
            &registry,
            &graph,
            &mut gate,
            &observations,
            &WalkOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        match summary.outcome {
            WalkOutcome::Stalled { stage, waiting_on } => {
                assert_eq!(stage, 2);
                let waiting: Vec<&str> = waiting_on.iter().map(ResourceId::as_str).collect();
                assert_eq!(waiting, vec!["db-probe"]);
            }
            other => panic!("expected Stalled, got: {other:?}"),
        }
    }
}
