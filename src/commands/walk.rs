//! Drive a plan with the simulated executor

use anyhow::{Context as AnyhowContext, Result};
use std::collections::BTreeMap;

use crate::cli::WalkArgs;
use crate::engine::{self, StageProgress, WalkOptions, WalkOutcome};
use crate::{paths, ui, Context};
use blueprint::HealthReport;
use topology::{HealthGate, ProbeOutcome, ResourceId};

/// Renders stage progress with the ui helpers
struct CliProgress {
    quiet: bool,
}

impl StageProgress for CliProgress {
    fn on_stage_start(&mut self, index: usize, total: usize, members: &[ResourceId]) {
        if self.quiet {
            return;
        }
        let names: Vec<&str> = members.iter().map(ResourceId::as_str).collect();
        ui::step(index + 1, total, &names.join(", "));
    }

    fn on_resource_created(&mut self, id: &ResourceId) {
        if !self.quiet {
            ui::dim(&format!("created {id}"));
        }
    }

    fn on_stage_complete(&mut self, _index: usize) {}
}

pub fn run(ctx: &Context, args: &WalkArgs) -> Result<()> {
    let (registry, graph) = super::load_topology(args.blueprint.as_deref())?;

    let mut observations: BTreeMap<ResourceId, Vec<ProbeOutcome>> = BTreeMap::new();
    if let Some(health_path) = &args.health {
        let health_path = paths::expand(health_path);
        let report = HealthReport::load(&health_path)
            .with_context(|| format!("Could not load {}", health_path.display()))?;
        for probe in &report.probe {
            observations.insert(ResourceId::from(probe.check.as_str()), probe.outcomes.clone());
        }
    }

    let mut gate = HealthGate::from_registry(&registry);
    let opts = WalkOptions {
        jobs: args.jobs,
        verbose: ctx.verbose > 0,
    };
    let mut progress = CliProgress { quiet: ctx.quiet };

    let summary = engine::walk(
        &registry,
        &graph,
        &mut gate,
        &observations,
        &opts,
        &mut progress,
    )?;

    println!();
    match &summary.outcome {
        WalkOutcome::Completed => {
            ui::success(&format!(
                "walk complete: {} stages, {} resources created",
                summary.stages_completed, summary.created,
            ));
        }
        WalkOutcome::Blocked { failed, blocked } => {
            ui::error(&format!(
                "walk blocked after {} stages: failed [{}], blocked [{}]",
                summary.stages_completed,
                join(failed),
                join(blocked),
            ));
            anyhow::bail!("provisioning blocked by failed dependency");
        }
        WalkOutcome::Stalled { stage, waiting_on } => {
            ui::warn(&format!(
                "walk stalled before stage {stage}: waiting on [{}]",
                join(waiting_on),
            ));
        }
    }
    Ok(())
}

fn join(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
