//! Compute and render the staged provisioning plan

use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;

use crate::cli::PlanArgs;
use crate::{paths, ui, Context};
use blueprint::HealthReport;
use topology::{HealthGate, ProvisioningPlan};

/// Envelope for `--json` output
#[derive(Serialize)]
struct PlanDocument<'a> {
    generated_at: String,
    plan: &'a ProvisioningPlan,
}

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let (registry, graph) = super::load_topology(args.blueprint.as_deref())?;

    let mut gate = HealthGate::from_registry(&registry);
    if let Some(health_path) = &args.health {
        let health_path = paths::expand(health_path);
        let report = HealthReport::load(&health_path)
            .with_context(|| format!("Could not load {}", health_path.display()))?;
        report.apply(&mut gate)?;
    }

    let plan = topology::plan(&registry, &graph, &gate)?;

    if args.json {
        let document = PlanDocument {
            generated_at: chrono::Utc::now().to_rfc3339(),
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    render(ctx, &registry, &gate, &plan)?;
    Ok(())
}

fn render(
    ctx: &Context,
    registry: &topology::Registry,
    gate: &HealthGate,
    plan: &ProvisioningPlan,
) -> Result<()> {
    let snapshot = gate.snapshot();

    for (index, stage) in plan.stages.iter().enumerate() {
        ui::section(&format!("Stage {index}"));
        for gate_entry in &stage.gates {
            let status = snapshot.status_of(&gate_entry.monitors);
            ui::dim(&format!(
                "waits on {} ({}: {:?})",
                gate_entry.check, gate_entry.monitors, status
            ));
        }
        for id in &stage.members {
            let node = registry.get(id)?;
            ui::kv(id.as_str(), node.kind().as_str());
        }
    }

    if !plan.service_env.is_empty() {
        ui::section("Service environment");
        for (service, config) in &plan.service_env {
            ui::info(service.as_str());
            for (name, value) in config.iter() {
                ui::kv(name, value);
            }
        }
    }

    if !ctx.quiet {
        println!();
        ui::success(&format!(
            "{} stages, {} resources",
            plan.stages.len(),
            plan.stages.iter().map(|s| s.members.len()).sum::<usize>(),
        ));
    }
    Ok(())
}
