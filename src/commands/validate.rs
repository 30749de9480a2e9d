//! Validate a blueprint end to end
//!
//! Building already checks identifiers, references, and acyclicity; this
//! additionally resolves every service so wiring mistakes (underivable
//! facets, ambiguous same-kind dependencies) surface before any plan is
//! computed.

use anyhow::Result;

use crate::cli::BlueprintArgs;
use crate::{ui, Context};
use topology::ResourceKind;

pub fn run(ctx: &Context, args: &BlueprintArgs) -> Result<()> {
    let (registry, graph) = super::load_topology(args.blueprint.as_deref())?;

    let mut services = 0usize;
    for node in registry.all() {
        if node.kind() == ResourceKind::Service {
            topology::resolve(&registry, &graph, &node.id)?;
            services += 1;
        }
    }
    log::info!("resolved {services} services");

    if !ctx.quiet {
        ui::success(&format!(
            "blueprint valid: {} resources, {} edges, {} services wired",
            registry.len(),
            graph.edges().len(),
            services,
        ));
    }
    Ok(())
}
