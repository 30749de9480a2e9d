//! Print the topological creation order

use anyhow::Result;

use crate::cli::BlueprintArgs;
use crate::{ui, Context};

pub fn run(_ctx: &Context, args: &BlueprintArgs) -> Result<()> {
    let (registry, graph) = super::load_topology(args.blueprint.as_deref())?;

    let order = graph.topological_order()?;
    ui::header("Creation order");
    for (index, id) in order.iter().enumerate() {
        let node = registry.get(id)?;
        ui::step(
            index + 1,
            order.len(),
            &format!("{} ({})", node.id, node.kind()),
        );
    }
    Ok(())
}
