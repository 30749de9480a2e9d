//! Print the resolved environment for one service

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::{ui, Context};
use topology::ResourceId;

pub fn run(_ctx: &Context, args: &ResolveArgs) -> Result<()> {
    let (registry, graph) = super::load_topology(args.blueprint.as_deref())?;

    let service = ResourceId::from(args.service.as_str());
    let config = topology::resolve(&registry, &graph, &service)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    ui::header(&format!("Environment for {service}"));
    if config.is_empty() {
        ui::dim("(empty)");
    }
    for (name, value) in config.iter() {
        ui::kv(name, value);
    }
    Ok(())
}
