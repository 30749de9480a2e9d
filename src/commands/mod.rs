pub mod order;
pub mod plan;
pub mod resolve;
pub mod validate;
pub mod walk;

use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;

use crate::paths;
use blueprint::Blueprint;
use topology::{DependencyGraph, Registry};

/// Locate, load, and build the blueprint shared by every command
pub fn load_topology(explicit: Option<&Path>) -> Result<(Registry, DependencyGraph)> {
    let path = paths::find_blueprint(explicit)?;
    let blueprint =
        Blueprint::load(&path).with_context(|| format!("Could not load {}", path.display()))?;
    log::info!("loaded blueprint from {}", path.display());
    Ok(blueprint.build()?)
}
