//! Blueprint discovery and path expansion

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Expand `~` in a user-supplied path
pub fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Locate the blueprint to operate on.
///
/// Priority: an explicit path, then `./stagehand.toml`, then
/// `~/.config/stagehand/blueprint.toml`.
pub fn find_blueprint(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(path));
    }

    let local = PathBuf::from("stagehand.toml");
    if local.exists() {
        return Ok(local);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let fallback = home
        .join(".config")
        .join("stagehand")
        .join("blueprint.toml");
    if fallback.exists() {
        return Ok(fallback);
    }

    anyhow::bail!("no blueprint found: pass a path or create ./stagehand.toml")
}
