use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Deployment topology planner", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a blueprint: identifiers, references, acyclicity, wiring
    Validate(BlueprintArgs),

    /// Print the topological creation order
    Order(BlueprintArgs),

    /// Print the resolved environment for one service
    Resolve(ResolveArgs),

    /// Compute the staged provisioning plan
    Plan(PlanArgs),

    /// Drive the plan stage by stage with a simulated executor
    Walk(WalkArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct BlueprintArgs {
    /// Path to the blueprint (defaults to ./stagehand.toml)
    pub blueprint: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Service identifier to resolve
    pub service: String,

    /// Path to the blueprint (defaults to ./stagehand.toml)
    #[arg(short, long)]
    pub blueprint: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Path to the blueprint (defaults to ./stagehand.toml)
    pub blueprint: Option<PathBuf>,

    /// Health report to replay before planning
    #[arg(long)]
    pub health: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct WalkArgs {
    /// Path to the blueprint (defaults to ./stagehand.toml)
    pub blueprint: Option<PathBuf>,

    /// Health report supplying probe outcomes per check; checks without an
    /// entry come up healthy
    #[arg(long)]
    pub health: Option<PathBuf>,

    /// Number of parallel jobs within a stage
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}
