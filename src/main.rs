mod cli;
mod commands;
mod engine;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Validate(args) => commands::validate::run(&ctx, &args),
        Command::Order(args) => commands::order::run(&ctx, &args),
        Command::Resolve(args) => commands::resolve::run(&ctx, &args),
        Command::Plan(args) => commands::plan::run(&ctx, &args),
        Command::Walk(args) => commands::walk::run(&ctx, &args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "stagehand", &mut io::stdout());
            Ok(())
        }
    }
}
