//! anvil CLI - drives the container bootstrap from the command line
//!
//! This is the main entry point for the anvil command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let overrides = cli.properties()?;
    match cli.command {
        Commands::Demo(args) => commands::demo::run(args, cli.config.as_deref(), &overrides),
        Commands::Config(cmd) => commands::config::run(cmd, cli.config.as_deref(), &overrides),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("warn")
        } else {
            match verbose {
                0 => EnvFilter::new("info"),
                1 => EnvFilter::new("debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
