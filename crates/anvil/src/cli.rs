//! CLI argument parsing with clap

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// anvil - post-processor bootstrap for a dependency-injection container
#[derive(Parser, Debug)]
#[command(name = "anvil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a bootstrap.yaml layered over the user config
    #[arg(short, long, global = true, env = "ANVIL_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Set a placeholder property (repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE", global = true)]
    pub define: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Parsed `-D key=value` properties, in command-line order
    pub fn properties(&self) -> Result<Vec<(String, String)>> {
        self.define.iter().map(|raw| parse_property(raw)).collect()
    }
}

fn parse_property(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("Invalid property '{}': expected KEY=VALUE", raw),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh a sample transactional context and report the bootstrap
    Demo(DemoArgs),

    /// Bootstrap configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved bootstrap configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
