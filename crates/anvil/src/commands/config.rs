//! Config command

use anyhow::Result;
use camino::Utf8Path;

use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::commands::load_config;

pub fn run(cmd: ConfigCommands, path: Option<&Utf8Path>, overrides: &[(String, String)]) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, path, overrides),
    }
}

fn show(args: ConfigShowArgs, path: Option<&Utf8Path>, overrides: &[(String, String)]) -> Result<()> {
    let config = load_config(path, overrides)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", serde_yaml_ng::to_string(&config)?);
    }

    Ok(())
}
