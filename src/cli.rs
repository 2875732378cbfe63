use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// teval ensemble streamflow evaluator.
#[derive(Parser)]
#[command(
    name = "teval",
    version,
    about = "Ensemble streamflow statistics and gage evaluation"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Compute ensemble statistics and score them against gages.
    Run(RunArgs),
    /// Write a configuration file populated with defaults.
    Init(InitArgs),
    /// Print every configuration option with its default.
    ConfigHelp,
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "teval.toml")]
    pub config: PathBuf,
}

/// Arguments for the `init` subcommand.
#[derive(clap::Args)]
pub struct InitArgs {
    /// Where to write the configuration.
    #[arg(short, long, default_value = "teval.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(short, long)]
    pub force: bool,
}
