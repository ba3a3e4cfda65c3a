use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rootup_core::{parse_version_lenient, Stability};
use semver::Version;

mod config;
mod dispatch;
mod render;

use dispatch::run_cli;

#[derive(Parser, Debug)]
#[command(name = "rootup")]
#[command(about = "Update a project's root manifest for a new product release", long_about = None)]
struct Cli {
    /// Project directory holding the root manifest.
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,
    /// Configuration file; defaults to `rootup.toml` in the project directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Disable colors and decorations.
    #[arg(long, global = true)]
    plain: bool,
    /// Print labeled progress; repeat for debug logs.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute and write root manifest changes for the required product version.
    Update {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Print the pending changes without writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the pending changes only.
    Diff {
        #[command(flatten)]
        resolve: ResolveArgs,
    },
    /// Print the installed and target template releases.
    Show {
        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct ResolveArgs {
    /// Replace locally modified sections with the target template values.
    #[arg(long = "override")]
    override_local_changes: bool,
    /// Skip runtime compatibility checks when choosing the target template.
    #[arg(long)]
    ignore_platform_reqs: bool,
    /// Runtime version the target template must support.
    #[arg(long, value_parser = parse_runtime_version)]
    runtime_version: Option<Version>,
    /// Minimum stability of the target template (dev, alpha, beta, rc, stable).
    #[arg(long)]
    stability: Option<Stability>,
}

fn parse_runtime_version(value: &str) -> Result<Version, String> {
    parse_version_lenient(value).map_err(|err| format!("{err:#}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
