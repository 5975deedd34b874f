use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "plex-purge")]
#[command(about = "Purge badly rated, unwatched media from a Plex library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate the library and delete everything that fails the retention policy
    Run(RunArgs),
    /// List the libraries known to Tautulli
    ListLibraries,
    /// Permanently empty the configured trash directories
    EmptyTrash(ConfirmArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Evaluate and report only; delete nothing
    #[arg(long)]
    pub dry_run: bool,
    /// Write the blacklist and its per-stage outcomes to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
