mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ConfirmArgs, RunArgs};
use dotenv::dotenv;
use indicatif::HumanBytes;
use plex_purge_core::filesystem::LocalFilesystem;
use plex_purge_core::inventory::{Inventory, TautulliClient};
use plex_purge_core::manager::RadarrClient;
use plex_purge_core::tracker::OverseerrClient;
use plex_purge_core::{
    AppConfig, ConfirmationProvider, PresetConfirmation, PurgeEngine, RunContext, Services,
};
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match plex_purge_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Run(run_args)) => run_purge(&config, &run_args),
        Some(Commands::ListLibraries) => list_libraries(&config),
        Some(Commands::EmptyTrash(confirm)) => empty_trash(&config, &confirm),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

struct Clients {
    inventory: TautulliClient,
    tracker: OverseerrClient,
    manager: RadarrClient,
}

impl Clients {
    fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self {
            inventory: TautulliClient::new(&config.tautulli, timeout)
                .context("Failed to create Tautulli client")?,
            tracker: OverseerrClient::new(&config.overseerr, timeout)
                .context("Failed to create Overseerr client")?,
            manager: RadarrClient::new(&config.radarr, timeout)
                .context("Failed to create Radarr client")?,
        })
    }

    fn services(&self) -> Services<'_> {
        Services {
            inventory: &self.inventory,
            tracker: &self.tracker,
            manager: &self.manager,
            fs: &LocalFilesystem,
        }
    }
}

fn run_purge(config: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    let clients = Clients::connect(config)?;
    let ctx = RunContext::new(config.policy.clone());
    let engine = PurgeEngine::new(ctx, clients.services())
        .with_config(config)
        .dry_run(args.dry_run);

    let reporter = CliReporter::new();
    let confirm = confirmation(&args.confirm);
    let report = engine.run(confirm.as_ref(), &reporter)?;

    report.log_summary();

    println!();
    info!(
        "{} of {} items blacklisted ({}), {} reclaimable",
        format!("{}", report.blacklist_count()).red(),
        format!("{}", report.total_media_count).green(),
        format!("{:.1}%", report.blacklist_percent()).red(),
        format!("{}", HumanBytes(report.reclaimable_bytes)).red(),
    );
    if let Some(deletion) = &report.deletion {
        info!(
            "{} deleted, {} unresolved",
            format!("{}", deletion.deleted).green(),
            format!("{}", deletion.unresolved).yellow(),
        );
    }

    if let Some(path) = &args.csv {
        report
            .write_csv(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn list_libraries(config: &AppConfig) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let inventory = TautulliClient::new(&config.tautulli, timeout)?;
    for (name, section_id) in inventory.list_libraries()? {
        println!("{:>6}  {}", section_id.cyan(), name);
    }
    Ok(())
}

fn empty_trash(config: &AppConfig, args: &ConfirmArgs) -> anyhow::Result<()> {
    let clients = Clients::connect(config)?;
    let engine = PurgeEngine::new(RunContext::new(config.policy.clone()), clients.services())
        .with_config(config);

    let confirm = confirmation(args);
    let trash = engine.empty_trash(confirm.as_ref(), &CliReporter::new())?;
    info!(
        "{} directories emptied, {} reclaimed, {} missing, {} failed",
        format!("{}", trash.removed.len()).green(),
        format!("{}", HumanBytes(trash.reclaimed_bytes())).green(),
        trash.missing.len(),
        format!("{}", trash.failed.len()).red(),
    );
    Ok(())
}

fn confirmation(args: &ConfirmArgs) -> Box<dyn ConfirmationProvider> {
    if args.yes {
        Box::new(PresetConfirmation(true))
    } else {
        Box::new(PromptConfirmation)
    }
}

/// Asks on the terminal, defaulting to "no".
struct PromptConfirmation;

impl ConfirmationProvider for PromptConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        match prompt_confirm(prompt, Some(false)) {
            Ok(answer) => answer,
            Err(e) => {
                error!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
