use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{AppConfig, ManagerDeleteMode};
use crate::confirm::ConfirmationProvider;
use crate::context::RunContext;
use crate::error::Error;
use crate::evaluator::{self, ScanOptions};
use crate::filesystem::Filesystem;
use crate::inventory::Inventory;
use crate::manager::AcquisitionManager;
use crate::orchestrator::{self, DeletionOrchestrator, TrashReport};
use crate::progress::ProgressReporter;
use crate::report::RunReport;
use crate::tracker::RequestTracker;

/// External collaborators for one run.
pub struct Services<'a> {
    pub inventory: &'a dyn Inventory,
    pub tracker: &'a dyn RequestTracker,
    pub manager: &'a dyn AcquisitionManager,
    pub fs: &'a dyn Filesystem,
}

pub struct PurgeEngine<'a> {
    ctx: RunContext,
    services: Services<'a>,
    scan_options: ScanOptions,
    trash_dirs: Vec<PathBuf>,
    delete_mode: ManagerDeleteMode,
    dry_run: bool,
}

impl<'a> PurgeEngine<'a> {
    pub fn new(ctx: RunContext, services: Services<'a>) -> Self {
        Self {
            ctx,
            services,
            scan_options: ScanOptions::default(),
            trash_dirs: Vec::new(),
            delete_mode: ManagerDeleteMode::default(),
            dry_run: false,
        }
    }

    /// Apply the run settings from the loaded configuration.
    pub fn with_config(self, config: &AppConfig) -> Self {
        self.with_scan_options(ScanOptions {
            page_size: config.page_size,
            refresh_cache: config.refresh_cache,
        })
        .with_trash_dirs(config.resolved_trash_dirs())
        .with_delete_mode(config.manager_delete_mode)
    }

    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn with_trash_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.trash_dirs = dirs;
        self
    }

    pub fn with_delete_mode(mut self, mode: ManagerDeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    /// Evaluate and report without touching any system of record.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the full pipeline:
    /// 1. Preconditions (confirmation gate, inventory reachable, library exists)
    /// 2. Catalog scan and retention evaluation
    /// 3. Cascading deletion of the blacklist
    /// 4. Trash reclamation
    pub fn run(
        &self,
        confirm: &dyn ConfirmationProvider,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunReport, Error> {
        let start = Instant::now();
        let library = self.ctx.policy.library_name.as_str();

        if !self.dry_run {
            let prompt = if self.trash_dirs.is_empty() {
                format!("Delete unwanted media from library '{library}'?")
            } else {
                format!(
                    "Delete unwanted media from library '{library}' and permanently empty {}?",
                    describe_dirs(&self.trash_dirs)
                )
            };
            if !confirm.confirm(&prompt) {
                return Err(Error::NotConfirmed);
            }
        }

        let section_id = self.resolve_section(library)?;
        info!("Scanning library '{}' (section {})", library, section_id);

        let scan = evaluator::scan_catalog(
            &self.ctx,
            self.services.inventory,
            &section_id,
            self.scan_options,
            reporter,
        )?;
        let reclaimable_bytes = scan.reclaimable_bytes();
        let mut items = scan.blacklist.clone();

        let (deletion, trash) = if self.dry_run {
            (None, None)
        } else {
            let orchestrator = DeletionOrchestrator::new(
                self.services.tracker,
                self.services.manager,
                self.services.fs,
            )
            .with_delete_mode(self.delete_mode);
            let deletion = orchestrator.run(&mut items, reporter);

            let trash = if self.trash_dirs.is_empty() {
                debug!("No trash directories configured");
                None
            } else {
                Some(orchestrator::reclaim_trash(
                    self.services.fs,
                    &self.trash_dirs,
                    reporter,
                ))
            };
            (Some(deletion), trash)
        };

        Ok(RunReport::build(
            library,
            &scan,
            reclaimable_bytes,
            &items,
            deletion,
            trash,
            start.elapsed(),
        ))
    }

    /// Stage D on its own, behind the same confirmation gate.
    pub fn empty_trash(
        &self,
        confirm: &dyn ConfirmationProvider,
        reporter: &dyn ProgressReporter,
    ) -> Result<TrashReport, Error> {
        if self.trash_dirs.is_empty() {
            return Ok(TrashReport::default());
        }
        let prompt = format!("Permanently empty {}?", describe_dirs(&self.trash_dirs));
        if !confirm.confirm(&prompt) {
            return Err(Error::NotConfirmed);
        }
        Ok(orchestrator::reclaim_trash(
            self.services.fs,
            &self.trash_dirs,
            reporter,
        ))
    }

    fn resolve_section(&self, library: &str) -> Result<String, Error> {
        let libraries = self
            .services
            .inventory
            .list_libraries()
            .map_err(|e| match e {
                Error::SourceUnavailable(_) => e,
                other => Error::SourceUnavailable(other.to_string()),
            })?;
        libraries
            .get(library)
            .cloned()
            .ok_or_else(|| Error::LibraryNotFound(library.to_string()))
    }
}

fn describe_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
