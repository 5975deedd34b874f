use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::ManagerDeleteMode;
use crate::filesystem::Filesystem;
use crate::manager::AcquisitionManager;
use crate::model::{DeletionOutcome, ItemState, MediaItem};
use crate::progress::ProgressReporter;
use crate::tracker::RequestTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Tracker,
    Manager,
    Filesystem,
    Trash,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Tracker => "request tracker",
            Stage::Manager => "acquisition manager",
            Stage::Filesystem => "filesystem",
            Stage::Trash => "trash",
        };
        f.write_str(label)
    }
}

/// Outcome counts for one stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageTally {
    pub removed: usize,
    pub not_found: usize,
    pub error: usize,
    pub not_attempted: usize,
}

impl StageTally {
    pub fn record(&mut self, outcome: DeletionOutcome) {
        match outcome {
            DeletionOutcome::Removed => self.removed += 1,
            DeletionOutcome::NotFound => self.not_found += 1,
            DeletionOutcome::Error => self.error += 1,
            DeletionOutcome::NotAttempted => self.not_attempted += 1,
        }
    }

    pub fn from_outcomes(outcomes: impl IntoIterator<Item = DeletionOutcome>) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            tally.record(outcome);
        }
        tally
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionSummary {
    pub tracker: StageTally,
    pub manager: StageTally,
    pub filesystem: StageTally,
    pub deleted: usize,
    pub unresolved: usize,
}

impl DeletionSummary {
    pub fn from_items(items: &[MediaItem]) -> Self {
        Self {
            tracker: StageTally::from_outcomes(items.iter().map(|i| i.disposition.tracker)),
            manager: StageTally::from_outcomes(items.iter().map(|i| i.disposition.manager)),
            filesystem: StageTally::from_outcomes(
                items.iter().map(|i| i.disposition.filesystem),
            ),
            deleted: items
                .iter()
                .filter(|i| i.disposition.state == ItemState::Deleted)
                .count(),
            unresolved: items
                .iter()
                .filter(|i| i.disposition.state == ItemState::Unresolved)
                .count(),
        }
    }
}

/// Drives blacklisted items through the request tracker, the acquisition
/// manager and, only for items the manager does not know, the filesystem.
pub struct DeletionOrchestrator<'a> {
    tracker: &'a dyn RequestTracker,
    manager: &'a dyn AcquisitionManager,
    fs: &'a dyn Filesystem,
    delete_mode: ManagerDeleteMode,
}

impl<'a> DeletionOrchestrator<'a> {
    pub fn new(
        tracker: &'a dyn RequestTracker,
        manager: &'a dyn AcquisitionManager,
        fs: &'a dyn Filesystem,
    ) -> Self {
        Self {
            tracker,
            manager,
            fs,
            delete_mode: ManagerDeleteMode::default(),
        }
    }

    pub fn with_delete_mode(mut self, mode: ManagerDeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    /// Run stages A, B and C in order over the whole batch. Every item ends
    /// in a terminal state; no failure aborts the batch.
    pub fn run(&self, items: &mut [MediaItem], reporter: &dyn ProgressReporter) -> DeletionSummary {
        self.reconcile_tracker(items, reporter);
        self.remove_from_manager(items, reporter);
        self.remove_from_filesystem(items, reporter);

        let summary = DeletionSummary::from_items(items);
        info!(
            "Deletion finished: {} deleted, {} unresolved",
            summary.deleted, summary.unresolved
        );
        summary
    }

    /// Stage A. Cleans the tracker's index; never gates later stages.
    fn reconcile_tracker(&self, items: &mut [MediaItem], reporter: &dyn ProgressReporter) {
        let total = items.len();
        reporter.on_stage_start(Stage::Tracker, total);

        for (done, item) in items.iter_mut().enumerate() {
            item.disposition.tracker = match item.external_id.as_deref() {
                None => DeletionOutcome::NotFound,
                Some(external_id) => match self.tracker.find_by_external_id(external_id) {
                    Ok(Some(record)) => match self.tracker.delete(record.id) {
                        Ok(()) => {
                            debug!("Removed '{}' from request tracker", item.title);
                            DeletionOutcome::Removed
                        }
                        Err(e) => {
                            warn!("Request tracker removal failed for '{}': {}", item.title, e);
                            DeletionOutcome::Error
                        }
                    },
                    Ok(None) => DeletionOutcome::NotFound,
                    Err(e) => {
                        warn!("Request tracker lookup failed for '{}': {}", item.title, e);
                        DeletionOutcome::Error
                    }
                },
            };
            item.disposition.state = ItemState::TrackerChecked;
            reporter.on_stage_progress(Stage::Tracker, done + 1, total);
        }

        let tally = StageTally::from_outcomes(items.iter().map(|i| i.disposition.tracker));
        reporter.on_stage_complete(Stage::Tracker, &tally);
    }

    /// Stage B. Classifies every item before removing anything, so stage C
    /// only ever sees items confirmed absent from the manager.
    fn remove_from_manager(&self, items: &mut [MediaItem], reporter: &dyn ProgressReporter) {
        let total = items.len();
        reporter.on_stage_start(Stage::Manager, total);

        // (index into items, manager record id)
        let mut in_manager: Vec<(usize, i64)> = Vec::new();

        for (index, item) in items.iter_mut().enumerate() {
            let lookup = match item.external_id.as_deref() {
                None => Ok(None),
                Some(external_id) => self.manager.find_by_external_id(external_id),
            };
            match lookup {
                Ok(Some(record)) => in_manager.push((index, record.id)),
                Ok(None) => {
                    item.disposition.manager = DeletionOutcome::NotFound;
                    item.disposition.state = ItemState::ManagerChecked;
                }
                Err(e) => {
                    warn!("Acquisition manager lookup failed for '{}': {}", item.title, e);
                    item.disposition.manager = DeletionOutcome::Error;
                    item.disposition.state = ItemState::Unresolved;
                }
            }
            reporter.on_stage_progress(Stage::Manager, index + 1, total);
        }

        match self.delete_mode {
            ManagerDeleteMode::Batch => self.batch_remove(items, &in_manager),
            ManagerDeleteMode::PerItem => self.per_item_remove(items, &in_manager),
        }

        let tally = StageTally::from_outcomes(items.iter().map(|i| i.disposition.manager));
        reporter.on_stage_complete(Stage::Manager, &tally);
    }

    /// One call for the whole batch. A failure cannot be attributed to any
    /// single item, so every batched item is recorded as an error.
    fn batch_remove(&self, items: &mut [MediaItem], in_manager: &[(usize, i64)]) {
        if in_manager.is_empty() {
            return;
        }
        let ids: Vec<i64> = in_manager.iter().map(|(_, id)| *id).collect();
        let (outcome, state) = match self.manager.batch_delete(&ids, true) {
            Ok(()) => {
                info!("Removed {} items from acquisition manager", ids.len());
                (DeletionOutcome::Removed, ItemState::Deleted)
            }
            Err(e) => {
                error!(
                    "Acquisition manager batch removal of {} items failed: {}",
                    ids.len(),
                    e
                );
                (DeletionOutcome::Error, ItemState::Unresolved)
            }
        };
        for (index, _) in in_manager {
            let disposition = &mut items[*index].disposition;
            disposition.manager = outcome;
            disposition.filesystem = DeletionOutcome::NotAttempted;
            disposition.state = state;
        }
    }

    fn per_item_remove(&self, items: &mut [MediaItem], in_manager: &[(usize, i64)]) {
        for (index, id) in in_manager {
            let item = &mut items[*index];
            let (outcome, state) = match self.manager.delete(*id, true) {
                Ok(()) => {
                    debug!("Removed '{}' from acquisition manager", item.title);
                    (DeletionOutcome::Removed, ItemState::Deleted)
                }
                Err(e) => {
                    warn!("Acquisition manager removal failed for '{}': {}", item.title, e);
                    (DeletionOutcome::Error, ItemState::Unresolved)
                }
            };
            item.disposition.manager = outcome;
            item.disposition.filesystem = DeletionOutcome::NotAttempted;
            item.disposition.state = state;
        }
    }

    /// Stage C. Direct deletion for items the manager has no record of.
    fn remove_from_filesystem(&self, items: &mut [MediaItem], reporter: &dyn ProgressReporter) {
        let candidates = items
            .iter()
            .filter(|i| i.disposition.manager == DeletionOutcome::NotFound)
            .count();
        reporter.on_stage_start(Stage::Filesystem, candidates);

        let mut done = 0;
        for item in items
            .iter_mut()
            .filter(|i| i.disposition.manager == DeletionOutcome::NotFound)
        {
            let (outcome, state) = match item.file_path.as_deref() {
                Some(path) if self.fs.exists(path) => match self.fs.remove_file(path) {
                    Ok(()) => {
                        info!("Deleted '{}' from disk: {}", item.title, path.display());
                        (DeletionOutcome::Removed, ItemState::Deleted)
                    }
                    Err(e) => {
                        error!("Failed to delete '{}': {}", path.display(), e);
                        (DeletionOutcome::Error, ItemState::Unresolved)
                    }
                },
                Some(path) => {
                    warn!("'{}' not found on disk: {}", item.title, path.display());
                    (DeletionOutcome::NotFound, ItemState::Unresolved)
                }
                None => {
                    warn!("'{}' has no file path to delete", item.title);
                    (DeletionOutcome::NotFound, ItemState::Unresolved)
                }
            };
            item.disposition.filesystem = outcome;
            item.disposition.state = state;
            done += 1;
            reporter.on_stage_progress(Stage::Filesystem, done, candidates);
        }

        let tally = StageTally::from_outcomes(items.iter().map(|i| i.disposition.filesystem));
        reporter.on_stage_complete(Stage::Filesystem, &tally);
    }
}

/// Result of emptying the configured trash directories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrashReport {
    /// Directory and the bytes it held.
    pub removed: Vec<(PathBuf, u64)>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TrashReport {
    pub fn reclaimed_bytes(&self) -> u64 {
        self.removed.iter().map(|(_, bytes)| bytes).sum()
    }

    pub fn tally(&self) -> StageTally {
        StageTally {
            removed: self.removed.len(),
            not_found: self.missing.len(),
            error: self.failed.len(),
            not_attempted: 0,
        }
    }
}

/// Stage D. Recursively remove every trash directory. Failures are recorded
/// and the next directory is attempted.
pub fn reclaim_trash(
    fs: &dyn Filesystem,
    dirs: &[PathBuf],
    reporter: &dyn ProgressReporter,
) -> TrashReport {
    let mut report = TrashReport::default();
    reporter.on_stage_start(Stage::Trash, dirs.len());

    for (done, dir) in dirs.iter().enumerate() {
        empty_dir(fs, dir, &mut report);
        reporter.on_stage_progress(Stage::Trash, done + 1, dirs.len());
    }

    reporter.on_stage_complete(Stage::Trash, &report.tally());
    report
}

fn empty_dir(fs: &dyn Filesystem, dir: &Path, report: &mut TrashReport) {
    if !fs.exists(dir) {
        debug!("Trash directory {} does not exist", dir.display());
        report.missing.push(dir.to_path_buf());
        return;
    }
    let bytes = fs.dir_size(dir);
    match fs.remove_dir_all(dir) {
        Ok(()) => {
            info!("Emptied trash {} ({} bytes)", dir.display(), bytes);
            report.removed.push((dir.to_path_buf(), bytes));
        }
        Err(e) => {
            error!("Failed to remove trash {}: {}", dir.display(), e);
            report.failed.push((dir.to_path_buf(), e.to_string()));
        }
    }
}
