use indicatif::{HumanBytes, HumanDuration};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::Error;
use crate::evaluator::CatalogScan;
use crate::model::{DeletionOutcome, ExemptReason, ItemState, MediaItem};
use crate::orchestrator::{DeletionSummary, Stage, StageTally, TrashReport};

/// `part` as a percentage of `total`; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub library: String,
    pub dry_run: bool,
    pub total_media_count: usize,
    pub exemptions: BTreeMap<ExemptReason, usize>,
    /// Blacklisted items sorted by `sort_title`.
    pub blacklist: Vec<MediaItem>,
    /// Sum of blacklisted file sizes, computed before any deletion.
    pub reclaimable_bytes: u64,
    pub deletion: Option<DeletionSummary>,
    pub trash: Option<TrashReport>,
    pub duration: Duration,
}

impl RunReport {
    pub fn build(
        library: &str,
        scan: &CatalogScan,
        reclaimable_bytes: u64,
        items: &[MediaItem],
        deletion: Option<DeletionSummary>,
        trash: Option<TrashReport>,
        duration: Duration,
    ) -> Self {
        let mut blacklist = items.to_vec();
        blacklist.sort_by(|a, b| a.sort_title.cmp(&b.sort_title));

        Self {
            library: library.to_string(),
            dry_run: deletion.is_none(),
            total_media_count: scan.total_media_count,
            exemptions: scan.exemptions.clone(),
            blacklist,
            reclaimable_bytes,
            deletion,
            trash,
            duration,
        }
    }

    pub fn blacklist_count(&self) -> usize {
        self.blacklist.len()
    }

    pub fn blacklist_percent(&self) -> f64 {
        percentage(self.blacklist_count(), self.total_media_count)
    }

    pub fn tally(&self, stage: Stage) -> Option<StageTally> {
        match stage {
            Stage::Tracker => self.deletion.as_ref().map(|d| d.tracker),
            Stage::Manager => self.deletion.as_ref().map(|d| d.manager),
            Stage::Filesystem => self.deletion.as_ref().map(|d| d.filesystem),
            Stage::Trash => self.trash.as_ref().map(TrashReport::tally),
        }
    }

    /// Titles a stage could not resolve (outcome `error` or `not_found`).
    pub fn unresolved_titles(&self, stage: Stage) -> Vec<&str> {
        self.blacklist
            .iter()
            .filter(|item| {
                let outcome = match stage {
                    Stage::Tracker => item.disposition.tracker,
                    Stage::Manager => item.disposition.manager,
                    Stage::Filesystem => item.disposition.filesystem,
                    Stage::Trash => return false,
                };
                matches!(outcome, DeletionOutcome::Error | DeletionOutcome::NotFound)
            })
            .map(|item| item.title.as_str())
            .collect()
    }

    /// Titles whose deletion did not complete by any path.
    pub fn undeleted_titles(&self) -> Vec<&str> {
        self.blacklist
            .iter()
            .filter(|item| item.disposition.state == ItemState::Unresolved)
            .map(|item| item.title.as_str())
            .collect()
    }

    pub fn log_summary(&self) {
        info!(
            "Library '{}': {} items examined, {} blacklisted ({:.1}%), {} reclaimable",
            self.library,
            self.total_media_count,
            self.blacklist_count(),
            self.blacklist_percent(),
            HumanBytes(self.reclaimable_bytes),
        );
        for (reason, count) in &self.exemptions {
            info!("  kept {}: {}", reason, count);
        }
        for item in &self.blacklist {
            info!(
                "  {} ({}) [{}]",
                item.title,
                HumanBytes(item.file_size),
                item.disposition.state
            );
        }

        if self.dry_run {
            info!("Dry run: nothing was deleted");
        }
        for stage in [Stage::Tracker, Stage::Manager, Stage::Filesystem] {
            if let Some(tally) = self.tally(stage) {
                info!(
                    "{}: {} removed, {} not found, {} errors, {} not attempted",
                    stage, tally.removed, tally.not_found, tally.error, tally.not_attempted
                );
                let unresolved = self.unresolved_titles(stage);
                if !unresolved.is_empty() {
                    info!("  unresolved at {}: {}", stage, unresolved.join(", "));
                }
            }
        }
        let undeleted = self.undeleted_titles();
        if !self.dry_run && !undeleted.is_empty() {
            warn!("Not deleted: {}", undeleted.join(", "));
        }

        if let Some(trash) = &self.trash {
            info!(
                "Trash: {} directories emptied ({}), {} missing, {} failed",
                trash.removed.len(),
                HumanBytes(trash.reclaimed_bytes()),
                trash.missing.len(),
                trash.failed.len()
            );
            for (dir, reason) in &trash.failed {
                warn!("  {}: {}", dir.display(), reason);
            }
        }

        info!("Run took {}", HumanDuration(self.duration));
    }

    /// One row per blacklisted item, in `sort_title` order.
    pub fn write_csv(&self, path: &Path) -> Result<(), Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for item in &self.blacklist {
            writer.serialize(CsvRow::from(item))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    sort_title: &'a str,
    external_id: Option<&'a str>,
    added_at: String,
    last_played: Option<String>,
    play_count: u64,
    critic_rating: f64,
    audience_rating: f64,
    file_path: Option<&'a PathBuf>,
    file_size: u64,
    tracker: DeletionOutcome,
    manager: DeletionOutcome,
    filesystem: DeletionOutcome,
    state: ItemState,
}

impl<'a> From<&'a MediaItem> for CsvRow<'a> {
    fn from(item: &'a MediaItem) -> Self {
        Self {
            title: &item.title,
            sort_title: &item.sort_title,
            external_id: item.external_id.as_deref(),
            added_at: item.added_at.to_rfc3339(),
            last_played: item.last_played.map(|t| t.to_rfc3339()),
            play_count: item.play_count,
            critic_rating: item.critic_rating,
            audience_rating: item.audience_rating,
            file_path: item.file_path.as_ref(),
            file_size: item.file_size,
            tracker: item.disposition.tracker,
            manager: item.disposition.manager,
            filesystem: item.disposition.filesystem,
            state: item.disposition.state,
        }
    }
}
