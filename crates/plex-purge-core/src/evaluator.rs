use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::error::Error;
use crate::inventory::{CatalogPages, Inventory};
use crate::model::{CatalogEntry, ExemptReason, MediaItem, Verdict};
use crate::progress::ProgressReporter;

/// Screens catalog entries against the run's retention policy.
///
/// Checks run cheapest first and stop at the first exemption. The detail
/// record is only fetched once every summary-level check has passed.
pub struct RetentionEvaluator<'a> {
    ctx: &'a RunContext,
}

impl<'a> RetentionEvaluator<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    pub fn evaluate(&self, entry: &CatalogEntry, inventory: &dyn Inventory) -> Verdict {
        if let Some(reason) = self.screen_summary(entry) {
            debug!("Keeping '{}': {}", entry.title, reason);
            return Verdict::Keep(reason);
        }

        let detail = match inventory.fetch_detail(&entry.rating_key) {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                info!(
                    "No metadata for '{}' (rating_key {}); assuming already removed",
                    entry.title, entry.rating_key
                );
                return Verdict::Keep(ExemptReason::MissingMetadata);
            }
            Err(e) => {
                warn!("Could not fetch metadata for '{}': {}", entry.title, e);
                return Verdict::Keep(ExemptReason::DetailUnavailable);
            }
        };

        let policy = &self.ctx.policy;
        if detail.critic_rating >= policy.rating_min
            || detail.audience_rating >= policy.audience_rating_min
        {
            debug!(
                "Keeping '{}': well rated (critic {}, audience {})",
                entry.title, detail.critic_rating, detail.audience_rating
            );
            return Verdict::Keep(ExemptReason::WellRated);
        }

        let item = MediaItem::from_parts(entry, detail);
        info!(
            "Blacklisting '{}': critic {}, audience {}, {} plays",
            item.title, item.critic_rating, item.audience_rating, item.play_count
        );
        Verdict::Blacklist(item)
    }

    /// Checks answerable from the summary record alone.
    fn screen_summary(&self, entry: &CatalogEntry) -> Option<ExemptReason> {
        let policy = &self.ctx.policy;

        if policy.whitelist.contains(&entry.title) {
            return Some(ExemptReason::Whitelisted);
        }
        if self.ctx.is_within_days(entry.added_at, policy.min_age_days) {
            return Some(ExemptReason::TooNew);
        }
        if entry.play_count >= policy.min_play_count {
            return Some(ExemptReason::Popular);
        }
        if policy.recently_watched_enabled {
            if let Some(last_played) = entry.last_played {
                if self.ctx.is_within_days(last_played, policy.recently_watched_days) {
                    return Some(ExemptReason::RecentlyWatched);
                }
            }
        }
        None
    }
}

/// Everything one pass over the catalog produced.
#[derive(Debug, Default, Clone)]
pub struct CatalogScan {
    pub total_media_count: usize,
    /// Blacklisted items in catalog order.
    pub blacklist: Vec<MediaItem>,
    pub exemptions: BTreeMap<ExemptReason, usize>,
}

impl CatalogScan {
    /// Projected reclamation: the sum of blacklisted file sizes, regardless
    /// of whether their deletion later succeeds.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.blacklist.iter().map(|item| item.file_size).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub page_size: usize,
    pub refresh_cache: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            page_size: 25,
            refresh_cache: false,
        }
    }
}

/// Page through one library section and evaluate every entry.
///
/// A failed page fetch aborts with `Error::SourceUnavailable`: nothing has
/// been deleted at this point, and a partial catalog would under-report.
pub fn scan_catalog(
    ctx: &RunContext,
    inventory: &dyn Inventory,
    section_id: &str,
    options: ScanOptions,
    reporter: &dyn ProgressReporter,
) -> Result<CatalogScan, Error> {
    let evaluator = RetentionEvaluator::new(ctx);
    let mut scan = CatalogScan::default();
    let start = Instant::now();

    reporter.on_catalog_start(&ctx.policy.library_name);

    let pages = CatalogPages::new(inventory, section_id, options.page_size)
        .with_refresh(options.refresh_cache);
    for entry in pages {
        let entry = entry.map_err(|e| Error::SourceUnavailable(e.to_string()))?;
        scan.total_media_count += 1;

        match evaluator.evaluate(&entry, inventory) {
            Verdict::Keep(reason) => *scan.exemptions.entry(reason).or_insert(0) += 1,
            Verdict::Blacklist(item) => scan.blacklist.push(item),
        }

        reporter.on_catalog_progress(scan.total_media_count, scan.blacklist.len(), &entry.title);
    }

    reporter.on_catalog_complete(
        scan.total_media_count,
        scan.blacklist.len(),
        start.elapsed().as_secs_f64(),
    );
    Ok(scan)
}
