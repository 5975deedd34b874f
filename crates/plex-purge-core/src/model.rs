use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Value standing in for a missing critic or audience rating. A missing
/// rating must never look bad enough to trigger deletion.
pub const MAX_RATING: f64 = 10.0;

/// Parse a rating as the inventory reports it. Absent, empty and
/// unparseable values all map to `MAX_RATING`.
pub fn parse_rating(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, MAX_RATING))
        .unwrap_or(MAX_RATING)
}

/// Retention thresholds for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub library_name: String,
    pub min_age_days: u32,
    pub recently_watched_days: u32,
    pub recently_watched_enabled: bool,
    pub min_play_count: u64,
    pub rating_min: f64,
    pub audience_rating_min: f64,
    pub whitelist: BTreeSet<String>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            library_name: "Movies".to_string(),
            min_age_days: 180,
            recently_watched_days: 365,
            recently_watched_enabled: true,
            min_play_count: 1,
            rating_min: 7.0,
            audience_rating_min: 7.0,
            whitelist: BTreeSet::new(),
        }
    }
}

/// Summary record for one catalog row, as returned while paging a library.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub rating_key: String,
    pub title: String,
    pub sort_title: String,
    pub added_at: DateTime<Utc>,
    pub play_count: u64,
    pub last_played: Option<DateTime<Utc>>,
    pub file_size: u64,
}

/// The richer per-item document fetched on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetail {
    pub critic_rating: f64,
    pub audience_rating: f64,
    pub external_id: Option<String>,
    pub file_path: Option<PathBuf>,
    pub file_size: Option<u64>,
}

impl Default for MediaDetail {
    fn default() -> Self {
        Self {
            critic_rating: MAX_RATING,
            audience_rating: MAX_RATING,
            external_id: None,
            file_path: None,
            file_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionOutcome {
    Removed,
    NotFound,
    Error,
    NotAttempted,
}

impl fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeletionOutcome::Removed => "removed",
            DeletionOutcome::NotFound => "not_found",
            DeletionOutcome::Error => "error",
            DeletionOutcome::NotAttempted => "not_attempted",
        };
        f.write_str(label)
    }
}

/// Where an item sits in the deletion state machine.
///
/// `Pending → TrackerChecked → ManagerChecked → {Deleted, Unresolved}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    TrackerChecked,
    ManagerChecked,
    Deleted,
    Unresolved,
}

impl ItemState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Deleted | ItemState::Unresolved)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemState::Pending => "pending",
            ItemState::TrackerChecked => "tracker_checked",
            ItemState::ManagerChecked => "manager_checked",
            ItemState::Deleted => "deleted",
            ItemState::Unresolved => "unresolved",
        };
        f.write_str(label)
    }
}

/// Per-stage outcomes for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    pub tracker: DeletionOutcome,
    pub manager: DeletionOutcome,
    pub filesystem: DeletionOutcome,
    pub state: ItemState,
}

impl Default for Disposition {
    fn default() -> Self {
        Self {
            tracker: DeletionOutcome::NotAttempted,
            manager: DeletionOutcome::NotAttempted,
            filesystem: DeletionOutcome::NotAttempted,
            state: ItemState::Pending,
        }
    }
}

/// A catalog entry that failed every exemption.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub rating_key: String,
    pub title: String,
    pub sort_title: String,
    pub external_id: Option<String>,
    pub added_at: DateTime<Utc>,
    pub last_played: Option<DateTime<Utc>>,
    pub play_count: u64,
    pub critic_rating: f64,
    pub audience_rating: f64,
    pub file_path: Option<PathBuf>,
    pub file_size: u64,
    pub disposition: Disposition,
}

impl MediaItem {
    pub fn from_parts(entry: &CatalogEntry, detail: MediaDetail) -> Self {
        Self {
            rating_key: entry.rating_key.clone(),
            title: entry.title.clone(),
            sort_title: entry.sort_title.clone(),
            external_id: detail.external_id,
            added_at: entry.added_at,
            last_played: entry.last_played,
            play_count: entry.play_count,
            critic_rating: detail.critic_rating,
            audience_rating: detail.audience_rating,
            file_path: detail.file_path,
            file_size: detail.file_size.unwrap_or(entry.file_size),
            disposition: Disposition::default(),
        }
    }
}

/// Why an item was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExemptReason {
    Whitelisted,
    TooNew,
    Popular,
    RecentlyWatched,
    MissingMetadata,
    DetailUnavailable,
    WellRated,
}

impl fmt::Display for ExemptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExemptReason::Whitelisted => "whitelisted",
            ExemptReason::TooNew => "too new",
            ExemptReason::Popular => "popular",
            ExemptReason::RecentlyWatched => "recently watched",
            ExemptReason::MissingMetadata => "missing metadata",
            ExemptReason::DetailUnavailable => "detail unavailable",
            ExemptReason::WellRated => "well rated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Keep(ExemptReason),
    Blacklist(MediaItem),
}
