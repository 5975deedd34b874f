#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use plex_purge_core::filesystem::{Filesystem, LocalFilesystem};
use plex_purge_core::inventory::Inventory;
use plex_purge_core::manager::{AcquisitionManager, ManagerRecord};
use plex_purge_core::model::{CatalogEntry, Disposition, MediaDetail, MediaItem, RetentionPolicy};
use plex_purge_core::tracker::{RequestTracker, TrackerRecord};
use plex_purge_core::Error;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    fixed_now() - Duration::days(days)
}

pub fn test_policy() -> RetentionPolicy {
    RetentionPolicy {
        library_name: "Movies".to_string(),
        min_age_days: 180,
        recently_watched_days: 365,
        recently_watched_enabled: true,
        min_play_count: 1,
        rating_min: 7.0,
        audience_rating_min: 7.0,
        whitelist: Default::default(),
    }
}

pub fn make_entry(rating_key: &str, title: &str, added_days_ago: i64) -> CatalogEntry {
    CatalogEntry {
        rating_key: rating_key.to_string(),
        title: title.to_string(),
        sort_title: title.to_string(),
        added_at: days_ago(added_days_ago),
        play_count: 0,
        last_played: None,
        file_size: 1_000,
    }
}

pub fn bad_detail(external_id: Option<&str>, path: Option<PathBuf>) -> MediaDetail {
    MediaDetail {
        critic_rating: 3.0,
        audience_rating: 2.0,
        external_id: external_id.map(str::to_string),
        file_path: path,
        file_size: Some(4_000),
    }
}

pub fn make_item(title: &str, external_id: Option<&str>, path: Option<PathBuf>) -> MediaItem {
    MediaItem {
        rating_key: title.to_lowercase(),
        title: title.to_string(),
        sort_title: title.to_string(),
        external_id: external_id.map(str::to_string),
        added_at: days_ago(400),
        last_played: None,
        play_count: 0,
        critic_rating: 3.0,
        audience_rating: 2.0,
        file_path: path,
        file_size: 4_000,
        disposition: Disposition::default(),
    }
}

/// In-memory inventory serving a fixed catalog.
#[derive(Default)]
pub struct FakeInventory {
    pub libraries: BTreeMap<String, String>,
    pub entries: Vec<CatalogEntry>,
    pub details: HashMap<String, MediaDetail>,
    pub detail_errors: HashSet<String>,
    pub unreachable: bool,
    pub fail_page_at: Option<usize>,
    pub page_requests: RefCell<Vec<(usize, usize, bool)>>,
    pub detail_requests: RefCell<Vec<String>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        let mut libraries = BTreeMap::new();
        libraries.insert("Movies".to_string(), "1".to_string());
        libraries.insert("TV Shows".to_string(), "2".to_string());
        Self {
            libraries,
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, entry: CatalogEntry, detail: Option<MediaDetail>) -> Self {
        if let Some(detail) = detail {
            self.details.insert(entry.rating_key.clone(), detail);
        }
        self.entries.push(entry);
        self
    }
}

impl Inventory for FakeInventory {
    fn list_libraries(&self) -> Result<BTreeMap<String, String>, Error> {
        if self.unreachable {
            return Err(Error::SourceUnavailable("connection refused".into()));
        }
        Ok(self.libraries.clone())
    }

    fn fetch_page(
        &self,
        _section_id: &str,
        start: usize,
        length: usize,
        refresh: bool,
    ) -> Result<Vec<CatalogEntry>, Error> {
        self.page_requests.borrow_mut().push((start, length, refresh));
        if self.fail_page_at == Some(start) {
            return Err(Error::Other("timed out".into()));
        }
        Ok(self.entries.iter().skip(start).take(length).cloned().collect())
    }

    fn fetch_detail(&self, rating_key: &str) -> Result<Option<MediaDetail>, Error> {
        self.detail_requests.borrow_mut().push(rating_key.to_string());
        if self.detail_errors.contains(rating_key) {
            return Err(Error::Other("metadata request failed".into()));
        }
        Ok(self.details.get(rating_key).cloned())
    }
}

/// In-memory request tracker keyed by external id.
#[derive(Default)]
pub struct FakeTracker {
    pub records: HashMap<String, i64>,
    pub lookup_errors: HashSet<String>,
    pub delete_errors: HashSet<i64>,
    pub deleted: RefCell<Vec<i64>>,
}

impl FakeTracker {
    pub fn with_record(mut self, external_id: &str, id: i64) -> Self {
        self.records.insert(external_id.to_string(), id);
        self
    }
}

impl RequestTracker for FakeTracker {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<TrackerRecord>, Error> {
        if self.lookup_errors.contains(external_id) {
            return Err(Error::Other("tracker unavailable".into()));
        }
        Ok(self.records.get(external_id).map(|id| TrackerRecord {
            id: *id,
            external_id: external_id.to_string(),
        }))
    }

    fn delete(&self, record_id: i64) -> Result<(), Error> {
        if self.delete_errors.contains(&record_id) {
            return Err(Error::Api {
                service: "overseerr",
                status: 500,
                body: "boom".into(),
            });
        }
        self.deleted.borrow_mut().push(record_id);
        Ok(())
    }
}

/// In-memory acquisition manager keyed by external id.
#[derive(Default)]
pub struct FakeManager {
    pub records: HashMap<String, i64>,
    pub lookup_errors: HashSet<String>,
    pub fail_batch: bool,
    pub fail_ids: HashSet<i64>,
    pub batches: RefCell<Vec<Vec<i64>>>,
    pub single_deletes: RefCell<Vec<i64>>,
}

impl FakeManager {
    pub fn with_record(mut self, external_id: &str, id: i64) -> Self {
        self.records.insert(external_id.to_string(), id);
        self
    }
}

impl AcquisitionManager for FakeManager {
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<ManagerRecord>, Error> {
        if self.lookup_errors.contains(external_id) {
            return Err(Error::Other("manager unavailable".into()));
        }
        Ok(self.records.get(external_id).map(|id| ManagerRecord {
            id: *id,
            title: external_id.to_string(),
            path: None,
            size_on_disk: 0,
        }))
    }

    fn batch_delete(&self, ids: &[i64], delete_files: bool) -> Result<(), Error> {
        assert!(delete_files, "manager removals must delete files");
        self.batches.borrow_mut().push(ids.to_vec());
        if self.fail_batch {
            return Err(Error::Api {
                service: "radarr",
                status: 500,
                body: "editor failed".into(),
            });
        }
        Ok(())
    }

    fn delete(&self, id: i64, delete_files: bool) -> Result<(), Error> {
        assert!(delete_files, "manager removals must delete files");
        self.single_deletes.borrow_mut().push(id);
        if self.fail_ids.contains(&id) {
            return Err(Error::Other(format!("movie {id} could not be removed")));
        }
        Ok(())
    }
}

/// Local filesystem that records every path it was asked to delete.
#[derive(Default)]
pub struct RecordingFilesystem {
    pub removed_files: RefCell<Vec<PathBuf>>,
    pub removed_dirs: RefCell<Vec<PathBuf>>,
}

impl Filesystem for RecordingFilesystem {
    fn exists(&self, path: &Path) -> bool {
        LocalFilesystem.exists(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.removed_files.borrow_mut().push(path.to_path_buf());
        LocalFilesystem.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.removed_dirs.borrow_mut().push(path.to_path_buf());
        LocalFilesystem.remove_dir_all(path)
    }

    fn dir_size(&self, path: &Path) -> u64 {
        LocalFilesystem.dir_size(path)
    }
}
