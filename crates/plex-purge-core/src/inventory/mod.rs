pub mod tautulli;

use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::error::Error;
use crate::model::{CatalogEntry, MediaDetail};

pub use tautulli::TautulliClient;

/// Read side of the metadata service.
pub trait Inventory {
    /// Library name → section id.
    fn list_libraries(&self) -> Result<BTreeMap<String, String>, Error>;

    /// One page of summary records. An empty page marks the end of the catalog.
    fn fetch_page(
        &self,
        section_id: &str,
        start: usize,
        length: usize,
        refresh: bool,
    ) -> Result<Vec<CatalogEntry>, Error>;

    /// Detail record for one item, `None` when the service no longer knows it.
    fn fetch_detail(&self, rating_key: &str) -> Result<Option<MediaDetail>, Error>;
}

/// Lazy, finite iterator over every summary record of one library section.
///
/// Pages are fetched one at a time as the iterator drains; iteration ends at
/// the first empty page or the first failed fetch (yielded as `Err`).
pub struct CatalogPages<'a> {
    inventory: &'a dyn Inventory,
    section_id: String,
    page_size: usize,
    offset: usize,
    refresh: bool,
    buffer: VecDeque<CatalogEntry>,
    seen: HashSet<String>,
    finished: bool,
}

impl<'a> CatalogPages<'a> {
    pub fn new(inventory: &'a dyn Inventory, section_id: &str, page_size: usize) -> Self {
        Self::starting_at(inventory, section_id, page_size, 0)
    }

    /// Resume paging from a row offset.
    pub fn starting_at(
        inventory: &'a dyn Inventory,
        section_id: &str,
        page_size: usize,
        offset: usize,
    ) -> Self {
        Self {
            inventory,
            section_id: section_id.to_string(),
            page_size: page_size.max(1),
            offset,
            refresh: false,
            buffer: VecDeque::new(),
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Ask the service to rebuild its catalog cache with the first page.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Row offset of the next page to fetch.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for CatalogPages<'_> {
    type Item = Result<CatalogEntry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                // The catalog can change between pages, shifting rows across
                // page boundaries.
                if !self.seen.insert(entry.rating_key.clone()) {
                    warn!(
                        "'{}' (rating_key {}) returned twice while paging; catalog changed mid-run",
                        entry.title, entry.rating_key
                    );
                    continue;
                }
                return Some(Ok(entry));
            }

            if self.finished {
                return None;
            }

            debug!(
                "Fetching catalog page: section {} start {} length {}",
                self.section_id, self.offset, self.page_size
            );
            match self.inventory.fetch_page(
                &self.section_id,
                self.offset,
                self.page_size,
                self.refresh,
            ) {
                Ok(page) if page.is_empty() => {
                    self.finished = true;
                    return None;
                }
                Ok(page) => {
                    self.refresh = false;
                    self.offset += page.len();
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
