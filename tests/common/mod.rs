//! In-memory source catalog and content store used by the integration tests
#![allow(dead_code)]

pub mod http_stub;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use show_sync_lib::domain::Show;
use show_sync_lib::infrastructure::backoff::BackoffPolicy;
use show_sync_lib::infrastructure::content_store::ContentStore;
use show_sync_lib::infrastructure::source_catalog::{SourceCatalog, SourcePage};
use show_sync_lib::infrastructure::sync_error::{SyncError, SyncResult};

pub fn fast_retry(attempts: u32) -> BackoffPolicy {
    BackoffPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(4))
}

fn server_error(url: &str) -> SyncError {
    SyncError::UnexpectedStatus {
        url: url.to_string(),
        status: 500,
    }
}

/// Content store backed by a map; created shows become readable on the next index build.
#[derive(Default)]
pub struct MemoryStore {
    pub page_size: u32,
    pub shows: Mutex<Vec<Show>>,
    pub page_requests: Mutex<Vec<u32>>,
    pub creates: Mutex<Vec<Show>>,
    pub updates: Mutex<Vec<Show>>,
    pub uploads: AtomicUsize,
    /// Pages that fail to load
    pub failing_pages: HashSet<u32>,
    /// External ids whose create/update always fails
    pub failing_writes: HashSet<i64>,
    /// Every upload attempt fails
    pub failing_uploads: bool,
    pub next_id: AtomicUsize,
}

impl MemoryStore {
    pub fn with_shows(shows: Vec<Show>) -> Self {
        Self {
            page_size: 250,
            shows: Mutex::new(shows),
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        self.create_count() + self.update_count()
    }

    pub fn reset_calls(&self) {
        self.page_requests.lock().unwrap().clear();
        self.creates.lock().unwrap().clear();
        self.updates.lock().unwrap().clear();
        self.uploads.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn total_items(&self) -> SyncResult<u64> {
        Ok(self.shows.lock().unwrap().len() as u64)
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch_page(&self, page: u32) -> SyncResult<Vec<Show>> {
        self.page_requests.lock().unwrap().push(page);
        if self.failing_pages.contains(&page) {
            return Err(server_error(&format!("children?page={page}")));
        }
        let size = self.page_size as usize;
        let start = (page as usize - 1) * size;
        Ok(self
            .shows
            .lock()
            .unwrap()
            .iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect())
    }

    async fn upload_image(&self, name: &str, source_url: &str) -> SyncResult<Option<String>> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
            return Ok(None);
        }
        if self.failing_uploads {
            return Err(server_error("media"));
        }
        Ok(Some(format!("media-{name}")))
    }

    async fn create_show(&self, show: &Show) -> SyncResult<()> {
        if self.failing_writes.contains(&show.external_id) {
            return Err(server_error("content"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = show.clone().with_destination_id(format!("new-{id}"));
        self.shows.lock().unwrap().push(stored);
        self.creates.lock().unwrap().push(show.clone());
        Ok(())
    }

    async fn update_show(&self, show: &Show) -> SyncResult<()> {
        if self.failing_writes.contains(&show.external_id) {
            return Err(server_error("content/id"));
        }
        let mut shows = self.shows.lock().unwrap();
        if let Some(slot) = shows
            .iter_mut()
            .find(|s| s.destination_id == show.destination_id)
        {
            *slot = show.clone();
        }
        self.updates.lock().unwrap().push(show.clone());
        Ok(())
    }
}

/// Catalog of fixed pages; any page index past the last one is end-of-data.
#[derive(Default)]
pub struct MemoryCatalog {
    pub pages: Vec<Vec<Show>>,
    pub failing_pages: HashSet<u32>,
    pub requests: Mutex<HashMap<u32, usize>>,
}

impl MemoryCatalog {
    pub fn new(pages: Vec<Vec<Show>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn requests_for(&self, page: u32) -> usize {
        self.requests.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    pub fn requested_pages(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceCatalog for MemoryCatalog {
    async fn fetch_page(&self, page: u32) -> SyncResult<SourcePage> {
        *self.requests.lock().unwrap().entry(page).or_default() += 1;
        if self.failing_pages.contains(&page) {
            return Err(server_error(&format!("shows?page={page}")));
        }
        Ok(match self.pages.get(page as usize) {
            Some(shows) => SourcePage::Shows(shows.clone()),
            None => SourcePage::EndOfData,
        })
    }
}

pub fn source_show(id: i64, title: &str) -> Show {
    Show::new(id, title)
        .with_summary(format!("<p>{title}</p>"))
        .with_image_source_url(format!("https://static.example.com/{id}.jpg"))
        .with_genre_titles(["Drama", "Thriller"])
}

/// The stored counterpart of `source_show`, as read back from the store.
pub fn stored_show(id: i64, title: &str) -> Show {
    Show::new(id, title)
        .with_summary(format!("<p>{title}</p>"))
        .with_destination_id(format!("d-{id}"))
        .with_image_key(format!("media-{title}"))
        .with_genre_titles(["Drama", "Thriller"])
}
