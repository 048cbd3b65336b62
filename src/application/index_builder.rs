//! Destination index: every stored show keyed by external id
//!
//! Built once before any page worker starts and shared read-only afterwards.
//! Any page failure aborts the build: reconciling against a partial index
//! would re-create shows that already exist.

use std::collections::HashMap;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::domain::{ExternalId, Show};
use crate::infrastructure::content_store::ContentStore;
use crate::infrastructure::sync_error::{SyncError, SyncResult};

/// Read-only snapshot of the content store
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    shows: HashMap<ExternalId, Show>,
}

impl DestinationIndex {
    pub fn get(&self, external_id: ExternalId) -> Option<&Show> {
        self.shows.get(&external_id)
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    /// Fold a page into the index. A later record with the same external id
    /// replaces the earlier one.
    fn absorb(&mut self, page: Vec<Show>) {
        for show in page {
            if let Some(previous) = self.shows.insert(show.external_id, show) {
                warn!(
                    "⚠️ Duplicate show id {} in destination, record {} is shadowed",
                    previous.external_id, previous.destination_id
                );
            }
        }
    }
}

impl FromIterator<Show> for DestinationIndex {
    fn from_iter<I: IntoIterator<Item = Show>>(iter: I) -> Self {
        let mut index = Self::default();
        index.absorb(iter.into_iter().collect());
        index
    }
}

/// Pages needed to read `total_items`: `total / size + 1`.
///
/// Always one more than the exact quotient, so an exact multiple reads one
/// trailing (empty) page.
pub fn page_count(total_items: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(total_items / size + 1).unwrap_or(u32::MAX)
}

/// Read every destination page (at most `concurrency` in flight) into one index.
pub async fn build_index(
    store: &dyn ContentStore,
    concurrency: usize,
) -> SyncResult<DestinationIndex> {
    let started = Instant::now();
    let total = store.total_items().await?;
    let pages = page_count(total, store.page_size());
    info!(
        "📥 Building destination index: {} items over {} pages",
        total, pages
    );

    // `buffered` yields in page order, so duplicates resolve deterministically
    let results: Vec<Vec<Show>> = stream::iter(1..=pages)
        .map(|page| async move {
            store
                .fetch_page(page)
                .await
                .map_err(|e| SyncError::IndexBuild {
                    page,
                    source: Box::new(e),
                })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut index = DestinationIndex::default();
    for page in results {
        index.absorb(page);
    }

    info!(
        "⏱️ Destination index built in {:?}: {} shows",
        started.elapsed(),
        index.len()
    );
    Ok(index)
}
