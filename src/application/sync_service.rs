//! One end-to-end synchronization run
//!
//! 1. Build the destination index (fatal on failure)
//! 2. Stream source pages through the worker pool
//! 3. Reconcile each show of a page in order
//!
//! The merged [`RunSummary`] is returned to the caller.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use super::index_builder::build_index;
use super::page_pool::{PagePool, PageProcessor};
use super::reconciler::Reconciler;
use crate::domain::{PageOutcome, RunSummary};
use crate::infrastructure::backoff::BackoffPolicy;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::content_store::{ContentStore, HeartcoreStore};
use crate::infrastructure::source_catalog::{HttpSourceCatalog, SourceCatalog, SourcePage};
use crate::infrastructure::sync_error::SyncResult;

/// Fetches a source page (with retry) and reconciles its shows sequentially.
pub struct CatalogPageProcessor {
    source: Arc<dyn SourceCatalog>,
    reconciler: Reconciler,
    retry: BackoffPolicy,
}

impl CatalogPageProcessor {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        reconciler: Reconciler,
        retry: BackoffPolicy,
    ) -> Self {
        Self {
            source,
            reconciler,
            retry,
        }
    }
}

#[async_trait]
impl PageProcessor for CatalogPageProcessor {
    async fn process(&self, page: u32) -> PageOutcome {
        let operation = format!("fetch source page {page}");
        let source = &self.source;
        let fetched = self
            .retry
            .execute(&operation, || source.fetch_page(page))
            .await;

        match fetched {
            Ok(SourcePage::EndOfData) => {
                info!("🏁 Source page {} is past the end of the catalog", page);
                PageOutcome::EndOfData { page }
            }
            Ok(SourcePage::Shows(shows)) => {
                let mut entities = Vec::with_capacity(shows.len());
                for show in shows {
                    entities.push(self.reconciler.reconcile(show).await);
                }
                PageOutcome::Processed { page, entities }
            }
            Err(e) => {
                warn!("❌ Source page {} could not be fetched: {}", page, e);
                PageOutcome::Failed {
                    page,
                    reason: e.to_string(),
                }
            }
        }
    }
}

pub struct SyncService {
    config: AppConfig,
    source: Arc<dyn SourceCatalog>,
    store: Arc<dyn ContentStore>,
}

impl SyncService {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn SourceCatalog>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    /// Build the HTTP clients and discover the destination root.
    pub async fn from_config(config: AppConfig) -> SyncResult<Self> {
        let source = Arc::new(HttpSourceCatalog::new(&config.source)?);
        let store = Arc::new(HeartcoreStore::connect(&config.destination).await?);
        Ok(Self::new(config, source, store))
    }

    pub async fn run(&self) -> SyncResult<RunSummary> {
        let started = Instant::now();
        if self.config.dry_run {
            info!("🧪 Dry run: no images are uploaded and no shows are written");
        }

        let index = build_index(
            self.store.as_ref(),
            self.config.destination.index_fetch_concurrency,
        )
        .await?;

        let retry = BackoffPolicy::from_config(&self.config.retry);
        let reconciler = Reconciler::new(
            Arc::clone(&self.store),
            Arc::new(index),
            retry,
            self.config.dry_run,
        );
        let processor = Arc::new(CatalogPageProcessor::new(
            Arc::clone(&self.source),
            reconciler,
            retry,
        ));

        let pool = PagePool::from_config(&self.config.workers);
        let mut summary = pool.run(0..=self.config.source.max_page, processor).await;
        summary.elapsed = started.elapsed();

        info!(
            "⏱️ Sync finished in {:?}: {} created, {} updated, {} unchanged, {} failed, \
             {} pages failed",
            summary.elapsed,
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.failed,
            summary.pages_failed
        );
        Ok(summary)
    }
}
