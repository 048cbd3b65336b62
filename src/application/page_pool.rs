//! Fixed-size worker pool over source page indices
//!
//! Page indices are dispatched in increasing order into a bounded queue shared
//! by `workers` long-lived tasks. Each worker processes one page to completion
//! before pulling the next. Completion order across workers is unordered.
//!
//! The first end-of-data page stops dispatching; pages already queued still
//! drain. A failed page is recorded and skipped without affecting siblings.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{PageOutcome, RunSummary};
use crate::infrastructure::config::WorkerConfig;

/// Work done for one page index
#[async_trait]
pub trait PageProcessor: Send + Sync {
    async fn process(&self, page: u32) -> PageOutcome;
}

#[derive(Debug, Clone, Copy)]
pub struct PagePool {
    workers: usize,
    queue_capacity: usize,
}

impl PagePool {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.count, config.effective_queue_capacity())
    }

    /// Process `pages` and return the merged summary once every dispatched page is done.
    pub async fn run(
        &self,
        pages: RangeInclusive<u32>,
        processor: Arc<dyn PageProcessor>,
    ) -> RunSummary {
        info!(
            "🚀 Starting {} workers for pages {}..={}",
            self.workers,
            pages.start(),
            pages.end()
        );

        let (sender, receiver) = mpsc::channel::<u32>(self.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let end_of_data = CancellationToken::new();

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&receiver),
                    Arc::clone(&processor),
                    end_of_data.clone(),
                ))
            })
            .collect();

        let mut dispatched = 0_u32;
        for page in pages {
            tokio::select! {
                biased;
                () = end_of_data.cancelled() => {
                    info!(
                        "🏁 End of source data reached, stopping dispatch after {} pages",
                        dispatched
                    );
                    break;
                }
                sent = sender.send(page) => {
                    if sent.is_err() {
                        warn!("Page queue closed early, stopping dispatch at page {}", page);
                        break;
                    }
                    dispatched += 1;
                }
            }
        }
        // Closing the queue lets workers exit once it is drained
        drop(sender);

        let mut summary = RunSummary::default();
        for result in futures::future::join_all(handles).await {
            match result {
                Ok(worker_summary) => summary.merge(worker_summary),
                Err(e) => warn!("❌ Page worker terminated abnormally: {}", e),
            }
        }

        info!("✅ All workers finished");
        summary
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<u32>>>,
    processor: Arc<dyn PageProcessor>,
    end_of_data: CancellationToken,
) -> RunSummary {
    debug!("👷 Worker {} started", worker_id);
    let mut summary = RunSummary::default();

    loop {
        let next = queue.lock().await.recv().await;
        let Some(page) = next else {
            break;
        };

        let started = Instant::now();
        let outcome = processor.process(page).await;
        match &outcome {
            PageOutcome::Processed { entities, .. } => info!(
                "⏱️ Worker {} processed page {} in {:?} ({} shows)",
                worker_id,
                page,
                started.elapsed(),
                entities.len()
            ),
            PageOutcome::EndOfData { .. } => end_of_data.cancel(),
            PageOutcome::Failed { reason, .. } => {
                warn!("❌ Worker {} skipped page {}: {}", worker_id, page, reason);
            }
        }
        summary.record_page(outcome);
    }

    debug!("👷 Worker {} finished", worker_id);
    summary
}
