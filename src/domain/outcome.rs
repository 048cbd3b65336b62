//! Per-item results of a reconciliation run and their aggregate.
//!
//! Nothing in the pipeline aborts on a single entity or page failure; instead
//! every step reports one of these values and the worker pool folds them into
//! a [`RunSummary`].

use serde::Serialize;
use std::time::Duration;

use super::show::ExternalId;

/// What happened to the image of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImageOutcome {
    /// The destination record already has an image key.
    NotNeeded,
    /// An asset was uploaded and its key attached.
    Uploaded,
    /// No key obtained without an error (empty or unsupported URL, dry run).
    Skipped,
    /// Upload failed after all retry attempts.
    Failed { reason: String },
}

/// Decision and result for one source entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// Present in the destination and nothing to write.
    Unchanged,
    /// Present in the destination and updated.
    Updated,
    /// Absent from the destination and created.
    Created,
    /// Write failed after all retry attempts.
    Failed { external_id: ExternalId, reason: String },
}

/// Reconciliation result for a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub external_id: ExternalId,
    pub outcome: SyncOutcome,
    pub image: ImageOutcome,
}

/// Result of processing one source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PageOutcome {
    /// The page was fetched and each of its entities reconciled.
    Processed { page: u32, entities: Vec<EntityReport> },
    /// The source reported that no page with this index exists.
    EndOfData { page: u32 },
    /// The page could not be fetched or decoded; its entities were skipped.
    Failed { page: u32, reason: String },
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_processed: usize,
    pub pages_failed: usize,
    pub pages_past_end: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub images_uploaded: usize,
    pub images_skipped: usize,
    pub images_failed: usize,
    /// External ids whose write failed, with the reason.
    pub failures: Vec<(ExternalId, String)>,
    /// Pages that failed, with the reason.
    pub failed_pages: Vec<(u32, String)>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record_page(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Processed { entities, .. } => {
                self.pages_processed += 1;
                for report in entities {
                    self.record_entity(report);
                }
            }
            PageOutcome::EndOfData { .. } => self.pages_past_end += 1,
            PageOutcome::Failed { page, reason } => {
                self.pages_failed += 1;
                self.failed_pages.push((page, reason));
            }
        }
    }

    pub fn record_entity(&mut self, report: EntityReport) {
        match report.image {
            ImageOutcome::NotNeeded => {}
            ImageOutcome::Uploaded => self.images_uploaded += 1,
            ImageOutcome::Skipped => self.images_skipped += 1,
            ImageOutcome::Failed { .. } => self.images_failed += 1,
        }
        match report.outcome {
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Failed { external_id, reason } => {
                self.failed += 1;
                self.failures.push((external_id, reason));
            }
        }
    }

    pub fn merge(&mut self, mut other: RunSummary) {
        self.pages_processed += other.pages_processed;
        self.pages_failed += other.pages_failed;
        self.pages_past_end += other.pages_past_end;
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
        self.images_uploaded += other.images_uploaded;
        self.images_skipped += other.images_skipped;
        self.images_failed += other.images_failed;
        self.failures.append(&mut other.failures);
        self.failed_pages.append(&mut other.failed_pages);
    }

    /// Number of create and update requests that succeeded.
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}
