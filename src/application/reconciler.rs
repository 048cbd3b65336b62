//! Per-show reconciliation against the destination index
//!
//! - Present in the index: upload an image if the stored record has none,
//!   copy a changed title or summary, and write only when something changed.
//!   Genres are never compared on this path.
//! - Absent: upload the image (failure is tolerated) and always create.
//!
//! Uploads and writes run under the backoff policy. A write that still fails is
//! reported in the returned [`EntityReport`] and never stops the run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::index_builder::DestinationIndex;
use crate::domain::{EntityReport, ImageOutcome, Show, SyncOutcome};
use crate::infrastructure::backoff::BackoffPolicy;
use crate::infrastructure::content_store::ContentStore;

pub struct Reconciler {
    store: Arc<dyn ContentStore>,
    index: Arc<DestinationIndex>,
    retry: BackoffPolicy,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ContentStore>,
        index: Arc<DestinationIndex>,
        retry: BackoffPolicy,
        dry_run: bool,
    ) -> Self {
        Self {
            store,
            index,
            retry,
            dry_run,
        }
    }

    pub fn index(&self) -> &DestinationIndex {
        &self.index
    }

    pub async fn reconcile(&self, source: Show) -> EntityReport {
        match self.index.get(source.external_id) {
            Some(stored) => self.reconcile_existing(stored.clone(), &source).await,
            None => self.reconcile_missing(source).await,
        }
    }

    async fn reconcile_existing(&self, mut stored: Show, source: &Show) -> EntityReport {
        let external_id = source.external_id;
        let mut dirty = false;

        let image = if stored.needs_image() {
            let (key, outcome) = self.upload_image(source).await;
            if let Some(key) = key {
                stored.image_key = key;
                dirty = true;
            }
            outcome
        } else {
            ImageOutcome::NotNeeded
        };

        if stored.content_differs(source) {
            stored.title.clone_from(&source.title);
            stored.summary.clone_from(&source.summary);
            dirty = true;
        }

        if !dirty {
            debug!("Show {} unchanged", external_id);
            return EntityReport {
                external_id,
                outcome: SyncOutcome::Unchanged,
                image,
            };
        }

        let outcome = if self.dry_run {
            info!("[dry run] would update show {} ({})", external_id, stored.title);
            SyncOutcome::Updated
        } else {
            let operation = format!("update show {external_id}");
            let store = &self.store;
            let stored = &stored;
            match self
                .retry
                .execute(&operation, || store.update_show(stored))
                .await
            {
                Ok(()) => {
                    info!("✏️ Updated show {} ({})", external_id, stored.title);
                    SyncOutcome::Updated
                }
                Err(e) => {
                    warn!("❌ Failed to update show {}: {}", external_id, e);
                    SyncOutcome::Failed {
                        external_id,
                        reason: e.to_string(),
                    }
                }
            }
        };

        EntityReport {
            external_id,
            outcome,
            image,
        }
    }

    async fn reconcile_missing(&self, mut source: Show) -> EntityReport {
        let external_id = source.external_id;

        let (key, image) = self.upload_image(&source).await;
        if let Some(key) = key {
            source.image_key = key;
        }

        let outcome = if self.dry_run {
            info!("[dry run] would create show {} ({})", external_id, source.title);
            SyncOutcome::Created
        } else {
            let operation = format!("create show {external_id}");
            let store = &self.store;
            let source = &source;
            match self
                .retry
                .execute(&operation, || store.create_show(source))
                .await
            {
                Ok(()) => {
                    info!("➕ Created show {} ({})", external_id, source.title);
                    SyncOutcome::Created
                }
                Err(e) => {
                    warn!("❌ Failed to create show {}: {}", external_id, e);
                    SyncOutcome::Failed {
                        external_id,
                        reason: e.to_string(),
                    }
                }
            }
        };

        EntityReport {
            external_id,
            outcome,
            image,
        }
    }

    /// Upload `show`'s image under retry. Failure is reported, never propagated.
    async fn upload_image(&self, show: &Show) -> (Option<String>, ImageOutcome) {
        if self.dry_run {
            return (None, ImageOutcome::Skipped);
        }

        let operation = format!("upload image for show {}", show.external_id);
        let store = &self.store;
        let result = self
            .retry
            .execute(&operation, || {
                store.upload_image(&show.title, &show.image_source_url)
            })
            .await;

        match result {
            Ok(Some(key)) => (Some(key), ImageOutcome::Uploaded),
            Ok(None) => (None, ImageOutcome::Skipped),
            Err(e) => {
                warn!(
                    "🖼️ Image upload failed for show {}, continuing without it: {}",
                    show.external_id, e
                );
                (
                    None,
                    ImageOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
