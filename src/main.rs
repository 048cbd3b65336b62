//! show-sync: one reconciliation pass from the show catalog into the content store

use anyhow::Context;
use tracing::{info, warn};

use show_sync_lib::infrastructure::{AppConfig, init_logging, log_system_info};
use show_sync_lib::SyncService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    log_system_info();

    info!(
        "🚀 Show sync starting (workers: {}, max page: {})",
        config.workers.count, config.source.max_page
    );

    let service = SyncService::from_config(config)
        .await
        .context("Failed to connect to the content store")?;
    let summary = service.run().await.context("Sync run aborted")?;

    info!(
        "📊 Pages: {} processed, {} failed, {} past end",
        summary.pages_processed, summary.pages_failed, summary.pages_past_end
    );
    info!(
        "📊 Shows: {} created, {} updated, {} unchanged, {} failed",
        summary.created, summary.updated, summary.unchanged, summary.failed
    );
    info!(
        "📊 Images: {} uploaded, {} skipped, {} failed",
        summary.images_uploaded, summary.images_skipped, summary.images_failed
    );
    for (external_id, reason) in &summary.failures {
        warn!("Show {} was not written: {}", external_id, reason);
    }
    for (page, reason) in &summary.failed_pages {
        warn!("Page {} was skipped: {}", page, reason);
    }
    info!("✅ Done in {:?}", summary.elapsed);

    Ok(())
}
