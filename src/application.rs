//! Application layer - one synchronization run
//!
//! Builds the destination index, fans source pages out to the worker pool and
//! reconciles each show against the index.

pub mod index_builder;
pub mod page_pool;
pub mod reconciler;
pub mod sync_service;

pub use index_builder::{DestinationIndex, build_index, page_count};
pub use page_pool::{PagePool, PageProcessor};
pub use reconciler::Reconciler;
pub use sync_service::{CatalogPageProcessor, SyncService};
