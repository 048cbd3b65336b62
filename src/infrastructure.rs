//! Infrastructure layer: configuration, logging, HTTP access and the two remote systems
//!
//! The source catalog and the content store are reached through the
//! [`SourceCatalog`] and [`ContentStore`] traits so the application layer can be
//! driven by in-memory implementations in tests.

pub mod asset_uploader;
pub mod backoff;
pub mod block_list;
pub mod config;
pub mod content_store;
pub mod http_client;
pub mod logging;
pub mod show_document;
pub mod source_catalog;
pub mod sync_error;

pub use backoff::BackoffPolicy;
pub use block_list::BlockList;
pub use config::{AppConfig, ConfigError};
pub use content_store::{ContentStore, DestinationRoot, HeartcoreStore};
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{init_logging, log_system_info};
pub use show_document::DocumentTemplate;
pub use source_catalog::{HttpSourceCatalog, SourceCatalog, SourcePage};
pub use sync_error::{SyncError, SyncResult};
