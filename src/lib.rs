//! Show Sync - reconciles a paginated show catalog into a headless CMS
//!
//! Layers:
//! - `domain`: shows, genres and per-item outcomes
//! - `infrastructure`: configuration, logging, HTTP clients for both systems
//! - `application`: destination index, reconciliation and the page worker pool

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::SyncService;
pub use domain::RunSummary;
pub use infrastructure::{AppConfig, SyncError};
