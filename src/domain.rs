//! Domain module - shows, genres and reconciliation outcomes
//!
//! Modern Rust module organization:
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod outcome;
pub mod show;

pub use outcome::{EntityReport, ImageOutcome, PageOutcome, RunSummary, SyncOutcome};
pub use show::{ExternalId, Genre, Show, genres_from_titles};
