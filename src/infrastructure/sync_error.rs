//! Error taxonomy of the synchronization pipeline
//!
//! Failures are classified by the operation that raises them. The backoff
//! executor never looks inside an error; it retries whatever it is given.

use thiserror::Error;

use super::config::ConfigError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("HTTP client setup failed: {reason}")]
    ClientSetup { reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Required field '{field}' missing in {context}")]
    MissingField { field: String, context: String },

    #[error("all {attempts} retry attempts failed for {operation}: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        last: Box<SyncError>,
    },

    #[error("Destination index build failed on page {page}: {source}")]
    IndexBuild {
        page: u32,
        #[source]
        source: Box<SyncError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub fn unexpected_status(url: &str, status: reqwest::StatusCode) -> Self {
        Self::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }

    pub fn decode(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_field(field: &str, context: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
            context: context.to_string(),
        }
    }
}
