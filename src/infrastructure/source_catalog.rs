//! Source catalog fetcher
//!
//! Pages are 0-indexed (`{base}?page={n}`) and come back as a flat JSON array.
//! A 404 on a page means there is no more data; it is reported as
//! [`SourcePage::EndOfData`], never as an error.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::config::SourceConfig;
use super::http_client::{HttpClient, HttpClientConfig, require_success};
use super::sync_error::{SyncError, SyncResult};
use crate::domain::{ExternalId, Show};

/// One page of the source catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePage {
    Shows(Vec<Show>),
    EndOfData,
}

#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Fetch and decode the 0-indexed page `page`.
    async fn fetch_page(&self, page: u32) -> SyncResult<SourcePage>;
}

#[derive(Debug, Deserialize)]
struct CatalogShow {
    id: ExternalId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    image: Option<CatalogImage>,
    #[serde(default)]
    genres: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CatalogImage {
    #[serde(default)]
    medium: Option<String>,
}

impl From<CatalogShow> for Show {
    fn from(raw: CatalogShow) -> Self {
        let image_url = raw.image.and_then(|image| image.medium).unwrap_or_default();
        Show::new(raw.id, raw.name.unwrap_or_default())
            .with_summary(raw.summary.unwrap_or_default())
            .with_image_source_url(image_url)
            .with_genre_titles(raw.genres.unwrap_or_default())
    }
}

/// Map a decoded catalog page to shows, preserving order.
pub fn parse_catalog_page(url: &str, body: &[u8]) -> SyncResult<Vec<Show>> {
    let raw: Vec<CatalogShow> =
        serde_json::from_slice(body).map_err(|e| SyncError::decode(url, e))?;
    Ok(raw.into_iter().map(Show::from).collect())
}

/// HTTP implementation against the public show catalog
pub struct HttpSourceCatalog {
    http: HttpClient,
    base_url: String,
}

impl HttpSourceCatalog {
    pub fn new(config: &SourceConfig) -> SyncResult<Self> {
        Url::parse(&config.base_url).map_err(|e| SyncError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = HttpClient::new(&HttpClientConfig {
            timeout_seconds: config.request_timeout_seconds,
            ..Default::default()
        })?;
        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        format!("{}?page={}", self.base_url, page)
    }
}

#[async_trait]
impl SourceCatalog for HttpSourceCatalog {
    async fn fetch_page(&self, page: u32) -> SyncResult<SourcePage> {
        let url = self.page_url(page);
        let response = self
            .http
            .send(&url, self.http.request(Method::GET, &url))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Source page {} not found, end of catalog", page);
            return Ok(SourcePage::EndOfData);
        }

        let body = require_success(&url, response)?
            .bytes()
            .await
            .map_err(|e| SyncError::transport(&url, e))?;
        let shows = parse_catalog_page(&url, &body)?;
        debug!("Source page {} decoded: {} shows", page, shows.len());
        Ok(SourcePage::Shows(shows))
    }
}
