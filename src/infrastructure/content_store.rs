//! Content store client (headless CMS delivery + management API)
//!
//! Reads shows back page by page for the destination index and performs the
//! write side of a run: media upload, create and update.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::asset_uploader::AssetUploader;
use super::config::DestinationConfig;
use super::http_client::{HttpClient, HttpClientConfig, read_json, require_status};
use super::show_document::DocumentTemplate;
use super::sync_error::{SyncError, SyncResult};
use crate::domain::{ExternalId, Show, genres_from_titles};

pub const PROJECT_ALIAS_HEADER: &str = "umb-project-alias";
pub const API_KEY_HEADER: &str = "Api-Key";

/// Destination operations used by a run
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Number of shows stored under the root container.
    async fn total_items(&self) -> SyncResult<u64>;

    fn page_size(&self) -> u32;

    /// Fetch the 1-indexed page `page`.
    async fn fetch_page(&self, page: u32) -> SyncResult<Vec<Show>>;

    /// Returns the media key, or `None` when the image was skipped.
    async fn upload_image(&self, name: &str, source_url: &str) -> SyncResult<Option<String>>;

    async fn create_show(&self, show: &Show) -> SyncResult<()>;

    /// Update the record identified by `show.destination_id`.
    async fn update_show(&self, show: &Show) -> SyncResult<()>;
}

/// Root container discovered at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRoot {
    pub url: String,
    pub id: String,
}

impl DestinationRoot {
    /// Read the root link from the `content` listing: `_links.content[1].href`.
    pub fn from_listing(body: &Value) -> SyncResult<Self> {
        let href = body
            .pointer("/_links/content/1/href")
            .and_then(Value::as_str)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| SyncError::missing_field("_links.content[1].href", "content listing"))?;

        let id = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SyncError::missing_field("root id", href))?;

        Ok(Self {
            url: href.trim_end_matches('/').to_string(),
            id: id.to_string(),
        })
    }

    pub fn children_url(&self) -> String {
        format!("{}/children", self.url)
    }

    pub fn page_url(&self, page: u32, page_size: u32) -> String {
        format!("{}/children?page={}&pageSize={}", self.url, page, page_size)
    }
}

fn string_at<'a>(item: &'a Value, pointer: &str) -> Option<&'a str> {
    item.pointer(pointer).and_then(Value::as_str)
}

/// External id is stored either as a number or as a stringified number.
fn external_id_of(item: &Value) -> Option<ExternalId> {
    match item.pointer("/showId/$invariant")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Summary is written as a plain string but read back as `{ "markup": ... }`.
fn summary_of<'a>(item: &'a Value, language: &str) -> Option<&'a str> {
    let localized = item.get("showSummary")?.get(language)?;
    localized
        .get("markup")
        .and_then(Value::as_str)
        .or_else(|| localized.as_str())
}

/// Map `_embedded.content[]` of a children page to shows.
///
/// Items without a usable external id cannot be matched, and items without a
/// record id cannot be updated; both are skipped.
pub fn parse_store_page(body: &Value, language: &str) -> Vec<Show> {
    let Some(items) = body.pointer("/_embedded/content").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let Some(destination_id) = string_at(item, "/_id").filter(|id| !id.is_empty()) else {
                warn!("⚠️ Skipping stored item without a record id");
                return None;
            };
            let Some(external_id) = external_id_of(item) else {
                warn!("⚠️ Skipping stored item {} without a show id", destination_id);
                return None;
            };

            let genres = item
                .pointer("/genres/$invariant/contentData")
                .and_then(Value::as_array)
                .map(|blocks| {
                    genres_from_titles(blocks.iter().map(|block| {
                        block.get("title").and_then(Value::as_str).unwrap_or_default()
                    }))
                })
                .unwrap_or_default();

            let title = item
                .get("name")
                .and_then(|name| name.get(language))
                .and_then(Value::as_str)
                .unwrap_or_default();

            let mut show = Show::new(external_id, title)
                .with_destination_id(destination_id)
                .with_summary(summary_of(item, language).unwrap_or_default())
                .with_image_key(
                    string_at(item, "/showImage/$invariant/0/mediaKey").unwrap_or_default(),
                );
            show.genres = genres;
            Some(show)
        })
        .collect()
}

/// HTTP implementation of [`ContentStore`]
pub struct HeartcoreStore {
    http: HttpClient,
    uploader: AssetUploader,
    root: DestinationRoot,
    template: DocumentTemplate,
    content_url: String,
    page_size: u32,
    language: String,
}

impl HeartcoreStore {
    /// Build the clients and discover the root container.
    pub async fn connect(config: &DestinationConfig) -> SyncResult<Self> {
        url::Url::parse(&config.base_url).map_err(|e| SyncError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = HttpClient::new(&HttpClientConfig {
            timeout_seconds: config.request_timeout_seconds,
            max_requests_per_second: Some(config.max_requests_per_second),
            default_headers: vec![
                (PROJECT_ALIAS_HEADER.to_string(), config.project_alias.clone()),
                (API_KEY_HEADER.to_string(), config.api_key.clone()),
            ],
            ..Default::default()
        })?;
        let download = HttpClient::new(&HttpClientConfig {
            timeout_seconds: config.request_timeout_seconds,
            ..Default::default()
        })?;

        let content_url = config.endpoint("content");
        let listing: Value = http.get_json(&content_url).await?;
        let root = DestinationRoot::from_listing(&listing)?;
        info!("📁 Destination root {} ({})", root.id, root.url);

        Ok(Self::with_root(http, download, root, config))
    }

    /// Assemble a store around an already discovered root.
    pub fn with_root(
        http: HttpClient,
        download: HttpClient,
        root: DestinationRoot,
        config: &DestinationConfig,
    ) -> Self {
        let uploader = AssetUploader::new(
            download,
            http.clone(),
            config.endpoint("media"),
            config.image_extension.clone(),
        );
        Self {
            http,
            uploader,
            template: DocumentTemplate::new(root.id.clone(), config),
            root,
            content_url: config.endpoint("content"),
            page_size: config.page_size,
            language: config.language.clone(),
        }
    }

    async fn write(
        &self,
        method: Method,
        url: &str,
        show: &Show,
        expected: StatusCode,
    ) -> SyncResult<()> {
        let document = self.template.render(show);
        let request = self.http.request(method, url).json(&document);
        let response = self.http.send(url, request).await?;
        require_status(url, response, expected)?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for HeartcoreStore {
    async fn total_items(&self) -> SyncResult<u64> {
        let url = self.root.children_url();
        let body: Value = self.http.get_json(&url).await?;
        body.get("_totalItems")
            .and_then(Value::as_u64)
            .ok_or_else(|| SyncError::missing_field("_totalItems", &url))
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch_page(&self, page: u32) -> SyncResult<Vec<Show>> {
        let url = self.root.page_url(page, self.page_size);
        let response = self.http.send(&url, self.http.request(Method::GET, &url)).await?;
        let response = require_status(&url, response, StatusCode::OK)?;
        let body: Value = read_json(&url, response).await?;
        let shows = parse_store_page(&body, &self.language);
        debug!("Destination page {} decoded: {} shows", page, shows.len());
        Ok(shows)
    }

    async fn upload_image(&self, name: &str, source_url: &str) -> SyncResult<Option<String>> {
        self.uploader.upload(name, source_url).await
    }

    async fn create_show(&self, show: &Show) -> SyncResult<()> {
        self.write(Method::POST, &self.content_url, show, StatusCode::CREATED)
            .await
    }

    async fn update_show(&self, show: &Show) -> SyncResult<()> {
        if show.destination_id.is_empty() {
            return Err(SyncError::missing_field(
                "destination id",
                &format!("update of show {}", show.external_id),
            ));
        }
        let url = format!("{}/{}", self.content_url, show.destination_id);
        self.write(Method::PUT, &url, show, StatusCode::OK).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_is_second_content_link() {
        let listing = json!({
            "_links": {
                "content": [
                    { "href": "https://api.example.net/content/aaaa" },
                    { "href": "https://api.example.net/content/0c9b4c511b4e" }
                ]
            }
        });
        let root = DestinationRoot::from_listing(&listing).unwrap();
        assert_eq!(root.id, "0c9b4c511b4e");
        assert_eq!(
            root.page_url(2, 250),
            "https://api.example.net/content/0c9b4c511b4e/children?page=2&pageSize=250"
        );
        assert!(root.children_url().ends_with("/children"));
    }

    #[test]
    fn missing_root_link_is_an_error() {
        let listing = json!({ "_links": { "content": [ { "href": "only-one" } ] } });
        assert!(matches!(
            DestinationRoot::from_listing(&listing),
            Err(SyncError::MissingField { .. })
        ));
    }

    #[test]
    fn parses_children_page() {
        let body = json!({
            "_totalItems": 2,
            "_embedded": {
                "content": [
                    {
                        "_id": "d-1",
                        "showId": { "$invariant": "1" },
                        "name": { "en-US": "Under the Dome" },
                        "showSummary": { "en-US": { "markup": "<p>Dome</p>" } },
                        "genres": { "$invariant": { "contentData": [
                            { "title": "Drama" }, { "title": "Thriller" }
                        ] } },
                        "showImage": { "$invariant": [ { "mediaKey": "m-1" } ] }
                    },
                    {
                        "_id": "d-2",
                        "showId": { "$invariant": 2 },
                        "name": { "en-US": "Person of Interest" },
                        "showImage": { "$invariant": [] }
                    }
                ]
            }
        });
        let shows = parse_store_page(&body, "en-US");
        assert_eq!(shows.len(), 2);

        assert_eq!(shows[0].external_id, 1);
        assert_eq!(shows[0].destination_id, "d-1");
        assert_eq!(shows[0].summary, "<p>Dome</p>");
        assert_eq!(shows[0].image_key, "m-1");
        assert_eq!(shows[0].genres[1].title, "Thriller");
        assert_eq!(shows[0].genres[1].index, 1);

        assert_eq!(shows[1].external_id, 2);
        assert_eq!(shows[1].summary, "");
        assert!(shows[1].needs_image());
        assert!(shows[1].genres.is_empty());
    }

    #[test]
    fn items_without_show_id_are_skipped() {
        let body = json!({ "_embedded": { "content": [
            { "_id": "x", "name": { "en-US": "Orphan" } },
            { "_id": "y", "showId": { "$invariant": "not-a-number" } },
            { "_id": "z", "showId": { "$invariant": "5" } }
        ] } });
        let shows = parse_store_page(&body, "en-US");
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].destination_id, "z");
    }

    #[test]
    fn items_without_record_id_are_skipped() {
        let body = json!({ "_embedded": { "content": [
            { "showId": { "$invariant": 7 }, "name": { "en-US": "No id" } },
            { "_id": "", "showId": { "$invariant": 8 } },
            { "_id": "d-9", "showId": { "$invariant": 9 } }
        ] } });
        let shows = parse_store_page(&body, "en-US");
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].external_id, 9);
        assert!(shows.iter().all(|show| !show.destination_id.is_empty()));
    }

    #[test]
    fn page_without_embedded_content_is_empty() {
        assert!(parse_store_page(&json!({ "_totalItems": 0 }), "en-US").is_empty());
    }
}
