//! Image upload into the content store's media library
//!
//! Downloads the image from its public URL and re-posts it as a multipart
//! media item. URLs the downloader cannot handle yield `Ok(None)` so the
//! backoff executor does not retry them.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{
    Method, StatusCode,
    multipart::{Form, Part},
};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use super::http_client::{HttpClient, read_json, require_status};
use super::sync_error::{SyncError, SyncResult};

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F]+"#).unwrap_or_else(|e| panic!("file name pattern: {e}"))
});

const IMAGE_MIME: &str = "image/jpeg";

/// Replace characters that are not allowed in file names with `_` and append `extension`.
pub fn sanitize_file_name(name: &str, extension: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(name.trim(), "_");
    let stem = match cleaned.as_ref() {
        "" | "." | ".." => "_",
        other => other,
    };
    format!("{stem}{extension}")
}

/// Whether the downloader can fetch `source_url` at all.
pub fn is_supported_source(source_url: &str) -> bool {
    Url::parse(source_url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn media_metadata(file_name: &str) -> Value {
    json!({
        "mediaTypeAlias": "Image",
        "name": file_name,
        "umbracoFile": { "src": file_name },
    })
}

pub struct AssetUploader {
    download: HttpClient,
    store: HttpClient,
    media_url: String,
    extension: String,
}

impl AssetUploader {
    /// `download` fetches public images; `store` carries the auth headers.
    pub fn new(
        download: HttpClient,
        store: HttpClient,
        media_url: String,
        extension: String,
    ) -> Self {
        Self {
            download,
            store,
            media_url,
            extension,
        }
    }

    /// Upload the image at `source_url` named after `name`.
    ///
    /// `Ok(None)` means the image was skipped (empty or unsupported URL).
    pub async fn upload(&self, name: &str, source_url: &str) -> SyncResult<Option<String>> {
        if !is_supported_source(source_url) {
            debug!("Skipping image for '{}': unsupported URL '{}'", name, source_url);
            return Ok(None);
        }

        let file_name = sanitize_file_name(name, &self.extension);
        let image = self.download.get_bytes(source_url).await?;
        debug!("Downloaded {} bytes for {}", image.len(), file_name);

        let file_part = Part::bytes(image)
            .file_name(file_name.clone())
            .mime_str(IMAGE_MIME)
            .map_err(|e| SyncError::transport(&self.media_url, e))?;
        let form = Form::new()
            .text("content", media_metadata(&file_name).to_string())
            .part("umbracoFile", file_part);

        let request = self
            .store
            .request(Method::POST, &self.media_url)
            .multipart(form);
        let response = self.store.send(&self.media_url, request).await?;
        let response = require_status(&self.media_url, response, StatusCode::CREATED)?;
        let body: Value = read_json(&self.media_url, response).await?;

        let key = body
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SyncError::missing_field("_id", "media creation response"))?;

        info!("🖼️ Uploaded image {} as {}", file_name, key);
        Ok(Some(key.to_string()))
    }
}
