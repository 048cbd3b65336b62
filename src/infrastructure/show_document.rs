//! Content document sent on create and update

use serde_json::{Map, Value, json};

use super::block_list::BlockList;
use super::config::DestinationConfig;
use crate::domain::Show;

/// Fixed parts of every show document
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    pub parent_id: String,
    pub language: String,
    pub content_type_alias: String,
    pub genre_content_type_alias: String,
}

impl DocumentTemplate {
    pub fn new(parent_id: impl Into<String>, config: &DestinationConfig) -> Self {
        Self {
            parent_id: parent_id.into(),
            language: config.language.clone(),
            content_type_alias: config.content_type_alias.clone(),
            genre_content_type_alias: config.genre_content_type_alias.clone(),
        }
    }

    /// Build the JSON document for `show`.
    ///
    /// `genres` is left out entirely when the show has none. `showImage` is an
    /// empty array until an image key is known.
    pub fn render(&self, show: &Show) -> Value {
        let mut doc = Map::new();
        doc.insert("parentId".into(), json!(self.parent_id));
        doc.insert("sortOrder".into(), json!(0));
        doc.insert("contentTypeAlias".into(), json!(self.content_type_alias));
        doc.insert("name".into(), self.localized(&show.title));
        doc.insert("showId".into(), json!({ "$invariant": show.external_id }));
        doc.insert("showSummary".into(), self.localized(&show.summary));

        if let Some(blocks) = BlockList::from_genres(&show.genres, &self.genre_content_type_alias) {
            doc.insert("genres".into(), json!({ "$invariant": blocks }));
        }

        let images = if show.image_key.is_empty() {
            json!([])
        } else {
            json!([{ "mediaKey": show.image_key }])
        };
        doc.insert("showImage".into(), json!({ "$invariant": images }));

        Value::Object(doc)
    }

    fn localized(&self, text: &str) -> Value {
        let mut map = Map::new();
        map.insert(self.language.clone(), json!(text));
        Value::Object(map)
    }
}
