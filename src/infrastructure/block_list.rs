//! Block-list serialization of genre lists
//!
//! The content store represents a repeated element type as two arrays that must
//! stay index-aligned: `layout` holds one reference per block and `contentData`
//! holds the block values, each repeating the same reference under `udi`.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::Genre;

pub const ELEMENT_UDI_PREFIX: &str = "umb://element/";

/// `umb://element/` followed by 32 lowercase hex digits.
pub fn element_udi() -> String {
    format!("{}{}", ELEMENT_UDI_PREFIX, Uuid::new_v4().simple())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockList {
    pub layout: BlockLayout,
    #[serde(rename = "contentData")]
    pub content_data: Vec<BlockContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockLayout {
    #[serde(rename = "Umbraco.BlockList")]
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    #[serde(rename = "contentUdi")]
    pub content_udi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockContent {
    #[serde(rename = "contentTypeAlias")]
    pub content_type_alias: String,
    pub udi: String,
    /// Position in the genre list, as a string
    #[serde(rename = "indexNumber")]
    pub index_number: String,
    pub title: String,
}

impl BlockList {
    /// Serialize `genres` in list order. Returns `None` for an empty list so the
    /// property is omitted from the document instead of sent as empty arrays.
    pub fn from_genres(genres: &[Genre], content_type_alias: &str) -> Option<Self> {
        if genres.is_empty() {
            return None;
        }

        let (entries, content_data): (Vec<_>, Vec<_>) = genres
            .iter()
            .map(|genre| {
                let udi = element_udi();
                (
                    LayoutEntry {
                        content_udi: udi.clone(),
                    },
                    BlockContent {
                        content_type_alias: content_type_alias.to_string(),
                        udi,
                        index_number: genre.index.to_string(),
                        title: genre.title.clone(),
                    },
                )
            })
            .unzip();

        Some(Self {
            layout: BlockLayout { entries },
            content_data,
        })
    }

    pub fn len(&self) -> usize {
        self.content_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_data.is_empty()
    }
}
