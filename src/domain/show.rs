//! Show entity shared by the source catalog and the content store.

use serde::{Deserialize, Serialize};

/// Identity assigned by the source catalog. Join key for reconciliation.
pub type ExternalId = i64;

/// A genre entry of a show. `index` is the display position in the owning list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub index: usize,
    pub title: String,
}

/// Canonical show, the unit of synchronization.
///
/// The same type is produced by both fetchers:
/// - from the source catalog, `image_source_url` holds a URL and `destination_id`
///   and `image_key` are empty;
/// - from the content store, `destination_id` and (if uploaded) `image_key` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub external_id: ExternalId,
    pub destination_id: String,
    pub title: String,
    pub summary: String,
    pub image_source_url: String,
    pub image_key: String,
    pub genres: Vec<Genre>,
}

impl Show {
    pub fn new(external_id: ExternalId, title: impl Into<String>) -> Self {
        Self {
            external_id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_image_source_url(mut self, url: impl Into<String>) -> Self {
        self.image_source_url = url.into();
        self
    }

    pub fn with_image_key(mut self, key: impl Into<String>) -> Self {
        self.image_key = key.into();
        self
    }

    pub fn with_destination_id(mut self, id: impl Into<String>) -> Self {
        self.destination_id = id.into();
        self
    }

    /// Replaces the genre list, re-numbering so that `genres[i].index == i`.
    pub fn with_genre_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres_from_titles(titles);
        self
    }

    /// Whether the stored record still lacks an uploaded image.
    pub fn needs_image(&self) -> bool {
        self.image_key.is_empty()
    }

    /// Title or summary differs from `other`. Genres are deliberately not compared.
    pub fn content_differs(&self, other: &Show) -> bool {
        self.title != other.title || self.summary != other.summary
    }
}

/// Builds a freshly indexed genre list from an ordered sequence of titles.
pub fn genres_from_titles<I, S>(titles: I) -> Vec<Genre>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    titles
        .into_iter()
        .enumerate()
        .map(|(index, title)| Genre {
            index,
            title: title.into(),
        })
        .collect()
}
