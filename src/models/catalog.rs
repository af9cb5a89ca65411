use serde::{Deserialize, Serialize};

use crate::entities::catalog_entries;

/// Embedded reference to an episode inside a catalog entry. The position in
/// the parent's list defines previous/next adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub title: String,

    /// Relative episode slug, `/<seriesSlug>/<number>`.
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Free-text display attributes of a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub released: Option<String>,
    pub studio: Option<String>,
    pub producers: Option<String>,
    pub episode_total: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
    pub info: EntryInfo,
    pub genres: Vec<String>,
    pub episodes: Vec<EpisodeRef>,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<catalog_entries::Model> for CatalogEntry {
    fn from(model: catalog_entries::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            alt_title: model.alt_title,
            image_url: model.image_url,
            synopsis: model.synopsis,
            info: EntryInfo {
                kind: model.kind,
                status: model.status,
                released: model.released,
                studio: model.studio,
                producers: model.producers,
                episode_total: model.episode_total,
            },
            genres: serde_json::from_str(&model.genres).unwrap_or_default(),
            episodes: serde_json::from_str(&model.episodes).unwrap_or_default(),
            view_count: model.view_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl CatalogEntry {
    /// Position of an episode slug inside the embedded ordered list.
    #[must_use]
    pub fn episode_position(&self, episode_slug: &str) -> Option<usize> {
        self.episodes.iter().position(|ep| ep.url == episode_slug)
    }
}
