use serde::{Deserialize, Serialize};

use crate::entities::episodes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub host: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGroup {
    pub quality: String,
    pub links: Vec<DownloadLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub id: i32,
    pub slug: String,
    pub title: Option<String>,
    pub series_slug: String,
    pub series_title: Option<String>,
    pub series_image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub aired_label: Option<String>,
    pub streams: Vec<StreamLink>,
    pub downloads: Vec<DownloadGroup>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<episodes::Model> for EpisodeRecord {
    fn from(model: episodes::Model) -> Self {
        Self {
            id: model.id,
            slug: model.slug,
            title: model.title,
            series_slug: model.series_slug,
            series_title: model.series_title,
            series_image_url: model.series_image_url,
            thumbnail_url: model.thumbnail_url,
            aired_label: model.aired_label,
            streams: serde_json::from_str(&model.streams).unwrap_or_default(),
            downloads: serde_json::from_str(&model.downloads).unwrap_or_default(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
