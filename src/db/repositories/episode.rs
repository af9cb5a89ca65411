use crate::entities::{episodes, prelude::*};
use crate::models::{DownloadGroup, EpisodeRecord, StreamLink};
use crate::services::listing::{Page, paginate};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct NewEpisode {
    pub slug: String,
    pub title: Option<String>,
    pub series_slug: String,
    pub series_title: Option<String>,
    pub series_image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub aired_label: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched. Mirror lists
/// replace wholesale when present.
#[derive(Debug, Clone, Default)]
pub struct EpisodeUpdate {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub aired_label: Option<String>,
    pub streams: Option<Vec<StreamLink>>,
    pub downloads: Option<Vec<DownloadGroup>>,
}

pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, input: NewEpisode) -> Result<EpisodeRecord> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = episodes::ActiveModel {
            slug: Set(input.slug.clone()),
            title: Set(input.title),
            series_slug: Set(input.series_slug),
            series_title: Set(input.series_title),
            series_image_url: Set(input.series_image_url),
            thumbnail_url: Set(input.thumbnail_url),
            aired_label: Set(input.aired_label),
            streams: Set("[]".to_string()),
            downloads: Set("[]".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!("Added episode: {}", model.slug);
        Ok(model.into())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<EpisodeRecord>> {
        let model = self.find_model(slug).await?;
        Ok(model.map(EpisodeRecord::from))
    }

    pub async fn exists(&self, slug: &str) -> Result<bool> {
        Ok(self.find_model(slug).await?.is_some())
    }

    async fn find_model(&self, slug: &str) -> Result<Option<episodes::Model>> {
        Ok(Episodes::find()
            .filter(episodes::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?)
    }

    pub async fn update(&self, slug: &str, changes: EpisodeUpdate) -> Result<Option<EpisodeRecord>> {
        let Some(model) = self.find_model(slug).await? else {
            return Ok(None);
        };

        let mut active: episodes::ActiveModel = model.into();

        if let Some(title) = changes.title {
            active.title = Set(Some(title));
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            active.thumbnail_url = Set(Some(thumbnail_url));
        }
        if let Some(aired_label) = changes.aired_label {
            active.aired_label = Set(Some(aired_label));
        }
        if let Some(streams) = changes.streams {
            active.streams = Set(serde_json::to_string(&streams)?);
        }
        if let Some(downloads) = changes.downloads {
            active.downloads = Set(serde_json::to_string(&downloads)?);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        info!("Updated episode: {}", slug);
        Ok(Some(model.into()))
    }

    pub async fn remove(&self, slug: &str) -> Result<bool> {
        let result = Episodes::delete_many()
            .filter(episodes::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed episode: {}", slug);
        }
        Ok(removed)
    }

    /// Append one mirror produced by the remote-upload pipeline.
    pub async fn push_mirror(
        &self,
        slug: &str,
        stream: StreamLink,
        download: DownloadGroup,
    ) -> Result<bool> {
        let Some(model) = self.find_model(slug).await? else {
            return Ok(false);
        };

        let record = EpisodeRecord::from(model.clone());
        let mut streams = record.streams;
        let mut downloads = record.downloads;
        streams.push(stream);
        downloads.push(download);

        let mut active: episodes::ActiveModel = model.into();
        active.streams = Set(serde_json::to_string(&streams)?);
        active.downloads = Set(serde_json::to_string(&downloads)?);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;
        Ok(true)
    }

    /// Strip every stream whose name, and every download group whose
    /// quality, appears in the given sets. Returns how many episodes
    /// changed. Runs row-by-row over the full table; there is no streaming
    /// or backpressure here, mirroring the bulk admin semantics.
    pub async fn clear_mirrors(&self, names: &[&str], qualities: &[&str]) -> Result<u64> {
        let models = Episodes::find().all(&self.conn).await?;
        let mut modified = 0;

        for model in models {
            let record = EpisodeRecord::from(model.clone());

            let streams: Vec<StreamLink> = record
                .streams
                .iter()
                .filter(|s| !names.contains(&s.name.as_str()))
                .cloned()
                .collect();
            let downloads: Vec<DownloadGroup> = record
                .downloads
                .iter()
                .filter(|d| !qualities.contains(&d.quality.as_str()))
                .cloned()
                .collect();

            if streams.len() == record.streams.len() && downloads.len() == record.downloads.len() {
                continue;
            }

            let mut active: episodes::ActiveModel = model.into();
            active.streams = Set(serde_json::to_string(&streams)?);
            active.downloads = Set(serde_json::to_string(&downloads)?);
            active.updated_at = Set(chrono::Utc::now().to_rfc3339());
            active.update(&self.conn).await?;
            modified += 1;
        }

        info!("Cleared mirrors on {} episodes", modified);
        Ok(modified)
    }

    pub async fn list_page(
        &self,
        select: Select<Episodes>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<EpisodeRecord>> {
        let models = paginate(&self.conn, select, page, per_page).await?;
        Ok(models.map(EpisodeRecord::from))
    }

    #[must_use]
    pub fn newest_first() -> Select<Episodes> {
        Episodes::find().order_by_desc(episodes::Column::Id)
    }

    #[must_use]
    pub fn recently_updated() -> Select<Episodes> {
        Episodes::find().order_by_desc(episodes::Column::UpdatedAt)
    }

    pub async fn for_series(&self, series_slug: &str) -> Result<Vec<EpisodeRecord>> {
        let models = Episodes::find()
            .filter(episodes::Column::SeriesSlug.eq(series_slug))
            .order_by_asc(episodes::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(models.into_iter().map(EpisodeRecord::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Episodes::find().count(&self.conn).await?)
    }
}
