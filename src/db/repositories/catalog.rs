use crate::constants::{SERIES_PREFIX, WATCH_PREFIX, pagination};
use crate::entities::{bookmarks, catalog_entries, episodes, prelude::*, reports};
use crate::models::{CatalogEntry, EntryInfo, EpisodeRef};
use crate::services::listing::{Page, paginate};
use anyhow::Result;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::info;

/// Admin-supplied fields for a new catalog entry. The slug is the immutable
/// identity key and must be unique.
#[derive(Debug, Clone, Default)]
pub struct NewCatalogEntry {
    pub slug: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
    pub info: EntryInfo,
    pub genres: Vec<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CatalogEntryUpdate {
    pub title: Option<String>,
    pub alt_title: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub released: Option<String>,
    pub studio: Option<String>,
    pub producers: Option<String>,
    pub episode_total: Option<String>,
    pub genres: Option<Vec<String>>,
}

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

fn normalized(value: &str) -> String {
    value.to_lowercase()
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, input: NewCatalogEntry) -> Result<CatalogEntry> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = catalog_entries::ActiveModel {
            slug: Set(input.slug.clone()),
            title: Set(input.title.clone()),
            title_search: Set(normalized(&input.title)),
            alt_title: Set(input.alt_title),
            image_url: Set(input.image_url),
            synopsis: Set(input.synopsis),
            kind: Set(input.info.kind.clone()),
            kind_search: Set(input.info.kind.as_deref().map(normalized)),
            status: Set(input.info.status.clone()),
            status_search: Set(input.info.status.as_deref().map(normalized)),
            studio: Set(input.info.studio.clone()),
            studio_search: Set(input.info.studio.as_deref().map(normalized)),
            producers: Set(input.info.producers),
            released: Set(input.info.released),
            episode_total: Set(input.info.episode_total),
            genres: Set(serde_json::to_string(&input.genres)?),
            episodes: Set("[]".to_string()),
            view_count: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!("Added catalog entry: {}", model.slug);
        Ok(model.into())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CatalogEntry>> {
        let model = CatalogEntries::find()
            .filter(catalog_entries::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?;

        Ok(model.map(CatalogEntry::from))
    }

    pub async fn exists(&self, slug: &str) -> Result<bool> {
        Ok(self.find_model(slug).await?.is_some())
    }

    async fn find_model(&self, slug: &str) -> Result<Option<catalog_entries::Model>> {
        Ok(CatalogEntries::find()
            .filter(catalog_entries::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?)
    }

    pub async fn update(
        &self,
        slug: &str,
        changes: CatalogEntryUpdate,
    ) -> Result<Option<CatalogEntry>> {
        let Some(model) = self.find_model(slug).await? else {
            return Ok(None);
        };

        let mut active: catalog_entries::ActiveModel = model.into();

        if let Some(title) = changes.title {
            active.title_search = Set(normalized(&title));
            active.title = Set(title);
        }
        if let Some(alt_title) = changes.alt_title {
            active.alt_title = Set(Some(alt_title));
        }
        if let Some(image_url) = changes.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(synopsis) = changes.synopsis {
            active.synopsis = Set(Some(synopsis));
        }
        if let Some(kind) = changes.kind {
            active.kind_search = Set(Some(normalized(&kind)));
            active.kind = Set(Some(kind));
        }
        if let Some(status) = changes.status {
            active.status_search = Set(Some(normalized(&status)));
            active.status = Set(Some(status));
        }
        if let Some(released) = changes.released {
            active.released = Set(Some(released));
        }
        if let Some(studio) = changes.studio {
            active.studio_search = Set(Some(normalized(&studio)));
            active.studio = Set(Some(studio));
        }
        if let Some(producers) = changes.producers {
            active.producers = Set(Some(producers));
        }
        if let Some(episode_total) = changes.episode_total {
            active.episode_total = Set(Some(episode_total));
        }
        if let Some(genres) = changes.genres {
            active.genres = Set(serde_json::to_string(&genres)?);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        info!("Updated catalog entry: {}", slug);
        Ok(Some(model.into()))
    }

    /// Remove an entry together with everything that references it:
    /// its episode rows, bookmarks, and reports filed against its pages.
    /// One transaction; either everything goes or nothing does.
    pub async fn remove(&self, slug: &str) -> Result<bool> {
        let Some(model) = self.find_model(slug).await? else {
            return Ok(false);
        };

        let txn = self.conn.begin().await?;

        let removed_episodes = Episodes::delete_many()
            .filter(episodes::Column::SeriesSlug.eq(slug))
            .exec(&txn)
            .await?;

        bookmarks::Entity::delete_many()
            .filter(bookmarks::Column::EntryId.eq(model.id))
            .exec(&txn)
            .await?;

        let removed_reports = Reports::delete_many()
            .filter(
                Condition::any()
                    .add(reports::Column::PageUrl.starts_with(format!("{WATCH_PREFIX}/{slug}/")))
                    .add(reports::Column::PageUrl.eq(format!("{SERIES_PREFIX}/{slug}"))),
            )
            .exec(&txn)
            .await?;

        CatalogEntries::delete_by_id(model.id).exec(&txn).await?;

        txn.commit().await?;

        info!(
            "Removed catalog entry {} ({} episodes, {} reports)",
            slug, removed_episodes.rows_affected, removed_reports.rows_affected
        );
        Ok(true)
    }

    /// Replace the embedded episode list wholesale.
    pub async fn set_episode_refs(&self, slug: &str, refs: &[EpisodeRef]) -> Result<bool> {
        let Some(model) = self.find_model(slug).await? else {
            return Ok(false);
        };

        let mut active: catalog_entries::ActiveModel = model.into();
        active.episodes = Set(serde_json::to_string(refs)?);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;
        Ok(true)
    }

    /// Append one episode ref, preserving list order.
    pub async fn append_episode_ref(&self, slug: &str, episode: EpisodeRef) -> Result<bool> {
        let Some(entry) = self.get_by_slug(slug).await? else {
            return Ok(false);
        };

        let mut refs = entry.episodes;
        refs.push(episode);
        self.set_episode_refs(slug, &refs).await
    }

    /// Drop the embedded ref for a deleted episode, if present.
    pub async fn remove_episode_ref(&self, series_slug: &str, episode_slug: &str) -> Result<bool> {
        let Some(entry) = self.get_by_slug(series_slug).await? else {
            return Ok(false);
        };

        let before = entry.episodes.len();
        let refs: Vec<EpisodeRef> = entry
            .episodes
            .into_iter()
            .filter(|ep| ep.url != episode_slug)
            .collect();

        if refs.len() == before {
            return Ok(false);
        }
        self.set_episode_refs(series_slug, &refs).await
    }

    /// Detached-task target; atomic in the store, never awaited by handlers.
    pub async fn increment_view_count(&self, slug: &str) -> Result<()> {
        CatalogEntries::update_many()
            .col_expr(
                catalog_entries::Column::ViewCount,
                Expr::col(catalog_entries::Column::ViewCount).add(1),
            )
            .filter(catalog_entries::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listings. All go through the shared pagination pipeline; default
    // order is descending internal id (insertion order).
    // ------------------------------------------------------------------

    pub async fn list_page(
        &self,
        select: Select<CatalogEntries>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<CatalogEntry>> {
        let models = paginate(&self.conn, select, page, per_page).await?;
        Ok(models.map(CatalogEntry::from))
    }

    #[must_use]
    pub fn newest_first() -> Select<CatalogEntries> {
        CatalogEntries::find().order_by_desc(catalog_entries::Column::Id)
    }

    /// The one legacy listing that keeps ascending insertion order.
    #[must_use]
    pub fn oldest_first() -> Select<CatalogEntries> {
        CatalogEntries::find().order_by_asc(catalog_entries::Column::Id)
    }

    /// Case-insensitive title substring match against the normalized column.
    #[must_use]
    pub fn search(query: &str) -> Select<CatalogEntries> {
        Self::newest_first()
            .filter(catalog_entries::Column::TitleSearch.contains(normalized(query)))
    }

    /// Admin listing search covers slugs too, most recently edited first.
    #[must_use]
    pub fn admin_search(query: Option<&str>) -> Select<CatalogEntries> {
        let mut select =
            CatalogEntries::find().order_by_desc(catalog_entries::Column::UpdatedAt);

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(catalog_entries::Column::TitleSearch.contains(normalized(q)))
                    .add(catalog_entries::Column::Slug.contains(normalized(q))),
            );
        }
        select
    }

    /// Exact genre element match inside the JSON array column.
    #[must_use]
    pub fn with_genre(genre: &str) -> Select<CatalogEntries> {
        Self::newest_first()
            .filter(catalog_entries::Column::Genres.contains(format!("\"{genre}\"")))
    }

    #[must_use]
    pub fn with_status(status: &str) -> Select<CatalogEntries> {
        Self::newest_first().filter(catalog_entries::Column::StatusSearch.eq(normalized(status)))
    }

    #[must_use]
    pub fn with_kind(kind: &str) -> Select<CatalogEntries> {
        Self::newest_first().filter(catalog_entries::Column::KindSearch.eq(normalized(kind)))
    }

    #[must_use]
    pub fn with_studio(studio: &str) -> Select<CatalogEntries> {
        Self::newest_first().filter(catalog_entries::Column::StudioSearch.eq(normalized(studio)))
    }

    /// Year containment over the free-text release string.
    #[must_use]
    pub fn released_in(year: &str) -> Select<CatalogEntries> {
        Self::newest_first().filter(catalog_entries::Column::Released.contains(year))
    }

    pub async fn latest(&self, limit: u64) -> Result<Vec<CatalogEntry>> {
        let models = Self::newest_first().limit(limit).all(&self.conn).await?;
        Ok(models.into_iter().map(CatalogEntry::from).collect())
    }

    /// Most viewed entries updated since `since` (RFC 3339); `None` ranks the
    /// whole catalog.
    pub async fn popular(&self, since: Option<String>, limit: u64) -> Result<Vec<CatalogEntry>> {
        let mut select = CatalogEntries::find()
            .order_by_desc(catalog_entries::Column::ViewCount)
            .limit(limit);

        if let Some(cutoff) = since {
            select = select.filter(catalog_entries::Column::UpdatedAt.gte(cutoff));
        }

        let models = select.all(&self.conn).await?;
        Ok(models.into_iter().map(CatalogEntry::from).collect())
    }

    pub async fn random(&self, limit: u64, exclude_slug: Option<&str>) -> Result<Vec<CatalogEntry>> {
        let mut select = CatalogEntries::find()
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .limit(limit);

        if let Some(slug) = exclude_slug {
            select = select.filter(catalog_entries::Column::Slug.ne(slug));
        }

        let models = select.all(&self.conn).await?;
        Ok(models.into_iter().map(CatalogEntry::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(CatalogEntries::find().count(&self.conn).await?)
    }

    pub async fn latest_rail(&self) -> Result<Vec<CatalogEntry>> {
        self.latest(pagination::LATEST_SERIES_RAIL).await
    }
}
