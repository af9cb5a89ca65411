use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, IntoActiveModel, QuerySelect, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{bookmarks, catalog_entries, episodes, prelude::*, reports, users};
use crate::models::{CatalogEntry, DownloadGroup, EpisodeRecord, EpisodeRef, StreamLink};
use crate::services::listing::Page;
use crate::services::taxonomy::TaxonomyField;

pub mod migrator;
pub mod repositories;

pub use repositories::catalog::{CatalogEntryUpdate, CatalogRepository, NewCatalogEntry};
pub use repositories::episode::{EpisodeRepository, EpisodeUpdate, NewEpisode};
pub use repositories::report::ReportRow;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let is_memory = db_url.contains(":memory:");
        if !is_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // A pooled in-memory SQLite would hand each connection its own
        // database; pin it to a single connection.
        let max_connections = if is_memory { 1 } else { max_connections };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn catalog_repo(&self) -> CatalogRepository {
        CatalogRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.conn.clone())
    }

    fn bookmark_repo(&self) -> repositories::bookmark::BookmarkRepository {
        repositories::bookmark::BookmarkRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn report_repo(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Catalog entries
    // ------------------------------------------------------------------

    pub async fn add_entry(&self, input: NewCatalogEntry) -> Result<CatalogEntry> {
        self.catalog_repo().add(input).await
    }

    pub async fn get_entry(&self, slug: &str) -> Result<Option<CatalogEntry>> {
        self.catalog_repo().get_by_slug(slug).await
    }

    pub async fn entry_exists(&self, slug: &str) -> Result<bool> {
        self.catalog_repo().exists(slug).await
    }

    pub async fn update_entry(
        &self,
        slug: &str,
        changes: CatalogEntryUpdate,
    ) -> Result<Option<CatalogEntry>> {
        self.catalog_repo().update(slug, changes).await
    }

    pub async fn remove_entry(&self, slug: &str) -> Result<bool> {
        self.catalog_repo().remove(slug).await
    }

    pub async fn append_episode_ref(&self, slug: &str, episode: EpisodeRef) -> Result<bool> {
        self.catalog_repo().append_episode_ref(slug, episode).await
    }

    pub async fn remove_episode_ref(&self, series_slug: &str, episode_slug: &str) -> Result<bool> {
        self.catalog_repo()
            .remove_episode_ref(series_slug, episode_slug)
            .await
    }

    pub async fn increment_view_count(&self, slug: &str) -> Result<()> {
        self.catalog_repo().increment_view_count(slug).await
    }

    pub async fn entry_page(
        &self,
        select: sea_orm::Select<CatalogEntries>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<CatalogEntry>> {
        self.catalog_repo().list_page(select, page, per_page).await
    }

    pub async fn latest_entries(&self, limit: u64) -> Result<Vec<CatalogEntry>> {
        self.catalog_repo().latest(limit).await
    }

    pub async fn latest_rail(&self) -> Result<Vec<CatalogEntry>> {
        self.catalog_repo().latest_rail().await
    }

    pub async fn popular_entries(
        &self,
        since: Option<String>,
        limit: u64,
    ) -> Result<Vec<CatalogEntry>> {
        self.catalog_repo().popular(since, limit).await
    }

    pub async fn random_entries(
        &self,
        limit: u64,
        exclude_slug: Option<&str>,
    ) -> Result<Vec<CatalogEntry>> {
        self.catalog_repo().random(limit, exclude_slug).await
    }

    pub async fn count_entries(&self) -> Result<u64> {
        self.catalog_repo().count().await
    }

    // ------------------------------------------------------------------
    // Episodes
    // ------------------------------------------------------------------

    pub async fn add_episode(&self, input: NewEpisode) -> Result<EpisodeRecord> {
        self.episode_repo().add(input).await
    }

    pub async fn get_episode(&self, slug: &str) -> Result<Option<EpisodeRecord>> {
        self.episode_repo().get_by_slug(slug).await
    }

    pub async fn episode_exists(&self, slug: &str) -> Result<bool> {
        self.episode_repo().exists(slug).await
    }

    pub async fn update_episode(
        &self,
        slug: &str,
        changes: EpisodeUpdate,
    ) -> Result<Option<EpisodeRecord>> {
        self.episode_repo().update(slug, changes).await
    }

    pub async fn remove_episode(&self, slug: &str) -> Result<bool> {
        self.episode_repo().remove(slug).await
    }

    pub async fn push_mirror(
        &self,
        slug: &str,
        stream: StreamLink,
        download: DownloadGroup,
    ) -> Result<bool> {
        self.episode_repo().push_mirror(slug, stream, download).await
    }

    pub async fn clear_mirrors(&self, names: &[&str], qualities: &[&str]) -> Result<u64> {
        self.episode_repo().clear_mirrors(names, qualities).await
    }

    pub async fn episode_page(
        &self,
        select: sea_orm::Select<Episodes>,
        page: u64,
        per_page: u64,
    ) -> Result<Page<EpisodeRecord>> {
        self.episode_repo().list_page(select, page, per_page).await
    }

    pub async fn episodes_for_series(&self, series_slug: &str) -> Result<Vec<EpisodeRecord>> {
        self.episode_repo().for_series(series_slug).await
    }

    pub async fn count_episodes(&self) -> Result<u64> {
        self.episode_repo().count().await
    }

    // ------------------------------------------------------------------
    // Bookmarks
    // ------------------------------------------------------------------

    pub async fn add_bookmark(&self, user_id: i32, entry_id: i32) -> Result<()> {
        self.bookmark_repo().upsert(user_id, entry_id).await
    }

    pub async fn remove_bookmark(&self, user_id: i32, entry_id: i32) -> Result<bool> {
        self.bookmark_repo().remove(user_id, entry_id).await
    }

    pub async fn clear_bookmarks(&self, user_id: i32) -> Result<u64> {
        self.bookmark_repo().clear_for_user(user_id).await
    }

    pub async fn is_bookmarked(&self, user_id: i32, entry_id: i32) -> Result<bool> {
        self.bookmark_repo().is_bookmarked(user_id, entry_id).await
    }

    pub async fn bookmarked_entries(&self, user_id: i32) -> Result<Vec<CatalogEntry>> {
        self.bookmark_repo().entries_for_user(user_id).await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, username: &str, password: &str) -> Result<User> {
        self.user_repo().create(username, password).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    pub async fn create_report(
        &self,
        page_url: &str,
        message: &str,
        user_id: Option<i32>,
    ) -> Result<reports::Model> {
        self.report_repo().create(page_url, message, user_id).await
    }

    pub async fn list_reports(&self) -> Result<Vec<ReportRow>> {
        self.report_repo().list().await
    }

    pub async fn remove_report(&self, id: i32) -> Result<bool> {
        self.report_repo().remove(id).await
    }

    pub async fn count_reports(&self) -> Result<u64> {
        self.report_repo().count().await
    }

    // ------------------------------------------------------------------
    // Taxonomy distinct values
    // ------------------------------------------------------------------

    /// All distinct values of a taxonomy field, in store order. Genre values
    /// live inside a JSON array column, so they are flattened in memory; the
    /// scalar fields use a SQL DISTINCT.
    pub async fn distinct_taxonomy_values(&self, field: TaxonomyField) -> Result<Vec<String>> {
        if field == TaxonomyField::Genres {
            let rows: Vec<String> = CatalogEntries::find()
                .select_only()
                .column(catalog_entries::Column::Genres)
                .into_tuple()
                .all(&self.conn)
                .await?;

            let mut seen = std::collections::HashSet::new();
            let mut values = Vec::new();
            for row in rows {
                let genres: Vec<String> = serde_json::from_str(&row).unwrap_or_default();
                for genre in genres {
                    if !genre.is_empty() && seen.insert(genre.clone()) {
                        values.push(genre);
                    }
                }
            }
            return Ok(values);
        }

        let column = match field {
            TaxonomyField::Status => catalog_entries::Column::Status,
            TaxonomyField::Kind => catalog_entries::Column::Kind,
            TaxonomyField::Studio => catalog_entries::Column::Studio,
            TaxonomyField::Released => catalog_entries::Column::Released,
            TaxonomyField::Genres => unreachable!(),
        };

        let rows: Vec<Option<String>> = CatalogEntries::find()
            .select_only()
            .column(column)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .flatten()
            .filter(|v| !v.is_empty())
            .collect())
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Destructive restore: clears every collection and re-inserts the dump,
    /// all inside one transaction so a malformed dump cannot leave the store
    /// half-replaced.
    pub async fn replace_all(&self, dump: BackupCollections) -> Result<ImportSummary> {
        let summary = ImportSummary {
            series: dump.series.len(),
            episodes: dump.episodes.len(),
            bookmarks: dump.bookmarks.len(),
            users: dump.users.len(),
            reports: dump.reports.len(),
        };

        let txn = self.conn.begin().await?;

        Reports::delete_many().exec(&txn).await?;
        Bookmarks::delete_many().exec(&txn).await?;
        Users::delete_many().exec(&txn).await?;
        Episodes::delete_many().exec(&txn).await?;
        CatalogEntries::delete_many().exec(&txn).await?;

        insert_chunked::<catalog_entries::Entity, _>(&txn, dump.series).await?;
        insert_chunked::<episodes::Entity, _>(&txn, dump.episodes).await?;
        insert_chunked::<users::Entity, _>(&txn, dump.users).await?;
        insert_chunked::<bookmarks::Entity, _>(&txn, dump.bookmarks).await?;
        insert_chunked::<reports::Entity, _>(&txn, dump.reports).await?;

        txn.commit().await?;

        info!(
            "Restore complete: {} series, {} episodes, {} users",
            summary.series, summary.episodes, summary.users
        );
        Ok(summary)
    }
}

/// The collections section of a backup dump. Arrays default to empty so
/// partial dumps restore what they carry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupCollections {
    #[serde(default)]
    pub series: Vec<catalog_entries::Model>,
    #[serde(default)]
    pub episodes: Vec<episodes::Model>,
    #[serde(default)]
    pub bookmarks: Vec<bookmarks::Model>,
    #[serde(default)]
    pub users: Vec<users::Model>,
    #[serde(default)]
    pub reports: Vec<reports::Model>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportSummary {
    pub series: usize,
    pub episodes: usize,
    pub bookmarks: usize,
    pub users: usize,
    pub reports: usize,
}

/// SQLite caps bind variables per statement; insert in bounded batches.
async fn insert_chunked<E, A>(txn: &DatabaseTransaction, models: Vec<E::Model>) -> Result<()>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + Send,
{
    const CHUNK: usize = 200;

    let mut batch = Vec::with_capacity(CHUNK);
    for model in models {
        batch.push(model.into_active_model());
        if batch.len() == CHUNK {
            E::insert_many(std::mem::take(&mut batch)).exec(txn).await?;
        }
    }
    if !batch.is_empty() {
        E::insert_many(batch).exec(txn).await?;
    }

    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::models::EntryInfo;

    /// Shorthand used across service and repository tests.
    pub async fn seed_entry(store: &Store, slug: &str, title: &str, genres: &[&str]) -> CatalogEntry {
        store
            .add_entry(NewCatalogEntry {
                slug: slug.to_string(),
                title: title.to_string(),
                info: EntryInfo {
                    status: Some("Ongoing".to_string()),
                    kind: Some("TV".to_string()),
                    ..EntryInfo::default()
                },
                genres: genres.iter().map(ToString::to_string).collect(),
                ..NewCatalogEntry::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_entry_round_trip_and_404() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "demo-anime", "Demo Anime", &["Action"]).await;

        let found = store.get_entry("demo-anime").await.unwrap().unwrap();
        assert_eq!(found.title, "Demo Anime");
        assert_eq!(found.genres, vec!["Action"]);

        assert!(store.get_entry("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bookmark_upsert_is_idempotent() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let entry = seed_entry(&store, "demo-anime", "Demo Anime", &[]).await;
        let user = store.create_user("Viewer", "hunter42").await.unwrap();
        assert_eq!(user.username, "viewer");

        store.add_bookmark(user.id, entry.id).await.unwrap();
        store.add_bookmark(user.id, entry.id).await.unwrap();

        let entries = store.bookmarked_entries(user.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(store.is_bookmarked(user.id, entry.id).await.unwrap());

        assert_eq!(store.clear_bookmarks(user.id).await.unwrap(), 1);
        assert!(!store.is_bookmarked(user.id, entry.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_password_verification() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.create_user("viewer", "correct horse").await.unwrap();

        assert!(store
            .verify_user_password("viewer", "correct horse")
            .await
            .unwrap());
        // Username lookup is case-insensitive; the password is not.
        assert!(store
            .verify_user_password("VIEWER", "correct horse")
            .await
            .unwrap());
        assert!(!store
            .verify_user_password("viewer", "wrong")
            .await
            .unwrap());
        assert!(!store.verify_user_password("ghost", "any").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_entry_cascades() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let entry = seed_entry(&store, "demo-anime", "Demo Anime", &[]).await;

        store
            .add_episode(NewEpisode {
                slug: "/demo-anime/1".to_string(),
                series_slug: "demo-anime".to_string(),
                ..NewEpisode::default()
            })
            .await
            .unwrap();

        let user = store.create_user("viewer", "pw12345").await.unwrap();
        store.add_bookmark(user.id, entry.id).await.unwrap();
        store
            .create_report("/watch/demo-anime/1", "video is broken", Some(user.id))
            .await
            .unwrap();
        store
            .create_report("/watch/other-anime/1", "unrelated", None)
            .await
            .unwrap();

        assert!(store.remove_entry("demo-anime").await.unwrap());

        assert!(store.get_episode("/demo-anime/1").await.unwrap().is_none());
        assert!(!store.is_bookmarked(user.id, entry.id).await.unwrap());
        // Only the report tied to the removed series goes away.
        assert_eq!(store.count_reports().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_increment_view_count_is_atomic_per_row() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "demo-anime", "Demo Anime", &[]).await;

        store.increment_view_count("demo-anime").await.unwrap();
        store.increment_view_count("demo-anime").await.unwrap();

        let entry = store.get_entry("demo-anime").await.unwrap().unwrap();
        assert_eq!(entry.view_count, 2);
    }

    #[tokio::test]
    async fn test_distinct_taxonomy_values() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "a", "A", &["Action", "Comedy"]).await;
        seed_entry(&store, "b", "B", &["Action"]).await;

        let genres = store
            .distinct_taxonomy_values(TaxonomyField::Genres)
            .await
            .unwrap();
        assert_eq!(genres, vec!["Action", "Comedy"]);

        let statuses = store
            .distinct_taxonomy_values(TaxonomyField::Status)
            .await
            .unwrap();
        assert_eq!(statuses, vec!["Ongoing"]);
    }

    #[tokio::test]
    async fn test_pagination_math_against_store() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        for i in 0..45 {
            seed_entry(&store, &format!("entry-{i}"), &format!("Entry {i}"), &[]).await;
        }

        let page = store
            .entry_page(CatalogRepository::newest_first(), 3, 20)
            .await
            .unwrap();
        assert_eq!(page.total_items, 45);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);
        // Descending internal id: the last page holds the oldest entries.
        assert_eq!(page.items.last().unwrap().slug, "entry-0");
    }

    #[tokio::test]
    async fn test_replace_all_is_atomic_restore() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "old", "Old", &[]).await;

        let series = vec![crate::entities::catalog_entries::Model {
            id: 1,
            slug: "restored".to_string(),
            title: "Restored".to_string(),
            title_search: "restored".to_string(),
            alt_title: None,
            image_url: None,
            synopsis: None,
            kind: None,
            kind_search: None,
            status: None,
            status_search: None,
            studio: None,
            studio_search: None,
            producers: None,
            released: None,
            episode_total: None,
            genres: "[]".to_string(),
            episodes: "[]".to_string(),
            view_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }];

        let summary = store
            .replace_all(BackupCollections {
                series,
                ..BackupCollections::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.series, 1);
        assert!(store.get_entry("old").await.unwrap().is_none());
        assert!(store.get_entry("restored").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_mirrors_strips_matching_names() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store
            .add_episode(NewEpisode {
                slug: "/demo/1".to_string(),
                series_slug: "demo".to_string(),
                ..NewEpisode::default()
            })
            .await
            .unwrap();

        store
            .push_mirror(
                "/demo/1",
                StreamLink {
                    name: "Mirror".to_string(),
                    url: "https://cdn.example/e/abc".to_string(),
                },
                DownloadGroup {
                    quality: "480p".to_string(),
                    links: vec![],
                },
            )
            .await
            .unwrap();
        store
            .push_mirror(
                "/demo/1",
                StreamLink {
                    name: "Main".to_string(),
                    url: "https://cdn.example/e/def".to_string(),
                },
                DownloadGroup {
                    quality: "1080p".to_string(),
                    links: vec![],
                },
            )
            .await
            .unwrap();

        let modified = store.clear_mirrors(&["Mirror"], &["480p"]).await.unwrap();
        assert_eq!(modified, 1);

        let episode = store.get_episode("/demo/1").await.unwrap().unwrap();
        assert_eq!(episode.streams.len(), 1);
        assert_eq!(episode.streams[0].name, "Main");
        assert_eq!(episode.downloads.len(), 1);
        assert_eq!(episode.downloads[0].quality, "1080p");
    }
}
