use crate::entities::{bookmarks, catalog_entries, prelude::*};
use crate::models::CatalogEntry;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use std::collections::HashMap;

pub struct BookmarkRepository {
    conn: DatabaseConnection,
}

impl BookmarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Idempotent create: the unique (user, entry) index turns a repeat
    /// into a no-op.
    pub async fn upsert(&self, user_id: i32, entry_id: i32) -> Result<()> {
        let active_model = bookmarks::ActiveModel {
            user_id: Set(user_id),
            entry_id: Set(entry_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let insert = Bookmarks::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    bookmarks::Column::UserId,
                    bookmarks::Column::EntryId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match insert {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, user_id: i32, entry_id: i32) -> Result<bool> {
        let result = Bookmarks::delete_many()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .filter(bookmarks::Column::EntryId.eq(entry_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear_for_user(&self, user_id: i32) -> Result<u64> {
        let result = Bookmarks::delete_many()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn is_bookmarked(&self, user_id: i32, entry_id: i32) -> Result<bool> {
        let count = Bookmarks::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .filter(bookmarks::Column::EntryId.eq(entry_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Bookmarked entries, most recently saved first.
    pub async fn entries_for_user(&self, user_id: i32) -> Result<Vec<CatalogEntry>> {
        let rows = Bookmarks::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .order_by_desc(bookmarks::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let entry_ids: Vec<i32> = rows.iter().map(|b| b.entry_id).collect();
        let mut by_id: HashMap<i32, catalog_entries::Model> = CatalogEntries::find()
            .filter(catalog_entries::Column::Id.is_in(entry_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        // Keep bookmark order; entries deleted since bookmarking drop out.
        Ok(rows
            .iter()
            .filter_map(|b| by_id.remove(&b.entry_id))
            .map(CatalogEntry::from)
            .collect())
    }
}
