use crate::entities::{prelude::*, reports, users};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};
use tracing::info;

/// A stored report plus the reporter's username when the report was filed
/// while logged in.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub model: reports::Model,
    pub username: Option<String>,
}

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        page_url: &str,
        message: &str,
        user_id: Option<i32>,
    ) -> Result<reports::Model> {
        let active_model = reports::ActiveModel {
            page_url: Set(page_url.to_string()),
            message: Set(message.to_string()),
            user_id: Set(user_id),
            status: Set("new".to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Ok(active_model.insert(&self.conn).await?)
    }

    /// Newest first, with reporter usernames resolved for the review UI.
    pub async fn list(&self) -> Result<Vec<ReportRow>> {
        let rows = Reports::find()
            .order_by_desc(reports::Column::CreatedAt)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(model, user)| ReportRow {
                model,
                username: user.map(|u| u.username),
            })
            .collect())
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Reports::delete_by_id(id).exec(&self.conn).await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed report {}", id);
        }
        Ok(removed)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Reports::find().count(&self.conn).await?)
    }
}
