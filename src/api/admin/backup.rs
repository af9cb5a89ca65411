//! Full-store backup: export streams every collection as one JSON document
//! without materializing a collection in memory; import is a destructive
//! restore that replaces everything inside one transaction.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt, channel::mpsc};
use sea_orm::{DatabaseConnection, EntityTrait, StreamTrait};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use crate::api::{ApiError, ApiResponse, AppState};
use crate::db::{BackupCollections, ImportSummary};
use crate::entities::{bookmarks, catalog_entries, episodes, reports, users};
use crate::slug::slugify;

type Chunk = Result<Bytes, Infallible>;

/// GET /api/admin/backup/export
pub async fn export(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.store.conn.clone();
    let exported_at = chrono::Utc::now().to_rfc3339();
    let filename = format!(
        "backup_{}_{}.json",
        slugify(&state.config.site.name),
        chrono::Utc::now().format("%Y-%m-%d")
    );

    let (mut tx, rx) = mpsc::channel::<Chunk>(32);

    tokio::spawn(async move {
        let head = format!("{{\"exported_at\":\"{exported_at}\",\"collections\":{{");
        if tx.send(Ok(Bytes::from(head))).await.is_err() {
            return;
        }

        let mut ok = true;
        ok = ok && stream_collection::<catalog_entries::Entity>(&mut tx, &conn, "series", true).await;
        ok = ok && stream_collection::<episodes::Entity>(&mut tx, &conn, "episodes", false).await;
        ok = ok && stream_collection::<users::Entity>(&mut tx, &conn, "users", false).await;
        ok = ok && stream_collection::<bookmarks::Entity>(&mut tx, &conn, "bookmarks", false).await;
        ok = ok && stream_collection::<reports::Entity>(&mut tx, &conn, "reports", false).await;

        if !ok {
            // Headers are long gone; all we can do is stop writing without
            // emitting garbage after the last complete element.
            warn!("Backup export terminated early");
            return;
        }

        let _ = tx.send(Ok(Bytes::from_static(b"}}"))).await;
    });

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from_stream(rx),
    )
        .into_response()
}

/// Stream one collection as `"label":[row,row,...]`. Returns false if the
/// response side went away or the cursor failed.
async fn stream_collection<E>(
    tx: &mut mpsc::Sender<Chunk>,
    conn: &DatabaseConnection,
    label: &str,
    first: bool,
) -> bool
where
    E: EntityTrait,
    E::Model: Serialize + Send + Sync,
{
    let separator = if first { "" } else { "," };
    let open = format!("{separator}\"{label}\":[");
    if tx.send(Ok(Bytes::from(open))).await.is_err() {
        return false;
    }

    let mut rows = match E::find().stream(conn).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Backup cursor for '{}' failed: {}", label, e);
            return false;
        }
    };

    let mut first_row = true;
    while let Some(row) = rows.next().await {
        let model = match row {
            Ok(model) => model,
            Err(e) => {
                warn!("Backup stream for '{}' aborted: {}", label, e);
                return false;
            }
        };

        let json = match serde_json::to_string(&model) {
            Ok(json) => json,
            Err(e) => {
                warn!("Backup serialization for '{}' failed: {}", label, e);
                return false;
            }
        };

        let chunk = if first_row {
            first_row = false;
            json
        } else {
            format!(",{json}")
        };
        if tx.send(Ok(Bytes::from(chunk))).await.is_err() {
            return false;
        }
    }

    tx.send(Ok(Bytes::from_static(b"]"))).await.is_ok()
}

#[derive(Deserialize)]
pub struct BackupDump {
    #[serde(default)]
    pub exported_at: Option<String>,
    pub collections: BackupCollections,
}

/// POST /api/admin/backup/import: atomic destructive restore.
pub async fn import(
    State(state): State<Arc<AppState>>,
    Json(dump): Json<BackupDump>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    if dump.collections.series.is_empty() && dump.collections.episodes.is_empty() {
        return Err(ApiError::validation(
            "This does not look like a valid backup file",
        ));
    }

    if let Some(stamp) = &dump.exported_at {
        tracing::info!("Restoring backup exported at {}", stamp);
    }

    let summary = state.store.replace_all(dump.collections).await?;
    Ok(Json(ApiResponse::success(summary)))
}
