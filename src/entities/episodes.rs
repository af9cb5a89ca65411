use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One watchable episode. Parent identity is denormalized so the watch page
/// can render even when the catalog entry is gone.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "episodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Relative slug, `/<seriesSlug>/<number>`.
    #[sea_orm(unique)]
    pub slug: String,

    pub title: Option<String>,

    pub series_slug: String,

    pub series_title: Option<String>,

    pub series_image_url: Option<String>,

    pub thumbnail_url: Option<String>,

    /// Display date string shown in episode lists.
    pub aired_label: Option<String>,

    /// JSON array of streaming mirrors: `[{name, url}]`.
    #[sea_orm(column_type = "Text")]
    pub streams: String,

    /// JSON array of download groups: `[{quality, links: [{host, url}]}]`.
    #[sea_orm(column_type = "Text")]
    pub downloads: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
