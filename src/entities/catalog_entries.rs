use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One catalog entry (a series). Embedded collections (genres, the ordered
/// episode list) are JSON text columns; their order is meaningful for the
/// episode list, which defines previous/next adjacency on watch pages.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// URL-safe identity key, immutable once created.
    #[sea_orm(unique)]
    pub slug: String,

    pub title: String,

    /// Lowercased copy of `title`, indexed for case-insensitive search.
    pub title_search: String,

    pub alt_title: Option<String>,

    pub image_url: Option<String>,

    pub synopsis: Option<String>,

    // Display attributes are free text, no enum validation.
    pub kind: Option<String>,
    pub kind_search: Option<String>,

    pub status: Option<String>,
    pub status_search: Option<String>,

    pub studio: Option<String>,
    pub studio_search: Option<String>,

    pub producers: Option<String>,

    pub released: Option<String>,

    pub episode_total: Option<String>,

    /// JSON array of genre strings.
    #[sea_orm(column_type = "Text")]
    pub genres: String,

    /// JSON array of embedded episode refs (title, relative url, date).
    #[sea_orm(column_type = "Text")]
    pub episodes: String,

    pub view_count: i64,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookmarks::Entity")]
    Bookmarks,
}

impl Related<super::bookmarks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookmarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
