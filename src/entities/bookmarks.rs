use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// (user, entry) association; uniqueness of the pair is enforced by a
/// dedicated index in the migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookmarks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub entry_id: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog_entries::Entity",
        from = "Column::EntryId",
        to = "super::catalog_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    CatalogEntries,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::catalog_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogEntries.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
