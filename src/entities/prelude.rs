pub use super::bookmarks::Entity as Bookmarks;
pub use super::catalog_entries::Entity as CatalogEntries;
pub use super::episodes::Entity as Episodes;
pub use super::reports::Entity as Reports;
pub use super::users::Entity as Users;
