mod catalog;
mod db;
mod error;
mod models;
mod schema;

pub use catalog::{CatalogStore, SqliteCatalog};
pub use db::{open_pool, run_migrations, DbPool};
pub use error::{PersistenceError, PersistenceResult};
pub use models::{MediaRecord, Tag};

#[cfg(test)]
mod tests;
