use log::{debug, info};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;

use super::error::{PersistenceError, PersistenceResult};
use super::schema;
use crate::Config;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the catalog connection pool and apply pending migrations.
///
/// The pool is owned by the caller and handed to the catalog store; there
/// is no process-wide connection.
pub fn open_pool(config: &Config) -> PersistenceResult<DbPool> {
    let db_path = &config.database_path;

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Path(parent.to_path_buf(), format!("cannot create: {}", e))
            })?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    });

    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    info!("Catalog database ready at {}", db_path.display());
    Ok(pool)
}

/// Applies all pending database migrations.
pub fn run_migrations(conn: &mut Connection) -> PersistenceResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )?;

    for (version, sql) in schema::MIGRATIONS {
        let applied = conn
            .prepare("SELECT 1 FROM schema_migrations WHERE version = ?1")?
            .exists([version])?;
        if applied {
            debug!("Migration {} already applied", version);
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql).map_err(|e| {
            PersistenceError::Initialization(format!("migration {} failed: {}", version, e))
        })?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
        tx.commit()?;

        info!("Applied migration {}", version);
    }

    Ok(())
}
