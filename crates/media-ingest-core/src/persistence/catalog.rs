use log::{debug, warn};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use std::time::Duration;

use super::db::DbPool;
use super::error::PersistenceResult;
use super::models::{media_table, tag_join, MediaRecord, Tag};
use crate::processing::{ContentHash, PHash};
use crate::types::MediaKind;

/// Persistence boundary for catalogued media.
///
/// `store` is insert-only: a constraint violation is reported as id `0`
/// rather than an error, since callers treat it as "not imported".
pub trait CatalogStore: Send + Sync {
    /// All records of a kind, newest (highest id) first
    fn find_all(&self, kind: MediaKind) -> PersistenceResult<Vec<MediaRecord>>;

    fn find_by_content_hash(
        &self,
        kind: MediaKind,
        hash: &ContentHash,
    ) -> PersistenceResult<Option<MediaRecord>>;

    fn find_by_file_name(
        &self,
        kind: MediaKind,
        file_name: &str,
    ) -> PersistenceResult<Option<MediaRecord>>;

    /// Insert a transient record, returning its new id or 0
    fn store(&self, record: &MediaRecord) -> PersistenceResult<i64>;

    /// Remove a record; returns whether a row was deleted
    fn delete(&self, record: &MediaRecord) -> PersistenceResult<bool>;
}

/// SQLite-backed catalog
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: DbPool,
    retries: u32,
    retry_delay: Duration,
}

impl SqliteCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            retries: 3,
            retry_delay: Duration::from_millis(100),
        }
    }

    /// Retry busy/locked writes `retries` times, waiting `delay * attempt`
    pub fn with_retry_policy(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Number of records of a kind
    pub fn count(&self, kind: MediaKind) -> PersistenceResult<i64> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT COUNT(*) FROM {}", media_table(kind));
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Tags associated with a record
    pub fn tags_for(&self, kind: MediaKind, id: i64) -> PersistenceResult<Vec<Tag>> {
        let conn = self.pool.get()?;
        let (join, column) = tag_join(kind);
        let sql = format!(
            "SELECT t.id, t.name, t.category FROM tags t
             JOIN {join} j ON j.tag_id = t.id
             WHERE j.{column} = ?1
             ORDER BY t.name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let tags = stmt
            .query_map([id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn find_one(
        &self,
        kind: MediaKind,
        column: &str,
        value: &str,
    ) -> PersistenceResult<Option<MediaRecord>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT id, file_name, file_time, content_hash, perceptual_hash
             FROM {} WHERE {} = ?1",
            media_table(kind),
            column
        );
        let record = conn
            .query_row(&sql, [value], |row| record_from_row(kind, row))
            .optional()?;
        Ok(record)
    }

    fn insert(&self, record: &MediaRecord) -> PersistenceResult<i64> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sql = format!(
            "INSERT INTO {} (file_name, file_time, content_hash, perceptual_hash)
             VALUES (?1, ?2, ?3, ?4)",
            media_table(record.kind)
        );
        tx.execute(
            &sql,
            params![
                record.file_name,
                record.file_time,
                record.content_hash.as_str(),
                record.perceptual_hash.map(|h| h.to_hex()),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }
}

impl CatalogStore for SqliteCatalog {
    fn find_all(&self, kind: MediaKind) -> PersistenceResult<Vec<MediaRecord>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT id, file_name, file_time, content_hash, perceptual_hash
             FROM {} ORDER BY id DESC",
            media_table(kind)
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], |row| record_from_row(kind, row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn find_by_content_hash(
        &self,
        kind: MediaKind,
        hash: &ContentHash,
    ) -> PersistenceResult<Option<MediaRecord>> {
        self.find_one(kind, "content_hash", hash.as_str())
    }

    fn find_by_file_name(
        &self,
        kind: MediaKind,
        file_name: &str,
    ) -> PersistenceResult<Option<MediaRecord>> {
        self.find_one(kind, "file_name", file_name)
    }

    fn store(&self, record: &MediaRecord) -> PersistenceResult<i64> {
        if record.is_persisted() {
            warn!(
                "Refusing to re-insert {} record {} (id {})",
                record.kind, record.file_name, record.id
            );
            return Ok(0);
        }

        let mut attempt = 0;
        loop {
            match self.insert(record) {
                Ok(id) => return Ok(id),
                Err(e) if e.is_constraint_violation() => {
                    debug!("Insert of {} rejected: {}", record.file_name, e);
                    return Ok(0);
                }
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Catalog busy storing {} (attempt {}/{}): {}",
                        record.file_name, attempt, self.retries, e
                    );
                    std::thread::sleep(self.retry_delay * attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn delete(&self, record: &MediaRecord) -> PersistenceResult<bool> {
        if !record.is_persisted() {
            return Ok(false);
        }
        let conn = self.pool.get()?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", media_table(record.kind));
        let deleted = conn.execute(&sql, [record.id])?;
        Ok(deleted > 0)
    }
}

fn record_from_row(kind: MediaKind, row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let perceptual: Option<String> = row.get(4)?;
    Ok(MediaRecord {
        id: row.get(0)?,
        kind,
        file_name: row.get(1)?,
        file_time: row.get(2)?,
        content_hash: ContentHash::from_hex(row.get::<_, String>(3)?),
        perceptual_hash: perceptual.as_deref().and_then(PHash::from_hex),
        tags: Vec::new(),
    })
}
