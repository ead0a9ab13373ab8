#[allow(clippy::module_inception)]
#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    use tempfile::{tempdir, TempDir};

    use super::super::{open_pool, CatalogStore, MediaRecord, SqliteCatalog};
    use crate::processing::{ContentHash, PHash};
    use crate::types::{MediaKind, StagedFile};
    use crate::Config;

    fn test_catalog() -> (TempDir, SqliteCatalog) {
        let temp_dir = tempdir().unwrap();
        let config = Config::with_root(temp_dir.path());
        let pool = open_pool(&config).unwrap();
        (temp_dir, SqliteCatalog::new(pool))
    }

    fn record(kind: MediaKind, name: &str, hash: &str, phash: Option<u64>) -> MediaRecord {
        let staged = StagedFile {
            path: PathBuf::from("/staging").join(name),
            file_name: name.to_string(),
            size: 1024,
            last_modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        };
        MediaRecord::new(kind, &staged, ContentHash::from_hex(hash), phash.map(PHash))
    }

    #[test]
    fn test_open_pool_creates_database() {
        let temp_dir = tempdir().unwrap();
        let config = Config {
            database_path: temp_dir.path().join("nested/catalog.db"),
            ..Config::with_root(temp_dir.path())
        };

        let _pool = open_pool(&config).unwrap();
        assert!(config.database_path.exists());

        // Reopening must not re-run migrations
        let _pool = open_pool(&config).unwrap();
    }

    #[test]
    fn test_store_and_find() {
        let (_dir, catalog) = test_catalog();
        let rec = record(MediaKind::Image, "a.jpg", "aa11", Some(0xdead_beef));

        let id = catalog.store(&rec).unwrap();
        assert!(id > 0);

        let by_hash = catalog
            .find_by_content_hash(MediaKind::Image, &ContentHash::from_hex("aa11"))
            .unwrap()
            .unwrap();
        assert_eq!(by_hash.id, id);
        assert_eq!(by_hash.file_name, "a.jpg");
        assert_eq!(by_hash.file_time, 1_700_000_000);
        assert_eq!(by_hash.perceptual_hash, Some(PHash(0xdead_beef)));

        let by_name = catalog
            .find_by_file_name(MediaKind::Image, "a.jpg")
            .unwrap()
            .unwrap();
        assert_eq!(by_name, by_hash);

        assert!(catalog
            .find_by_file_name(MediaKind::Image, "missing.jpg")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_hash_returns_zero() {
        let (_dir, catalog) = test_catalog();

        assert!(catalog.store(&record(MediaKind::Image, "a.jpg", "ff", None)).unwrap() > 0);
        let id = catalog
            .store(&record(MediaKind::Image, "b.jpg", "ff", None))
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(catalog.count(MediaKind::Image).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_name_returns_zero() {
        let (_dir, catalog) = test_catalog();

        assert!(catalog.store(&record(MediaKind::Image, "a.jpg", "01", None)).unwrap() > 0);
        let id = catalog
            .store(&record(MediaKind::Image, "a.jpg", "02", None))
            .unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_kinds_are_separate() {
        let (_dir, catalog) = test_catalog();

        assert!(catalog.store(&record(MediaKind::Image, "a.jpg", "01", None)).unwrap() > 0);
        assert!(catalog.store(&record(MediaKind::Video, "a.jpg", "01", None)).unwrap() > 0);

        assert_eq!(catalog.count(MediaKind::Image).unwrap(), 1);
        assert_eq!(catalog.count(MediaKind::Video).unwrap(), 1);
    }

    #[test]
    fn test_persisted_record_is_not_reinserted() {
        let (_dir, catalog) = test_catalog();
        let mut rec = record(MediaKind::Image, "a.jpg", "01", None);
        rec.id = catalog.store(&rec).unwrap();
        assert!(rec.is_persisted());

        assert_eq!(catalog.store(&rec).unwrap(), 0);
    }

    #[test]
    fn test_find_all_newest_first() {
        let (_dir, catalog) = test_catalog();
        for (name, hash) in [("1.jpg", "01"), ("2.jpg", "02"), ("3.jpg", "03")] {
            catalog
                .store(&record(MediaKind::Image, name, hash, None))
                .unwrap();
        }

        let names: Vec<String> = catalog
            .find_all(MediaKind::Image)
            .unwrap()
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        assert_eq!(names, vec!["3.jpg", "2.jpg", "1.jpg"]);
        assert!(catalog.find_all(MediaKind::Video).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, catalog) = test_catalog();
        let mut rec = record(MediaKind::Image, "a.jpg", "01", None);

        // Transient records have nothing to delete
        assert!(!catalog.delete(&rec).unwrap());

        rec.id = catalog.store(&rec).unwrap();
        assert!(catalog.delete(&rec).unwrap());
        assert!(!catalog.delete(&rec).unwrap());
        assert_eq!(catalog.count(MediaKind::Image).unwrap(), 0);
    }

    #[test]
    fn test_tags_cascade_on_delete() {
        let (_dir, catalog) = test_catalog();
        let mut rec = record(MediaKind::Image, "a.jpg", "01", None);
        rec.id = catalog.store(&rec).unwrap();

        {
            let conn = catalog.pool().get().unwrap();
            conn.execute(
                "INSERT INTO tags (name, category) VALUES ('beach', 'place')",
                [],
            )
            .unwrap();
            let tag_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO image_tags (image_id, tag_id) VALUES (?1, ?2)",
                [rec.id, tag_id],
            )
            .unwrap();
        }

        let tags = catalog.tags_for(MediaKind::Image, rec.id).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "beach");
        assert_eq!(tags[0].category.as_deref(), Some("place"));

        assert!(catalog.delete(&rec).unwrap());

        let conn = catalog.pool().get().unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM image_tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }
}
