/// MIGRATION 0001: media catalog, tags and tag associations.
pub const MIGRATION_0001: &str = r#"
-- One row per catalogued image; file_name and content_hash are the dedup guards.
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL UNIQUE,
    file_time INTEGER NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    perceptual_hash TEXT
);

CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL UNIQUE,
    file_time INTEGER NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    perceptual_hash TEXT
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT
);

-- Associations disappear with either side.
CREATE TABLE IF NOT EXISTS image_tags (
    image_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (image_id, tag_id),
    FOREIGN KEY (image_id) REFERENCES images (id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS video_tags (
    video_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (video_id, tag_id),
    FOREIGN KEY (video_id) REFERENCES videos (id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_image_tags_tag_id ON image_tags (tag_id);
CREATE INDEX IF NOT EXISTS idx_video_tags_tag_id ON video_tags (tag_id);
"#;

/// Ordered list of (version, sql) pairs applied by `run_migrations`
pub const MIGRATIONS: &[(&str, &str)] = &[("0001_media_catalog", MIGRATION_0001)];
