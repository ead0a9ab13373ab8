use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::MediaKind;

/// Staging and storage locations for one media kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDirs {
    /// Drop location for new, not yet catalogued files
    pub staging: PathBuf,

    /// Root holding the `full/` and `thumbs/` subdirectories
    pub storage: PathBuf,
}

impl MediaDirs {
    pub fn new(staging: impl Into<PathBuf>, storage: impl Into<PathBuf>) -> Self {
        Self {
            staging: staging.into(),
            storage: storage.into(),
        }
    }

    /// Permanent storage for catalogued files
    pub fn full_dir(&self) -> PathBuf {
        self.storage.join("full")
    }

    /// Thumbnail directory
    pub fn thumbs_dir(&self) -> PathBuf {
        self.storage.join("thumbs")
    }

    /// Thumbnail path for a catalogued file name; the extension is
    /// normalized to the thumbnail format.
    pub fn thumbnail_path(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        self.thumbs_dir().join(format!("{}.jpg", stem))
    }
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite catalog
    pub database_path: PathBuf,

    /// Maximum number of pooled catalog connections
    pub pool_size: u32,

    /// Image staging and storage directories
    pub images: MediaDirs,

    /// Video staging and storage directories
    pub videos: MediaDirs,

    /// Longer side of generated thumbnails, in pixels
    pub thumbnail_max_dimension: u32,

    /// JPEG quality of generated thumbnails (1-100)
    pub thumbnail_quality: u8,

    /// Maximum Hamming distance for two images to count as near duplicates
    pub duplicate_threshold: u32,

    /// Where duplicate scan reports are written
    pub report_dir: PathBuf,

    /// Wall-clock budget for a whole import run
    pub run_timeout_secs: u64,

    /// How often a busy catalog write is retried
    pub store_retries: u32,

    /// Base delay between catalog write retries
    pub store_retry_delay_ms: u64,

    /// Number of threads for the duplicate scan (0 = auto)
    pub threads: usize,

    /// Draw a progress bar during imports
    pub show_progress: bool,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("media-catalog.db"),
            pool_size: 4,
            images: MediaDirs::new("staging/images", "media/images"),
            videos: MediaDirs::new("staging/videos", "media/videos"),
            thumbnail_max_dimension: 200,
            thumbnail_quality: 75,
            duplicate_threshold: 2,
            report_dir: PathBuf::from("reports"),
            run_timeout_secs: 600,
            store_retries: 3,
            store_retry_delay_ms: 100,
            threads: 0, // Auto
            show_progress: false,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Build a configuration rooted at `root`, using the default layout
    pub fn with_root(root: &Path) -> Self {
        Self {
            database_path: root.join("media-catalog.db"),
            images: MediaDirs::new(root.join("staging/images"), root.join("media/images")),
            videos: MediaDirs::new(root.join("staging/videos"), root.join("media/videos")),
            report_dir: root.join("reports"),
            ..Default::default()
        }
    }

    /// Directories for the given media kind
    pub fn dirs(&self, kind: MediaKind) -> &MediaDirs {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.duplicate_threshold > 64 {
            return Err(Error::Configuration(
                "Duplicate threshold must be between 0 and 64".to_string(),
            ));
        }

        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(Error::Configuration(
                "Thumbnail quality must be between 1 and 100".to_string(),
            ));
        }

        if self.thumbnail_max_dimension == 0 {
            return Err(Error::Configuration(
                "Thumbnail dimension must be greater than zero".to_string(),
            ));
        }

        if self.pool_size == 0 {
            return Err(Error::Configuration(
                "Pool size must be greater than zero".to_string(),
            ));
        }

        for kind in MediaKind::ALL {
            let dirs = self.dirs(kind);
            if dirs.staging == dirs.full_dir() {
                return Err(Error::Configuration(format!(
                    "{} staging directory must differ from permanent storage",
                    kind
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = Config {
            duplicate_threshold: 65,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = Config {
            thumbnail_quality: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = Config::default();
        config.images.staging = config.images.full_dir();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            duplicate_threshold: 5,
            ..Config::with_root(dir.path())
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.duplicate_threshold, 5);
        assert_eq!(loaded.images, config.images);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "thumbnail_quality": 90 }"#).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.thumbnail_quality, 90);
        assert_eq!(loaded.thumbnail_max_dimension, 200);
    }

    #[test]
    fn test_thumbnail_path_normalizes_extension() {
        let dirs = MediaDirs::new("/s", "/m");
        assert_eq!(
            dirs.thumbnail_path("holiday.PNG"),
            PathBuf::from("/m/thumbs/holiday.jpg")
        );
        assert_eq!(dirs.full_dir(), PathBuf::from("/m/full"));
    }
}
