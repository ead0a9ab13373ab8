use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];

/// The two kinds of media held by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Image, MediaKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// File extensions (lowercase) accepted from the staging directory
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => IMAGE_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
        }
    }

    /// Check whether a path carries an extension of this kind
    pub fn matches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Whether perceptual hashes and thumbnails apply to this kind
    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Image)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" | "images" => Ok(Self::Image),
            "video" | "videos" => Ok(Self::Video),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// A file found in a staging directory
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Full path to the file
    pub path: PathBuf,

    /// Leaf name; becomes the catalog `file_name`
    pub file_name: String,

    /// File size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: SystemTime,
}

impl StagedFile {
    /// Modification time as a unix timestamp in seconds
    pub fn modified_unix(&self) -> i64 {
        system_time_to_unix_timestamp(&self.last_modified)
    }
}

/// Convert a SystemTime to a unix timestamp, clamping pre-epoch values to 0
pub fn system_time_to_unix_timestamp(time: &SystemTime) -> i64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}
