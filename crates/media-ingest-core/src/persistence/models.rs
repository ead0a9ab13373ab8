use serde::{Deserialize, Serialize};

use crate::processing::{ContentHash, PHash};
use crate::types::{MediaKind, StagedFile};

/// One catalogued media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Surrogate key; 0 until the store persists the record
    pub id: i64,

    /// Image or video
    pub kind: MediaKind,

    /// Leaf name inside permanent storage
    pub file_name: String,

    /// Modification time captured at import (unix seconds)
    pub file_time: i64,

    /// Exact hash of the file bytes at import
    pub content_hash: ContentHash,

    /// Difference hash, images only
    pub perceptual_hash: Option<PHash>,

    /// Tag associations, loaded on demand
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl MediaRecord {
    /// Build a transient record for a staged file
    pub fn new(
        kind: MediaKind,
        staged: &StagedFile,
        content_hash: ContentHash,
        perceptual_hash: Option<PHash>,
    ) -> Self {
        Self {
            id: 0,
            kind,
            file_name: staged.file_name.clone(),
            file_time: staged.modified_unix(),
            content_hash,
            perceptual_hash,
            tags: Vec::new(),
        }
    }

    /// Whether the record has been assigned an id by the store
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// A label attached to media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

/// Media table for a kind
pub(crate) fn media_table(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "images",
        MediaKind::Video => "videos",
    }
}

/// Join table and its media column for a kind
pub(crate) fn tag_join(kind: MediaKind) -> (&'static str, &'static str) {
    match kind {
        MediaKind::Image => ("image_tags", "image_id"),
        MediaKind::Video => ("video_tags", "video_id"),
    }
}
