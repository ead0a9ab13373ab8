//! # Perceptual Hashing
//!
//! Difference hash (dHash) fingerprints for near-duplicate detection.
//!
//! The image is reduced to 8-bit luminance, resized to a 9×8 grid and each
//! of the 64 bits records whether a pixel is brighter than its left-hand
//! neighbour. Recompression, small resizes and light edits leave most bits
//! unchanged, so similarity is measured as the Hamming distance between two
//! fingerprints:
//!
//! - 0-2: near duplicates (same picture, re-encoded or lightly edited)
//! - 3-10: similar images
//! - >10: different images

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

const GRID_WIDTH: u32 = 9;
const GRID_HEIGHT: u32 = 8;

/// A 64-bit difference hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PHash(pub u64);

impl PHash {
    /// Calculate the Hamming distance between two perceptual hashes
    pub fn distance(&self, other: &PHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Check if two images are perceptually similar based on a threshold
    pub fn is_similar(&self, other: &PHash, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }

    /// 16 lowercase hex characters
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 16 {
            return None;
        }
        u64::from_str_radix(hex, 16).ok().map(PHash)
    }
}

impl fmt::Display for PHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<PHash> for String {
    fn from(hash: PHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for PHash {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        PHash::from_hex(&value).ok_or_else(|| format!("invalid perceptual hash: {}", value))
    }
}

/// Calculate the difference hash of an image in memory
pub fn calculate_dhash(img: &DynamicImage) -> PHash {
    let gray = img.to_luma8();
    let small = imageops::resize(&gray, GRID_WIDTH, GRID_HEIGHT, FilterType::Lanczos3);

    let mut hash: u64 = 0;
    let mut bit = 0;
    for y in 0..GRID_HEIGHT {
        for x in 0..GRID_WIDTH - 1 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            if right > left {
                hash |= 1u64 << bit;
            }
            bit += 1;
        }
    }

    PHash(hash)
}

/// Calculate a perceptual hash from an image file.
///
/// Files that cannot be opened yield `Error::Io`; files that open but do
/// not decode as an image yield `Error::UnsupportedFormat`.
pub fn phash_from_file<P: AsRef<Path>>(path: P) -> Result<PHash> {
    let path = path.as_ref();
    match image::open(path) {
        Ok(img) => Ok(calculate_dhash(&img)),
        Err(ImageError::IoError(e)) => Err(Error::Io(e)),
        Err(e) => Err(Error::UnsupportedFormat(format!("{}: {}", path.display(), e))),
    }
}
