use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, GenericImageView};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Produces a bounded-size preview of a single image
pub trait ThumbnailGenerator: Send + Sync {
    /// Write a thumbnail of `source` to `dest` whose longer side is at most
    /// `max_dimension` pixels
    fn generate(&self, source: &Path, dest: &Path, max_dimension: u32) -> Result<()>;
}

/// Re-encodes images as baseline JPEG thumbnails
#[derive(Debug, Clone)]
pub struct JpegThumbnailer {
    quality: u8,
}

impl JpegThumbnailer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegThumbnailer {
    fn default() -> Self {
        Self::new(75)
    }
}

impl ThumbnailGenerator for JpegThumbnailer {
    fn generate(&self, source: &Path, dest: &Path, max_dimension: u32) -> Result<()> {
        let img = image::open(source)
            .map_err(|e| Error::Thumbnail(format!("{}: {}", source.display(), e)))?;

        let (width, height) = img.dimensions();
        let (new_width, new_height) = fit_within(width, height, max_dimension);
        let img = if (new_width, new_height) == (width, height) {
            img
        } else {
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        // Encode into a sibling file so a failed encode never leaves a
        // truncated thumbnail behind
        let partial = dest.with_extension("jpg.part");
        let rgb = img.to_rgb8();
        let encoded = fs::File::create(&partial).map_err(Error::from).and_then(|file| {
            let mut writer = BufWriter::new(file);
            JpegEncoder::new_with_quality(&mut writer, self.quality)
                .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
                .map_err(|e| Error::Thumbnail(format!("{}: {}", dest.display(), e)))?;
            writer.flush()?;
            Ok(())
        });

        match encoded {
            Ok(()) => {
                fs::rename(&partial, dest)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }
}

/// Scale `(width, height)` so the longer side equals `max_dimension`,
/// preserving aspect ratio. Sizes already within bounds are returned
/// unchanged; images are never upscaled.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (short as u64 * max_dimension as u64 + long as u64 / 2) / long as u64;
        scaled.max(1) as u32
    };

    if width >= height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}
