//! Synthetic image fixtures shared by unit tests.

use image::{ImageBuffer, Luma, Rgb};
use std::path::{Path, PathBuf};

/// Write a horizontal luminance gradient; `reversed` runs bright to dark
pub fn write_gradient(dir: &Path, name: &str, width: u32, height: u32, reversed: bool) -> PathBuf {
    let img = ImageBuffer::from_fn(width, height, |x, _| {
        let mut v = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        if reversed {
            v = 255 - v;
        }
        Rgb([v, v, v])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Write an 8x8-cell black and white checkerboard
pub fn write_checkerboard(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let cell_w = (width / 8).max(1);
    let cell_h = (height / 8).max(1);
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        if ((x / cell_w) + (y / cell_h)) % 2 == 0 {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}
