#![allow(dead_code)]

use image::{ImageBuffer, Luma, Rgb};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use media_ingest_core::persistence::{open_pool, SqliteCatalog};
use media_ingest_core::Config;
use tempfile::TempDir;

/// A temporary media root with a fresh catalog
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub catalog: SqliteCatalog,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_root(dir.path());
        fs::create_dir_all(&config.images.staging).unwrap();
        fs::create_dir_all(&config.videos.staging).unwrap();
        let catalog = SqliteCatalog::new(open_pool(&config).unwrap());
        Self {
            dir,
            config,
            catalog,
        }
    }

    pub fn image_staging(&self) -> &Path {
        &self.config.images.staging
    }

    pub fn image_full(&self) -> PathBuf {
        self.config.images.full_dir()
    }

    pub fn image_thumb(&self, file_name: &str) -> PathBuf {
        self.config.images.thumbnail_path(file_name)
    }
}

/// Write a small image whose pixels depend on `seed`, so different seeds
/// give different bytes
pub fn write_pattern(dir: &Path, name: &str, seed: u8) -> PathBuf {
    let img = ImageBuffer::from_fn(64, 48, |x, y| {
        Rgb([
            (x as u8).wrapping_mul(seed),
            (y as u8).wrapping_mul(3),
            seed,
        ])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Horizontal luminance gradient
pub fn write_gradient(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = ImageBuffer::from_fn(width, height, |x, _| {
        let v = (x * 255 / (width - 1)) as u8;
        Rgb([v, v, v])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// 8x8-cell checkerboard
pub fn write_checkerboard(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let (cw, ch) = (width / 8, height / 8);
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        if ((x / cw) + (y / ch)) % 2 == 0 {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// Write arbitrary bytes
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Backdate a file's modification time
pub fn set_age(path: &Path, age_secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}
