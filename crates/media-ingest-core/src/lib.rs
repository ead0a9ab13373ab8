//! Core functionality for ingesting media into a deduplicated catalog.
//!
//! This library provides the building blocks of the ingestion job:
//! - Staging directory discovery
//! - Exact (blake3) and perceptual (dHash) fingerprints
//! - Thumbnail generation
//! - A SQLite catalog behind the `CatalogStore` trait
//! - The import pass and the near-duplicate scan

// -- External Dependencies --

use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::*;
pub use deduplication::{DuplicateScanner, ScanReport};
pub use error::{Error, Result};
pub use import::{ImportReport, MediaImporter};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod deduplication;
pub mod discovery;
pub mod import;
pub mod logging;
pub mod persistence;
pub mod processing;
pub mod safety;
pub mod types;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

use persistence::SqliteCatalog;
use processing::JpegThumbnailer;

/// Main entry point: owns the catalog and thumbnailer for a configuration
pub struct MediaPipeline {
    config: Config,
    catalog: SqliteCatalog,
    thumbnailer: JpegThumbnailer,
    shutdown_requested: Arc<AtomicBool>,
}

impl MediaPipeline {
    /// Validate the configuration and open the catalog
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let pool = persistence::open_pool(&config)?;
        let catalog = SqliteCatalog::new(pool).with_retry_policy(
            config.store_retries,
            Duration::from_millis(config.store_retry_delay_ms),
        );
        let thumbnailer = JpegThumbnailer::new(config.thumbnail_quality);

        Ok(Self {
            config,
            catalog,
            thumbnailer,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &SqliteCatalog {
        &self.catalog
    }

    /// Flag that stops an import between files once set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown_requested.clone()
    }

    /// Run one import pass for a media kind
    pub fn import(&self, kind: MediaKind) -> Result<ImportReport> {
        MediaImporter::new(&self.catalog, &self.thumbnailer, &self.config)
            .with_cancel_flag(self.shutdown_flag())
            .run(kind)
    }

    /// Import images, then videos. A shutdown request skips the kinds not
    /// yet started.
    pub fn import_all(&self) -> Result<Vec<ImportReport>> {
        let mut reports = Vec::with_capacity(MediaKind::ALL.len());
        for kind in MediaKind::ALL {
            if self.shutdown_requested.load(Ordering::SeqCst) {
                info!("Shutdown requested, skipping {} import", kind);
                break;
            }
            reports.push(self.import(kind)?);
        }
        info!("Import finished for {} media kind(s)", reports.len());
        Ok(reports)
    }

    /// Compare catalog images against staged images
    pub fn scan_duplicates(&self) -> Result<ScanReport> {
        DuplicateScanner::new(&self.catalog, &self.config).scan()
    }
}
