//! Near-duplicate detection between the image catalog and staging.
//!
//! Read-only: the scan never touches the catalog or moves files. Its only
//! output is an advisory JSON report for a human to review.

use chrono::Local;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::discovery::discover_staged;
use crate::error::{Error, Result};
use crate::persistence::CatalogStore;
use crate::processing::{phash_from_file, PHash};
use crate::types::MediaKind;

/// A file name with its perceptual hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    pub file_name: String,
    pub hash: PHash,
}

/// A catalog image and a staging image that look alike
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidatePair(pub String, pub String);

impl CandidatePair {
    pub fn catalog_file(&self) -> &str {
        &self.0
    }

    pub fn staging_file(&self) -> &str {
        &self.1
    }
}

/// Outcome of one scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub pairs: Vec<CandidatePair>,

    /// Written only when `pairs` is non-empty
    pub report_path: Option<PathBuf>,

    pub hashed_catalog: usize,
    pub hashed_staging: usize,

    /// Files skipped because they could not be decoded
    pub failed: usize,
}

/// Pair every catalog hash with every staging hash within `threshold`.
///
/// Identical names are never paired, and (a, b) / (b, a) collapse to the
/// first orientation seen.
pub fn find_candidate_pairs(
    catalog: &[HashedFile],
    staging: &[HashedFile],
    threshold: u32,
) -> Vec<CandidatePair> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut pairs = Vec::new();

    for known in catalog {
        for staged in staging {
            if known.file_name == staged.file_name {
                continue;
            }
            if !known.hash.is_similar(&staged.hash, threshold) {
                continue;
            }

            let key = if known.file_name <= staged.file_name {
                (known.file_name.as_str(), staged.file_name.as_str())
            } else {
                (staged.file_name.as_str(), known.file_name.as_str())
            };
            if seen.insert(key) {
                pairs.push(CandidatePair(
                    known.file_name.clone(),
                    staged.file_name.clone(),
                ));
            }
        }
    }

    pairs
}

/// Compares catalog images against the image staging directory
pub struct DuplicateScanner<'a> {
    catalog: &'a dyn CatalogStore,
    config: &'a Config,
}

impl<'a> DuplicateScanner<'a> {
    pub fn new(catalog: &'a dyn CatalogStore, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    pub fn scan(&self) -> Result<ScanReport> {
        let dirs = self.config.dirs(MediaKind::Image);
        let full_dir = dirs.full_dir();

        let records = self.catalog.find_all(MediaKind::Image)?;
        let staged = discover_staged(&dirs.staging, MediaKind::Image)?;
        info!(
            "Scanning {} catalog image(s) against {} staged image(s)",
            records.len(),
            staged.len()
        );

        let pool = self.thread_pool()?;
        let (catalog_hashes, staging_hashes) = pool.install(|| {
            // The hash captured at import is reused; only gaps are decoded
            let catalog_hashes: Vec<Option<HashedFile>> = records
                .par_iter()
                .map(|record| match record.perceptual_hash {
                    Some(hash) => Some(HashedFile {
                        file_name: record.file_name.clone(),
                        hash,
                    }),
                    None => hash_file(&full_dir.join(&record.file_name), &record.file_name),
                })
                .collect();

            let staging_hashes: Vec<Option<HashedFile>> = staged
                .par_iter()
                .map(|file| hash_file(&file.path, &file.file_name))
                .collect();

            (catalog_hashes, staging_hashes)
        });

        let failed = catalog_hashes.iter().filter(|h| h.is_none()).count()
            + staging_hashes.iter().filter(|h| h.is_none()).count();
        let catalog_hashes: Vec<HashedFile> = catalog_hashes.into_iter().flatten().collect();
        let staging_hashes: Vec<HashedFile> = staging_hashes.into_iter().flatten().collect();

        let pairs = find_candidate_pairs(
            &catalog_hashes,
            &staging_hashes,
            self.config.duplicate_threshold,
        );

        let report_path = if pairs.is_empty() {
            info!("No near-duplicate candidates found");
            None
        } else {
            let path = self.write_report(&pairs)?;
            info!(
                "Found {} near-duplicate candidate(s), report at {}",
                pairs.len(),
                path.display()
            );
            Some(path)
        };

        Ok(ScanReport {
            pairs,
            report_path,
            hashed_catalog: catalog_hashes.len(),
            hashed_staging: staging_hashes.len(),
            failed,
        })
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        let threads = if self.config.threads == 0 {
            num_cpus::get()
        } else {
            self.config.threads
        };
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build thread pool: {}", e)))
    }

    fn write_report(&self, pairs: &[CandidatePair]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.report_dir)?;
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self
            .config
            .report_dir
            .join(format!("duplicates_{}.json", stamp));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, pairs)?;
        writer.flush()?;
        Ok(path)
    }
}

fn hash_file(path: &Path, file_name: &str) -> Option<HashedFile> {
    match phash_from_file(path) {
        Ok(hash) => Some(HashedFile {
            file_name: file_name.to_string(),
            hash,
        }),
        Err(e) => {
            warn!("Skipping {} in duplicate scan: {}", path.display(), e);
            None
        }
    }
}
