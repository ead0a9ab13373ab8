//! One import pass over a staging directory.
//!
//! Phases run strictly in order: reconcile the catalog against permanent
//! storage, list staging oldest first, then for each file
//! hash -> dedup check -> insert -> thumbnail -> move. The move is always
//! last, so a crash can leave a dangling catalog row (removed by the next
//! reconcile) but never an uncatalogued file in storage.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{Config, MediaDirs};
use crate::discovery::{discover_staged, list_file_names};
use crate::error::{Error, Result};
use crate::logging::log_hash_error;
use crate::persistence::{CatalogStore, MediaRecord};
use crate::processing::{compute_cryptographic, phash_from_file, ContentHash, ThumbnailGenerator};
use crate::safety;
use crate::types::{MediaKind, StagedFile};

/// End-of-run counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub kind: MediaKind,

    /// Files catalogued and moved into permanent storage
    pub added: usize,

    /// Orphaned catalog records deleted during reconcile
    pub removed: usize,

    /// Files left in staging (hash failure, name collision, rejected
    /// insert, failed move)
    pub not_added: usize,

    /// Exact duplicates deleted from staging
    pub skipped: usize,

    /// Imports that succeeded without a thumbnail
    pub thumbnail_failures: usize,

    /// Files not reached before the deadline or a cancel request
    pub unprocessed: usize,

    pub interrupted: bool,

    pub elapsed: Duration,
}

impl ImportReport {
    fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            added: 0,
            removed: 0,
            not_added: 0,
            skipped: 0,
            thumbnail_failures: 0,
            unprocessed: 0,
            interrupted: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} import: added {}, removed {}, not added {}, skipped {}",
            self.kind, self.added, self.removed, self.not_added, self.skipped
        )?;
        if self.thumbnail_failures > 0 {
            write!(f, ", thumbnail failures {}", self.thumbnail_failures)?;
        }
        if self.interrupted {
            write!(f, ", unprocessed {} (interrupted)", self.unprocessed)?;
        }
        write!(f, " in {:.2}s", self.elapsed.as_secs_f64())
    }
}

/// What happened to a single staging file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Added { thumbnail_failed: bool },
    NotAdded,
    Skipped,
}

/// What the catalog already holds during a run: the dedup guard and the
/// thumbnail paths in use. Both grow as files are imported.
#[derive(Debug, Default)]
struct KnownMedia {
    hashes: HashSet<ContentHash>,
    thumbnails: HashSet<PathBuf>,
}

/// Drives one import pass for a media kind
pub struct MediaImporter<'a> {
    catalog: &'a dyn CatalogStore,
    thumbnailer: &'a dyn ThumbnailGenerator,
    config: &'a Config,
    cancel: Arc<AtomicBool>,
}

impl<'a> MediaImporter<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        thumbnailer: &'a dyn ThumbnailGenerator,
        config: &'a Config,
    ) -> Self {
        Self {
            catalog,
            thumbnailer,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancel flag; once set, remaining files are left unprocessed
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one pass: reconcile, scan staging, import.
    ///
    /// Per-file failures become counters. A missing staging directory or
    /// a failing catalog aborts the run.
    pub fn run(&self, kind: MediaKind) -> Result<ImportReport> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        let start = Instant::now();
        let deadline = start + Duration::from_secs(self.config.run_timeout_secs);
        let dirs = self.config.dirs(kind);
        let mut report = ImportReport::new(kind);

        if !dirs.staging.is_dir() {
            return Err(Error::FileNotFound(dirs.staging.clone()));
        }
        std::fs::create_dir_all(dirs.full_dir())?;
        if kind.is_visual() {
            std::fs::create_dir_all(dirs.thumbs_dir())?;
        }

        info!("Reconciling {} catalog against {}", kind, dirs.full_dir().display());
        let mut known = self.reconcile(kind, dirs, &mut report)?;

        let staged = discover_staged(&dirs.staging, kind)?;
        info!(
            "Found {} staged {} file(s) in {}",
            staged.len(),
            kind,
            dirs.staging.display()
        );

        let progress = progress_bar(staged.len() as u64, self.config.show_progress);

        for (index, file) in staged.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) || Instant::now() >= deadline {
                report.interrupted = true;
                report.unprocessed = staged.len() - index;
                warn!(
                    "{} import stopped early, {} file(s) left for the next run",
                    kind, report.unprocessed
                );
                break;
            }

            progress.set_message(file.file_name.clone());
            match self.import_file(kind, dirs, file, &mut known)? {
                FileOutcome::Added { thumbnail_failed } => {
                    report.added += 1;
                    if thumbnail_failed {
                        report.thumbnail_failures += 1;
                    }
                }
                FileOutcome::NotAdded => report.not_added += 1,
                FileOutcome::Skipped => report.skipped += 1,
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        report.elapsed = start.elapsed();
        info!("{}", report);
        Ok(report)
    }

    /// Delete catalog records whose file has left permanent storage and
    /// return what the remaining records already occupy.
    fn reconcile(
        &self,
        kind: MediaKind,
        dirs: &MediaDirs,
        report: &mut ImportReport,
    ) -> Result<KnownMedia> {
        let stored = list_file_names(&dirs.full_dir())?;
        let (live, orphans): (Vec<MediaRecord>, Vec<MediaRecord>) = self
            .catalog
            .find_all(kind)?
            .into_iter()
            .partition(|record| stored.contains(&record.file_name));

        let mut known = KnownMedia::default();
        for record in live {
            if kind.is_visual() {
                known.thumbnails.insert(dirs.thumbnail_path(&record.file_name));
            }
            known.hashes.insert(record.content_hash);
        }

        for record in orphans {
            if !self.catalog.delete(&record)? {
                warn!(
                    "Orphaned {} record {} was not deleted",
                    kind, record.file_name
                );
                continue;
            }

            info!(
                "Removed orphaned {} record {} (id {})",
                kind, record.file_name, record.id
            );
            report.removed += 1;

            if kind.is_visual() {
                let thumb = dirs.thumbnail_path(&record.file_name);
                // A live record may map to the same thumbnail
                if !known.thumbnails.contains(&thumb) {
                    // Best effort, the record is already gone
                    let _ = safety::remove_file_if_exists(&thumb, "orphaned thumbnail");
                }
            }
        }

        Ok(known)
    }

    fn import_file(
        &self,
        kind: MediaKind,
        dirs: &MediaDirs,
        file: &StagedFile,
        known: &mut KnownMedia,
    ) -> Result<FileOutcome> {
        let hash = match compute_cryptographic(&file.path) {
            Ok(hash) => hash,
            Err(e) => {
                log_hash_error(&file.path, &e);
                return Ok(FileOutcome::NotAdded);
            }
        };

        // Exact duplicates are dropped before anything is written
        if known.hashes.contains(&hash)
            || self.catalog.find_by_content_hash(kind, &hash)?.is_some()
        {
            debug!("{} is an exact duplicate ({})", file.file_name, hash);
            if let Err(e) = safety::remove_file(&file.path, "exact duplicate") {
                warn!(
                    "Duplicate {} could not be deleted from staging: {}",
                    file.file_name, e
                );
            }
            return Ok(FileOutcome::Skipped);
        }

        let destination = dirs.full_dir().join(&file.file_name);
        if self.catalog.find_by_file_name(kind, &file.file_name)?.is_some()
            || destination.exists()
        {
            warn!(
                "{} already exists in {} storage, leaving it in staging",
                file.file_name, kind
            );
            return Ok(FileOutcome::NotAdded);
        }

        // Thumbnails are keyed by stem, so `a.png` and `a.jpg` cannot coexist
        let thumbnail = dirs.thumbnail_path(&file.file_name);
        if kind.is_visual() && known.thumbnails.contains(&thumbnail) {
            warn!(
                "Thumbnail {} is taken by another {}, leaving {} in staging",
                thumbnail.display(),
                kind,
                file.file_name
            );
            return Ok(FileOutcome::NotAdded);
        }

        let perceptual_hash = if kind.is_visual() {
            match phash_from_file(&file.path) {
                Ok(phash) => Some(phash),
                Err(e) => {
                    warn!("No perceptual hash for {}: {}", file.file_name, e);
                    None
                }
            }
        } else {
            None
        };

        let record = MediaRecord::new(kind, file, hash.clone(), perceptual_hash);
        let id = self.catalog.store(&record)?;
        if id == 0 {
            warn!("Catalog rejected {}, leaving it in staging", file.file_name);
            return Ok(FileOutcome::NotAdded);
        }
        known.hashes.insert(hash);

        let thumbnail_failed = if kind.is_visual() {
            known.thumbnails.insert(thumbnail.clone());
            self.write_thumbnail(file, &thumbnail)
        } else {
            debug!("No thumbnail for {} {}", kind, file.file_name);
            false
        };

        if safety::move_file(&file.path, &destination).is_err() {
            // The record stays; the next reconcile removes it
            return Ok(FileOutcome::NotAdded);
        }

        debug!(
            "Imported {} ({} bytes) as id {}",
            file.file_name, file.size, id
        );
        Ok(FileOutcome::Added { thumbnail_failed })
    }

    /// Returns true when the thumbnail could not be produced
    fn write_thumbnail(&self, file: &StagedFile, dest: &Path) -> bool {
        match self
            .thumbnailer
            .generate(&file.path, dest, self.config.thumbnail_max_dimension)
        {
            Ok(()) => false,
            Err(e) => {
                warn!("Thumbnail for {} failed: {}", file.file_name, e);
                true
            }
        }
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{eta}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let mut report = ImportReport::new(MediaKind::Image);
        report.added = 1;
        report.skipped = 1;
        report.elapsed = Duration::from_millis(1500);

        assert_eq!(
            report.to_string(),
            "image import: added 1, removed 0, not added 0, skipped 1 in 1.50s"
        );
    }

    #[test]
    fn test_report_summary_flags_interruptions() {
        let mut report = ImportReport::new(MediaKind::Video);
        report.thumbnail_failures = 2;
        report.interrupted = true;
        report.unprocessed = 3;

        let line = report.to_string();
        assert!(line.contains("thumbnail failures 2"));
        assert!(line.contains("unprocessed 3 (interrupted)"));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(ImportReport::new(MediaKind::Image)).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["added"], 0);
        assert_eq!(json["interrupted"], false);
    }
}
