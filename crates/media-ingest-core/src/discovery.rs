use log::warn;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{MediaKind, StagedFile};

/// List the staging files of one media kind, oldest first.
///
/// Only the top level of `directory` is scanned. Ties on modification time
/// are broken by file name so the order is fully deterministic.
pub fn discover_staged(directory: &Path, kind: MediaKind) -> Result<Vec<StagedFile>> {
    if !directory.is_dir() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }

    let mut staged = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !kind.matches_path(path) {
            continue;
        }

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                warn!("Skipping non UTF-8 file name {}", path.display());
                continue;
            }
        };

        match get_file_metadata(path) {
            Ok((size, last_modified)) => staged.push(StagedFile {
                path: path.to_path_buf(),
                file_name,
                size,
                last_modified,
            }),
            Err(e) => {
                // Log error but continue with other files
                warn!("Error reading metadata for {}: {}", path.display(), e);
            }
        }
    }

    staged.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    Ok(staged)
}

/// Names of the regular files directly inside `directory`, following
/// symlinks. A dangling link is not a file.
///
/// A missing directory is treated as empty.
pub fn list_file_names(directory: &Path) -> Result<HashSet<String>> {
    if !directory.exists() {
        return Ok(HashSet::new());
    }

    let mut names = HashSet::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.path().is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Get file metadata
fn get_file_metadata(path: &Path) -> io::Result<(u64, SystemTime)> {
    let metadata = fs::metadata(path)?;
    Ok((metadata.len(), metadata.modified()?))
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::tempdir;

    fn create_file(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_discover_sorted_oldest_first() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "new.jpg", 10);
        create_file(dir.path(), "old.png", 1000);
        create_file(dir.path(), "middle.JPEG", 100);

        let names: Vec<String> = discover_staged(dir.path(), MediaKind::Image)
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["old.png", "middle.JPEG", "new.jpg"]);
    }

    #[test]
    fn test_discover_ties_break_on_name() {
        let dir = tempdir().unwrap();
        let when = SystemTime::now() - Duration::from_secs(60);
        for name in ["b.jpg", "a.jpg", "c.jpg"] {
            File::create(dir.path().join(name))
                .unwrap()
                .set_modified(when)
                .unwrap();
        }

        let names: Vec<String> = discover_staged(dir.path(), MediaKind::Image)
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_discover_filters_kind_and_depth() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "photo.jpg", 5);
        create_file(dir.path(), "clip.mp4", 5);
        create_file(dir.path(), "notes.txt", 5);
        fs::create_dir(dir.path().join("nested")).unwrap();
        create_file(&dir.path().join("nested"), "deep.jpg", 5);

        let images = discover_staged(dir.path(), MediaKind::Image).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name, "photo.jpg");

        let videos = discover_staged(dir.path(), MediaKind::Video).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].file_name, "clip.mp4");
    }

    #[test]
    fn test_missing_staging_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_staged(&missing, MediaKind::Image),
            Err(Error::FileNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_list_file_names() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "a.jpg", 1);
        create_file(dir.path(), "b.mp4", 1);
        fs::create_dir(dir.path().join("sub")).unwrap();

        let names = list_file_names(dir.path()).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("a.jpg"));
        assert!(names.contains("b.mp4"));

        assert!(list_file_names(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_list_file_names_follows_symlinks() {
        let dir = tempdir().unwrap();
        let target = create_file(dir.path(), "target.jpg", 1);
        let full = dir.path().join("full");
        fs::create_dir(&full).unwrap();
        std::os::unix::fs::symlink(&target, full.join("linked.jpg")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), full.join("dangling.jpg"))
            .unwrap();

        let names = list_file_names(&full).unwrap();
        assert!(names.contains("linked.jpg"));
        assert!(!names.contains("dangling.jpg"));
    }
}
