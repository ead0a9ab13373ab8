//! Destructive filesystem operations.
//!
//! Every delete and move goes through here so each one leaves an audit
//! line in the log, whether it succeeds or not.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::logging::{log_file_error, log_fs_modification};

/// Move `from` to `to`, falling back to copy + remove when a rename is
/// not possible (e.g. across filesystems). Never overwrites `to`.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        let err = io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination {} already exists", to.display()),
        );
        log_file_error(from, "move", &err);
        return Err(err);
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            log::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                rename_err
            );
            copy_then_remove(from, to)
        }
    };

    match &result {
        Ok(()) => log_fs_modification("move", from, Some(&format!("to {}", to.display()))),
        Err(e) => log_file_error(from, "move", e),
    }
    result
}

/// Copy into a `.part` sibling and rename it into place, so a failed copy
/// never leaves a truncated file at `to`.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let partial = partial_path(to);
    if let Err(e) = fs::copy(from, &partial).and_then(|_| fs::rename(&partial, to)) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(from) {
        // Leave exactly one copy behind
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

fn partial_path(to: &Path) -> PathBuf {
    let mut name = to.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    to.with_file_name(name)
}

/// Delete a file, logging the outcome
pub fn remove_file(path: &Path, reason: &str) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log_fs_modification("delete", path, Some(reason));
            Ok(())
        }
        Err(e) => {
            log_file_error(path, "delete", &e);
            Err(e)
        }
    }
}

/// Delete a file if it exists; a missing file is not an error
pub fn remove_file_if_exists(path: &Path, reason: &str) -> io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    remove_file(path, reason).map(|()| true)
}
