//! File-system primitives for run and module workspaces.
//!
//! Everything above this layer manipulates directories through these
//! functions. They are idempotent where possible and log at `debug` for the
//! happy path so a run's workspace activity can be traced end to end.
//!
//! Two functions deliberately do not fail fast:
//! - [`copy_tree`] treats a missing source as "nothing to copy"
//! - [`clear`] keeps going when a single entry cannot be removed

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};

/// Create `path` and all missing ancestors. No-op if it already exists.
pub fn ensure_directory(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to create directory");
        PipelineError::io("create directory", path, e)
    })?;
    debug!(path = %path.display(), "Verified or created directory");
    Ok(path.to_path_buf())
}

/// Copy a single file, creating `dst`'s parent directories first.
///
/// Permissions are carried by the copy itself; access and modification
/// times are copied over afterwards.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    fs::copy(src, dst).map_err(|e| {
        error!(src = %src.display(), dst = %dst.display(), error = %e, "Failed to copy file");
        PipelineError::io("copy file", src, e)
    })?;

    let metadata = fs::metadata(src).map_err(|e| PipelineError::io("read metadata of", src, e))?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(|e| PipelineError::io("set file times on", dst, e))?;

    debug!(src = %src.display(), dst = %dst.display(), "Copied file");
    Ok(())
}

/// Recursively mirror the contents of `src_dir` into `dst_dir`.
///
/// A missing or non-directory source copies nothing and is not an error:
/// callers rely on "no prior output yet" being a normal state.
pub fn copy_tree(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    if !src_dir.is_dir() {
        warn!(
            src = %src_dir.display(),
            "Source directory does not exist or is not a directory, nothing copied"
        );
        return Ok(());
    }

    mirror(src_dir, dst_dir)
}

fn mirror(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    let entries =
        fs::read_dir(src_dir).map_err(|e| PipelineError::io("read directory", src_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io("read directory", src_dir, e))?;
        let path = entry.path();
        let dest_path = dst_dir.join(entry.file_name());

        if path.is_dir() {
            ensure_directory(&dest_path)?;
            // Symlinked directories are created but not descended into
            let is_real_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_real_dir {
                mirror(&path, &dest_path)?;
            }
        } else if path.is_file() {
            copy_file(&path, &dest_path)?;
        }
    }

    Ok(())
}

/// Whether `dir` has zero entries.
///
/// Unlike the copy helpers this is strict: the path must exist and be a
/// directory.
pub fn is_empty(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Err(PipelineError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut entries = fs::read_dir(dir).map_err(|e| PipelineError::io("read directory", dir, e))?;
    let empty = entries.next().is_none();
    debug!(
        path = %dir.display(),
        "Directory is {}",
        if empty { "empty" } else { "not empty" }
    );
    Ok(empty)
}

/// Delete every entry inside `dir` without deleting `dir` itself.
///
/// Best effort: an entry that cannot be removed is logged and skipped.
/// Returns the number of entries left behind.
pub fn clear(dir: &Path) -> usize {
    clear_with(dir, remove_entry)
}

/// [`clear`] with a caller-supplied per-entry remover.
pub fn clear_with<F>(dir: &Path, mut remove: F) -> usize
where
    F: FnMut(&Path) -> io::Result<()>,
{
    if !dir.exists() {
        warn!(path = %dir.display(), "Path does not exist, nothing to clear");
        return 0;
    }
    if !dir.is_dir() {
        warn!(path = %dir.display(), "Path is not a directory, nothing to clear");
        return 0;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(path = %dir.display(), error = %e, "Failed to list directory for clearing");
            return 0;
        }
    };

    let mut failed = 0;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                error!(path = %dir.display(), error = %e, "Failed to read directory entry");
                failed += 1;
                continue;
            }
        };

        match remove(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed entry"),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to delete entry");
                warn!("Proceeding to next item");
                failed += 1;
            }
        }
    }

    failed
}

/// Remove a file, symlink or directory tree. Missing paths are a no-op.
pub fn safe_delete(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_err() {
        debug!(path = %path.display(), "Nothing to delete");
        return Ok(());
    }

    remove_entry(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to delete");
        PipelineError::io("delete", path, e)
    })?;
    info!(path = %path.display(), "Deleted");
    Ok(())
}

/// Remove one entry; symlinks are unlinked, never followed.
fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
