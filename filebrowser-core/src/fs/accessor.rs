//! ``src/fs/accessor.rs``
//!
//! # Filesystem Accessor
//!
//! The seam between the browser core and the device filesystem. Every method
//! may block and is only ever called from a worker thread (see
//! `operators::file_system_operator`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::error::{AppError, AppResult};
use crate::fs::entry::Entry;
use crate::operators::filename_search_task::recursive_search;

/// Blocking filesystem operations consumed by the browser.
pub trait FileSystemAccessor: Send + Sync + 'static {
    /// Immediate children of `dir`, in enumeration order.
    fn list_children(&self, dir: &Path) -> AppResult<Vec<Entry>>;

    /// Create `parent/name`, returning the new path.
    fn create_directory(&self, parent: &Path, name: &str) -> AppResult<PathBuf>;

    /// Delete a file, or a directory and everything below it.
    fn delete_recursive(&self, path: &Path) -> AppResult<()>;

    /// Rename `source` to `dest`. Existing targets are not checked for.
    fn move_or_rename(&self, source: &Path, dest: &Path) -> AppResult<()>;

    /// Check that `dir` can be read at all.
    fn probe_access(&self, dir: &Path) -> AppResult<()>;

    /// Depth-first case-insensitive name search below `root`.
    ///
    /// Every directory is descended into whether or not it matched; subtrees
    /// that cannot be listed are skipped. `root` itself is never reported.
    fn search(&self, root: &Path, query: &str) -> Vec<Entry> {
        recursive_search(self, root, query)
    }
}

/// `FileSystemAccessor` backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystemAccessor for LocalFileSystem {
    #[instrument(level = "trace", skip(self), fields(dir = %dir.display()))]
    fn list_children(&self, dir: &Path) -> AppResult<Vec<Entry>> {
        let read_dir = fs::read_dir(dir).map_err(|e| AppError::from_io(dir, e))?;
        let mut entries = Vec::new();

        for item in read_dir {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Unreadable directory entry");
                    continue;
                }
            };

            match Entry::from_path(&item.path()) {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!(error = %e, "Failed to stat entry"),
            }
        }

        Ok(entries)
    }

    #[instrument(level = "debug", skip(self), fields(parent = %parent.display()))]
    fn create_directory(&self, parent: &Path, name: &str) -> AppResult<PathBuf> {
        let path = parent.join(name);

        fs::create_dir(&path).map_err(|e| {
            AppError::file_operation_failed("create_directory", &path, e.to_string())
        })?;

        Ok(path)
    }

    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    fn delete_recursive(&self, path: &Path) -> AppResult<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| AppError::from_io(path, e))?;

        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        result.map_err(|e| AppError::file_operation_failed("delete", path, e.to_string()))
    }

    #[instrument(level = "debug", skip(self), fields(source = %source.display(), dest = %dest.display()))]
    fn move_or_rename(&self, source: &Path, dest: &Path) -> AppResult<()> {
        fs::rename(source, dest)
            .map_err(|e| AppError::file_operation_failed("move", source, e.to_string()))
    }

    fn probe_access(&self, dir: &Path) -> AppResult<()> {
        fs::read_dir(dir)
            .map(|_| ())
            .map_err(|e| AppError::from_io(dir, e))
    }

    #[instrument(level = "debug", skip(self), fields(root = %root.display(), query = %query))]
    fn search(&self, root: &Path, query: &str) -> Vec<Entry> {
        let needle = query.to_lowercase();

        WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|item| match item {
                Ok(item) => Some(item),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable subtree");
                    None
                }
            })
            .filter(|item| {
                item.file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(&needle)
            })
            .filter_map(|item| Entry::from_path(item.path()).ok())
            .collect()
    }
}
