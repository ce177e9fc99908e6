//! `src/fs/entry.rs`
//! ============================================================
//! The immutable `Entry` value produced by directory listing and
//! recursive search, and discarded on the next refresh.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytesize::ByteSize;
use chrono::{DateTime, Local, TimeZone};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One filesystem object (file or directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute path; unique within a filesystem and used as identity.
    pub path: PathBuf,

    /// Base name, rendered and matched against queries.
    pub name: CompactString,

    /// Last modification time in epoch millis.
    pub last_modified: i64,

    /// Byte length, 0 for directories.
    pub size: u64,

    pub is_dir: bool,

    /// Symlinks are listed but never descended into by search.
    pub is_symlink: bool,
}

impl Entry {
    /// Build an entry from a path, following symlinks for size/kind and
    /// falling back to the link itself when the target is gone.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let link_meta: Metadata =
            fs::symlink_metadata(path).map_err(|e| AppError::from_io(path, e))?;
        let is_symlink = link_meta.file_type().is_symlink();

        let meta: Metadata = if is_symlink {
            fs::metadata(path).unwrap_or(link_meta)
        } else {
            link_meta
        };

        Ok(Self::from_meta(path, &meta, is_symlink))
    }

    pub(crate) fn from_meta(path: &Path, meta: &Metadata, is_symlink: bool) -> Self {
        let is_dir = meta.is_dir();

        let name = CompactString::new(
            path.file_name()
                .map(OsStr::to_string_lossy)
                .unwrap_or_default(),
        );

        let last_modified = meta
            .modified()
            .ok()
            .map_or(0, system_time_to_millis);

        Self {
            path: path.to_path_buf(),
            name,
            last_modified,
            size: if is_dir { 0 } else { meta.len() },
            is_dir,
            is_symlink,
        }
    }

    /// Whether this entry may be descended into by a recursive walk.
    #[inline]
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        self.is_dir && !self.is_symlink
    }

    #[inline]
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Case-insensitive substring match on the base name.
    #[must_use]
    pub fn name_contains(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }

    // Human-readable size string.
    #[inline]
    #[must_use]
    pub fn size_human(&self) -> String {
        ByteSize::b(self.size).to_string()
    }

    // Format the modification date in local time.
    #[must_use]
    pub fn format_modified(&self, fmt: &str) -> String {
        let dt: DateTime<Local> = Local
            .timestamp_millis_opt(self.last_modified)
            .single()
            .unwrap_or_else(|| -> DateTime<Local> { Local::now() });

        dt.format(fmt).to_string()
    }
}

fn system_time_to_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}
