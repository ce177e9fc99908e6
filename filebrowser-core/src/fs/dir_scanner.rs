//! ``src/fs/dir_scanner.rs``
//!
//! # `Directory Scanner`: Listing with Failure Collapse
//!
//! Lists one directory through the accessor. A listing that fails for any
//! reason is reported as empty; the browser never distinguishes "missing"
//! from "denied" here.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::fs::accessor::FileSystemAccessor;
use crate::fs::entry::Entry;

/// Lists `path`, returning its children in enumeration order.
pub fn scan_dir(accessor: &dyn FileSystemAccessor, path: &Path) -> Vec<Entry> {
    let start_time = Instant::now();

    let entries = match accessor.list_children(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Listing failed, showing empty directory");
            Vec::new()
        }
    };

    let duration: Duration = start_time.elapsed();
    info!(
        marker = "PERF_DIRECTORY_SCAN",
        operation_type = "scan_dir",
        entries = entries.len(),
        duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
        "Directory scan completed in {:?}",
        duration
    );

    entries
}
