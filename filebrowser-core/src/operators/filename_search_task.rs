//! Filename Search Task: recursive, case-insensitive name search
//!
//! Walks a subtree depth-first through a `FileSystemAccessor`, collecting
//! every descendant whose base name contains the query. Results keep
//! enumeration order; ordering for display is applied later by
//! `model::sort_filter::present`.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::fs::accessor::FileSystemAccessor;
use crate::fs::entry::Entry;

/// Run a search on the calling (worker) thread and log its cost.
#[instrument(
    level = "debug",
    skip(accessor),
    fields(
        operation_type = "filename_search",
        root = %root.display(),
        query = %query,
    )
)]
pub fn run_search(accessor: &dyn FileSystemAccessor, root: &Path, query: &str) -> Vec<Entry> {
    let started = Instant::now();
    let results = accessor.search(root, query);

    info!(
        marker = "SEARCH_COMPLETE",
        hits = results.len(),
        duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "Filename search completed"
    );

    results
}

/// Depth-first search built only on `list_children`.
///
/// Matching directories are reported and still descended into; directories
/// that cannot be listed are skipped silently.
pub fn recursive_search<A: FileSystemAccessor + ?Sized>(
    accessor: &A,
    root: &Path,
    query: &str,
) -> Vec<Entry> {
    let needle = query.to_lowercase();
    let mut results = Vec::new();
    search_into(accessor, root, &needle, &mut results);
    results
}

fn search_into<A: FileSystemAccessor + ?Sized>(
    accessor: &A,
    dir: &Path,
    needle: &str,
    results: &mut Vec<Entry>,
) {
    let children = match accessor.list_children(dir) {
        Ok(children) => children,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "Skipping unreadable subtree");
            return;
        }
    };

    for child in children {
        let descend = child.is_traversable().then(|| child.path.clone());

        if child.name_contains(needle) {
            results.push(child);
        }

        if let Some(path) = descend {
            search_into(accessor, &path, needle, results);
        }
    }
}
