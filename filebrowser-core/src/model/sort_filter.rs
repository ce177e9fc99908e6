//! ``src/model/sort_filter.rs``
//! ============================================================================
//! # Sort/Filter Engine
//!
//! Turns a raw entry list into the ordered view the presentation layer shows:
//! optional substring filter, directories before files, then the chosen key.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fs::entry::Entry;

/// Secondary sort key applied inside the directory/file partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Date,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// How `Descending` treats the directory-first partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescendingPolicy {
    /// Directories stay first; only the key is reversed.
    #[default]
    DirectoriesFirst,

    /// The whole combined comparator is reversed, so files come first.
    ReverseAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOrder {
    pub key: SortKey,

    pub direction: SortDirection,

    pub descending_policy: DescendingPolicy,
}

impl SortOrder {
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self {
            key,
            direction,
            descending_policy: DescendingPolicy::DirectoriesFirst,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: DescendingPolicy) -> Self {
        self.descending_policy = policy;
        self
    }

    /// Full comparator for two entries under this order.
    #[must_use]
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let partition = b.is_dir.cmp(&a.is_dir);
        let key = compare_key(self.key, a, b);

        match (self.direction, self.descending_policy) {
            (SortDirection::Ascending, _) => partition.then(key),
            (SortDirection::Descending, DescendingPolicy::DirectoriesFirst) => {
                partition.then(key.reverse())
            }
            (SortDirection::Descending, DescendingPolicy::ReverseAll) => {
                partition.then(key).reverse()
            }
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Size => "size",
        };
        let dir = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };

        write!(f, "{key}_{dir}")
    }
}

fn compare_key(key: SortKey, a: &Entry, b: &Entry) -> Ordering {
    match key {
        SortKey::Name => fold_case(&a.name).cmp(fold_case(&b.name)),
        SortKey::Date => a.last_modified.cmp(&b.last_modified),
        SortKey::Size => a.size.cmp(&b.size),
    }
}

// Lowercased chars of `name`, compared lazily without building a String.
fn fold_case(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

/// Filter and order `entries` for display.
///
/// A blank `filter` is ignored. Callers pass `None` for recursive search
/// results, which were already matched against their query. The sort is
/// stable, so equal entries keep their input order in both directions.
#[must_use]
pub fn present(entries: &[Entry], filter: Option<&str>, order: SortOrder) -> Vec<Entry> {
    let needle = filter
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut view: Vec<Entry> = match needle {
        Some(needle) => entries
            .iter()
            .filter(|e| e.name_contains(&needle))
            .cloned()
            .collect(),
        None => entries.to_vec(),
    };

    view.sort_by(|a, b| order.compare(a, b));
    view
}
