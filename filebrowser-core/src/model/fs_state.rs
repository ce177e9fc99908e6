//! ``src/model/fs_state.rs``
//! ============================================================================
//! # `FSState`: Directory State for the Browser Screen
//!
//! Current directory, its raw listing, the filter/sort/view settings applied
//! on top of it, and the transient highlight left behind by navigating up.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::fs::entry::Entry;
use crate::model::search_state::SearchState;
use crate::model::sort_filter::{SortOrder, present};

/// Presentation layout; stored and cycled, never interpreted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    SingleLineList,
    MultiLineList,
    Grid,
    LargeGrid,
}

impl ViewMode {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::SingleLineList => Self::MultiLineList,
            Self::MultiLineList => Self::Grid,
            Self::Grid => Self::LargeGrid,
            Self::LargeGrid => Self::SingleLineList,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'_ str = match self {
            Self::SingleLineList => "single_line_list",
            Self::MultiLineList => "multi_line_list",
            Self::Grid => "grid",
            Self::LargeGrid => "large_grid",
        };

        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct FSState {
    /// The working directory.
    pub cwd: PathBuf,

    /// Raw listing of `cwd`, in enumeration order.
    pub entries: Vec<Entry>,

    /// Substring filter for the directory listing.
    pub filter: Option<CompactString>,

    pub sort: SortOrder,

    pub view_mode: ViewMode,

    pub show_hidden: bool,

    /// Child directory the user just came up from.
    pub highlight: Option<PathBuf>,

    /// True while a listing for `cwd` is in flight.
    pub is_loading: bool,
}

impl FSState {
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            entries: Vec::new(),
            filter: None,
            sort: SortOrder::default(),
            view_mode: ViewMode::default(),
            show_hidden: true,
            highlight: None,
            is_loading: false,
        }
    }

    /// Switch to a new directory; the old listing is dropped until the new
    /// one arrives.
    pub fn enter(&mut self, dir: PathBuf) {
        self.cwd = dir;
        self.entries.clear();
        self.is_loading = true;
    }

    /// Update the entry list for the current directory.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.is_loading = false;
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Path> {
        self.cwd.parent()
    }

    pub fn set_filter(&mut self, filter: Option<&str>) {
        self.filter = filter
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(CompactString::new);
    }

    pub fn clear_highlight(&mut self) -> bool {
        self.highlight.take().is_some()
    }

    /// The ordered list the presentation layer should show.
    ///
    /// Active search results take the place of the listing and skip the
    /// directory filter.
    #[must_use]
    pub fn visible_entries(&self, search: &SearchState) -> Vec<Entry> {
        let (source, filter) = match search.active() {
            Some(active) => (active.results.as_slice(), None),
            None => (self.entries.as_slice(), self.filter.as_deref()),
        };

        if self.show_hidden {
            present(source, filter, self.sort)
        } else {
            let shown: Vec<Entry> = source.iter().filter(|e| !e.is_hidden()).cloned().collect();
            present(&shown, filter, self.sort)
        }
    }
}

impl Default for FSState {
    fn default() -> Self {
        Self::new(PathBuf::from("/"))
    }
}
