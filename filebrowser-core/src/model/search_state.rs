//! Active search results and the one-slot stash.
//!
//! At most one of `active` and `stashed` is ever populated: starting a search
//! clears the stash, following a result moves active into the stash, and
//! returning moves it back.

use std::path::PathBuf;

use compact_str::CompactString;

use crate::fs::entry::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: CompactString,

    /// Directory the search was run from; used to re-run it on refresh.
    pub root: PathBuf,

    pub results: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    active: Option<SearchResults>,
    stashed: Option<SearchResults>,
}

impl SearchState {
    #[must_use]
    pub const fn active(&self) -> Option<&SearchResults> {
        self.active.as_ref()
    }

    #[must_use]
    pub const fn stashed(&self) -> Option<&SearchResults> {
        self.stashed.as_ref()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn can_return(&self) -> bool {
        self.stashed.is_some()
    }

    /// New results from an explicit search.
    pub fn set_results(&mut self, results: SearchResults) {
        self.stashed = None;
        self.active = Some(results);
    }

    /// A new search is starting; results left behind are no longer offered.
    pub fn discard_stash(&mut self) -> bool {
        self.stashed.take().is_some()
    }

    /// A result was followed: park the active results in the stash.
    pub fn stash_active(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                self.stashed = Some(active);
                true
            }
            None => false,
        }
    }

    /// "Return to results": bring the stash back and empty it.
    pub fn restore_stash(&mut self) -> bool {
        match self.stashed.take() {
            Some(stashed) => {
                self.active = Some(stashed);
                true
            }
            None => false,
        }
    }

    /// Dismiss active results; a stash, if any, is left alone.
    pub fn clear_active(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Navigation reset: forget everything.
    pub fn reset(&mut self) {
        self.active = None;
        self.stashed = None;
    }
}
