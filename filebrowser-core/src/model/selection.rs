//! Selection/move state machine
//!
//! `UiMode` is an enum, so selecting and moving can never be active at the
//! same time. Both sets are keyed by absolute path and keep insertion order.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::fs::entry::Entry;

/// Entries keyed by path, in the order they were picked.
pub type EntrySet = IndexMap<PathBuf, Entry>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiMode {
    #[default]
    Normal,

    /// The set may be empty; the selection bar stays up until cancelled.
    Selecting { selected: EntrySet },

    Moving { to_move: EntrySet },
}

/// Coarse mode tag for snapshots and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Normal,
    Selecting,
    Moving,
}

impl UiMode {
    #[must_use]
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::Normal => ModeKind::Normal,
            Self::Selecting { .. } => ModeKind::Selecting,
            Self::Moving { .. } => ModeKind::Moving,
        }
    }

    #[must_use]
    pub const fn is_selecting(&self) -> bool {
        matches!(self, Self::Selecting { .. })
    }

    #[must_use]
    pub const fn is_moving(&self) -> bool {
        matches!(self, Self::Moving { .. })
    }

    #[must_use]
    pub fn is_selected(&self, path: &Path) -> bool {
        match self {
            Self::Selecting { selected } => selected.contains_key(path),
            _ => false,
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&EntrySet> {
        match self {
            Self::Selecting { selected } => Some(selected),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_move(&self) -> Option<&EntrySet> {
        match self {
            Self::Moving { to_move } => Some(to_move),
            _ => None,
        }
    }

    /// Long press: starts a selection from `Normal`, toggles while selecting.
    /// Returns false when the press was ignored.
    pub fn long_press(&mut self, entry: Entry) -> bool {
        match self {
            Self::Normal => {
                let mut selected = EntrySet::new();
                selected.insert(entry.path.clone(), entry);
                *self = Self::Selecting { selected };
                true
            }
            Self::Selecting { .. } => self.toggle(entry),
            Self::Moving { .. } => false,
        }
    }

    /// Add `entry` if absent, remove it if present. Only valid while selecting.
    pub fn toggle(&mut self, entry: Entry) -> bool {
        let Self::Selecting { selected } = self else {
            return false;
        };

        if selected.shift_remove(&entry.path).is_none() {
            selected.insert(entry.path.clone(), entry);
        }

        true
    }

    /// `Selecting -> Moving`, carrying the whole selection over at once.
    /// An empty selection is left as it is.
    pub fn begin_move(&mut self) -> bool {
        match self {
            Self::Selecting { selected } if !selected.is_empty() => {
                let to_move = std::mem::take(selected);
                debug!(count = to_move.len(), "Entering move mode");
                *self = Self::Moving { to_move };
                true
            }
            _ => false,
        }
    }

    /// Leave selecting for a delete, handing back the paths to remove.
    pub fn take_for_delete(&mut self) -> Option<Vec<PathBuf>> {
        match std::mem::take(self) {
            Self::Selecting { selected } => Some(selected.into_keys().collect()),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Leave moving for a paste, handing back the paths to relocate.
    pub fn take_for_paste(&mut self) -> Option<Vec<PathBuf>> {
        match std::mem::take(self) {
            Self::Moving { to_move } => Some(to_move.into_keys().collect()),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Back to `Normal`, dropping either set.
    pub fn cancel(&mut self) -> bool {
        let was_active = !matches!(self, Self::Normal);
        *self = Self::Normal;
        was_active
    }

    /// Directory or search context changed: a selection no longer refers to
    /// the visible listing and is dropped, a pending move is kept.
    pub fn on_context_change(&mut self) {
        if self.is_selecting() {
            debug!("Dropping selection on context change");
            *self = Self::Normal;
        }
    }
}
