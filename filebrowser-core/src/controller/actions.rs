//! src/controller/actions.rs
//! ============================================================================
//! # Actions: Everything the Presentation Layer Can Ask For
//!
//! Gestures and menu commands arrive as `Action`s over the handle's channel;
//! the event loop applies them one at a time.

use std::path::PathBuf;

use crate::fs::entry::Entry;
use crate::model::fs_state::ViewMode;
use crate::model::sort_filter::SortOrder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Tap on an entry. Opens it, follows a search result, or toggles it
    /// in the selection, depending on mode.
    Activate(Entry),

    /// Long press on an entry; starts or extends a selection.
    LongPress(Entry),

    /// Go to the parent directory (or dismiss active search results).
    NavigateUp,

    /// Open a directory by path.
    NavigateTo(PathBuf),

    /// Jump to a directory and drop search results, stash and any mode.
    ResetNavigation(PathBuf),

    /// Re-list the current directory (and re-run an active search).
    Refresh,

    /// Recursive name search below the current directory.
    Search(String),

    ClearSearch,

    /// Bring back the results stashed when a result was followed.
    ReturnToResults,

    /// Substring filter on the directory listing; `None` clears it.
    SetFilter(Option<String>),

    SetSort(SortOrder),

    SetViewMode(ViewMode),

    CycleViewMode,

    SetShowHidden(bool),

    /// "Move": selection becomes the set of entries to paste elsewhere.
    MoveSelected,

    /// "Delete": recursively delete every selected entry.
    DeleteSelected,

    /// "Paste Here": move pending entries into the current directory.
    PasteHere,

    /// Leave selecting or moving.
    Cancel,

    /// New folder in the current directory.
    CreateDirectory(String),

    Quit,
}

impl Action {
    /// Name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Activate(_) => "activate",
            Self::LongPress(_) => "long_press",
            Self::NavigateUp => "navigate_up",
            Self::NavigateTo(_) => "navigate_to",
            Self::ResetNavigation(_) => "reset_navigation",
            Self::Refresh => "refresh",
            Self::Search(_) => "search",
            Self::ClearSearch => "clear_search",
            Self::ReturnToResults => "return_to_results",
            Self::SetFilter(_) => "set_filter",
            Self::SetSort(_) => "set_sort",
            Self::SetViewMode(_) => "set_view_mode",
            Self::CycleViewMode => "cycle_view_mode",
            Self::SetShowHidden(_) => "set_show_hidden",
            Self::MoveSelected => "move_selected",
            Self::DeleteSelected => "delete_selected",
            Self::PasteHere => "paste_here",
            Self::Cancel => "cancel",
            Self::CreateDirectory(_) => "create_directory",
            Self::Quit => "quit",
        }
    }
}
