//! ``src/model/app_state.rs``
//! ============================================================================
//! # `AppState`: Everything the Browser Screen Knows
//!
//! Owned by the event loop and mutated only there. Request bookkeeping lives
//! next to the data it guards: a listing or search result is applied only if
//! its id is still the newest one issued.

use std::path::{Path, PathBuf};

use crate::model::fs_state::FSState;
use crate::model::search_state::SearchState;
use crate::model::selection::UiMode;
use crate::operators::file_system_operator::{OperationReport, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStatus {
    Ready,

    /// Storage access was refused at startup. Nothing works until the user
    /// grants access outside the app and restarts.
    PermissionDenied { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: AppStatus,

    pub fs: FSState,

    pub mode: UiMode,

    pub search: SearchState,

    /// Newest listing request for `fs.cwd`.
    pub pending_listing: Option<RequestId>,

    /// Newest search request; cleared when navigation makes it irrelevant.
    pub pending_search: Option<RequestId>,

    /// Mutating operations (delete, move, mkdir) not yet reported back.
    pub pending_ops: Vec<RequestId>,

    /// File the user tapped outside search results, for the presentation
    /// layer to open.
    pub open_request: Option<PathBuf>,

    pub last_report: Option<OperationReport>,

    pub last_error: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(fs: FSState) -> Self {
        Self {
            status: AppStatus::Ready,
            fs,
            mode: UiMode::Normal,
            search: SearchState::default(),
            pending_listing: None,
            pending_search: None,
            pending_ops: Vec::new(),
            open_request: None,
            last_report: None,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.status, AppStatus::Ready)
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.fs.cwd
    }

    /// Transient markers that last until the next user action.
    pub fn clear_transients(&mut self) {
        self.fs.clear_highlight();
        self.open_request = None;
        self.last_error = None;
    }

    /// Whether a listing result may replace the current entries.
    #[must_use]
    pub fn accepts_listing(&self, request_id: RequestId, path: &Path) -> bool {
        self.pending_listing == Some(request_id) && self.fs.cwd == path
    }

    /// Forget a finished mutating operation; false if it was never pending.
    pub fn finish_op(&mut self, request_id: RequestId) -> bool {
        let before = self.pending_ops.len();
        self.pending_ops.retain(|id| *id != request_id);
        self.pending_ops.len() != before
    }

    #[must_use]
    pub fn accepts_search(&self, request_id: RequestId) -> bool {
        self.pending_search == Some(request_id)
    }

    /// Any directory or search-context change: drop a selection, forget an
    /// in-flight search.
    pub fn on_context_change(&mut self) {
        self.mode.on_context_change();
        self.pending_search = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(FSState::default())
    }
}
