//! src/view/snapshots.rs
//! ============================================================
//! Immutable data-transfer structs harvested from `AppState`
//! after every handled action or task result, and published to
//! the presentation layer over a `watch` channel.
//!
//! A snapshot owns its data, so the renderer never touches the
//! live state.

use std::path::PathBuf;

use compact_str::CompactString;

use crate::fs::entry::Entry;
use crate::model::app_state::{AppState, AppStatus};
use crate::model::fs_state::ViewMode;
use crate::model::selection::ModeKind;
use crate::model::sort_filter::SortOrder;

/// Summary of the last finished mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSnapshot {
    pub operation: CompactString,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSnapshot {
    pub status: AppStatus,

    pub cwd: PathBuf,

    /// Filtered and ordered list to draw.
    pub entries: Vec<Entry>,

    pub view_mode: ViewMode,

    pub sort: SortOrder,

    pub filter: Option<CompactString>,

    pub mode: ModeKind,

    /// Paths picked while selecting, in pick order.
    pub selected: Vec<PathBuf>,

    /// Number of entries waiting for "Paste Here".
    pub pending_move: usize,

    /// Query of the results on screen, if they are search results.
    pub search_query: Option<CompactString>,

    /// Query of stashed results; `Some` means "return to results" is offered.
    pub stashed_query: Option<CompactString>,

    /// Child directory to mark after navigating up.
    pub highlight: Option<PathBuf>,

    pub open_request: Option<PathBuf>,

    pub is_loading: bool,

    pub is_searching: bool,

    pub is_busy: bool,

    pub last_report: Option<ReportSnapshot>,

    pub last_error: Option<String>,
}

impl From<&AppState> for BrowserSnapshot {
    fn from(src: &AppState) -> Self {
        let selected = src
            .mode
            .selected()
            .map(|set| set.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            status: src.status.clone(),
            cwd: src.fs.cwd.clone(),
            entries: src.fs.visible_entries(&src.search),
            view_mode: src.fs.view_mode,
            sort: src.fs.sort,
            filter: src.fs.filter.clone(),
            mode: src.mode.kind(),
            selected,
            pending_move: src.mode.to_move().map_or(0, |set| set.len()),
            search_query: src.search.active().map(|s| s.query.clone()),
            stashed_query: src.search.stashed().map(|s| s.query.clone()),
            highlight: src.fs.highlight.clone(),
            open_request: src.open_request.clone(),
            is_loading: src.fs.is_loading,
            is_searching: src.pending_search.is_some(),
            is_busy: !src.pending_ops.is_empty(),
            last_report: src.last_report.as_ref().map(|r| ReportSnapshot {
                operation: CompactString::new(r.kind.to_string()),
                succeeded: r.succeeded.len(),
                failed: r.failed.len(),
            }),
            last_error: src.last_error.clone(),
        }
    }
}

impl Default for BrowserSnapshot {
    fn default() -> Self {
        Self::from(&AppState::default())
    }
}
