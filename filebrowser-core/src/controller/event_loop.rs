//! ``src/controller/event_loop.rs``
//! ============================================================================
//! # Event Loop: Single Owner of Browser State
//!
//! Actions from the presentation layer and results from the worker pool are
//! interleaved on one task. Every state change happens here; after each one a
//! fresh `BrowserSnapshot` is published over a `watch` channel.
//!
//! Listing and search results carry the request id they were dispatched
//! under and are dropped unless that id is still the newest one pending.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;
use directories::UserDirs;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::Config;
use crate::controller::actions::Action;
use crate::error::{AppError, AppResult};
use crate::fs::accessor::FileSystemAccessor;
use crate::fs::entry::Entry;
use crate::model::app_state::{AppState, AppStatus};
use crate::model::fs_state::FSState;
use crate::model::search_state::SearchResults;
use crate::operators::file_system_operator::{
    FileSystemOperation, OperationReport, RequestId, WorkerPool,
};
use crate::preferences::PreferenceStore;
use crate::view::snapshots::BrowserSnapshot;

/// Completion message sent back by the worker pool.
#[derive(Debug)]
pub enum TaskResult {
    DirectoryLoaded {
        request_id: RequestId,
        path: PathBuf,
        entries: Vec<Entry>,
    },

    SearchCompleted {
        request_id: RequestId,
        root: PathBuf,
        query: CompactString,
        results: Vec<Entry>,
    },

    /// A create, delete or move batch finished (possibly with failed items).
    OperationCompleted {
        request_id: RequestId,
        report: OperationReport,
    },

    /// The worker itself died before producing a result.
    Failed {
        request_id: RequestId,
        error: AppError,
    },
}

/// Presentation-side end of the loop.
#[derive(Debug, Clone)]
pub struct BrowserHandle {
    action_tx: mpsc::UnboundedSender<Action>,
    snapshot_rx: watch::Receiver<BrowserSnapshot>,
}

impl BrowserHandle {
    pub fn send(&self, action: Action) -> AppResult<()> {
        self.action_tx
            .send(action)
            .map_err(|e| AppError::Other(format!("event loop stopped, dropped {}", e.0.name())))
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> BrowserSnapshot {
        BrowserSnapshot::clone(&self.snapshot_rx.borrow())
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> AppResult<BrowserSnapshot> {
        self.snapshot_rx
            .changed()
            .await
            .map_err(|_| AppError::Other("event loop stopped".to_string()))?;
        Ok(BrowserSnapshot::clone(&self.snapshot_rx.borrow_and_update()))
    }

    /// Wait until a published state satisfies `f`.
    pub async fn wait_for<F>(&mut self, f: F) -> AppResult<BrowserSnapshot>
    where
        F: FnMut(&BrowserSnapshot) -> bool,
    {
        self.snapshot_rx
            .wait_for(f)
            .await
            .map(|snap| BrowserSnapshot::clone(&snap))
            .map_err(|_| AppError::Other("event loop stopped".to_string()))
    }
}

pub struct EventLoop {
    state: AppState,
    pool: WorkerPool,
    prefs: Arc<dyn PreferenceStore>,
    task_rx: mpsc::UnboundedReceiver<TaskResult>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    snapshot_tx: watch::Sender<BrowserSnapshot>,

    /// Dispatched requests whose result has not come back yet.
    in_flight: usize,
}

impl EventLoop {
    /// Resolve the start directory, issue its first listing and hand back the
    /// loop together with the presentation handle.
    ///
    /// The last visited path is tried first, then `config.start_dir`, the home
    /// directory and finally `/`. Only when every candidate fails and one of
    /// them was refused does the browser enter `AppStatus::PermissionDenied`.
    pub async fn start(
        config: Config,
        accessor: Arc<dyn FileSystemAccessor>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> (Self, BrowserHandle) {
        let config = config.normalized();

        let stored = prefs.last_visited().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read last visited directory");
            None
        });

        let candidates: Vec<PathBuf> = stored
            .into_iter()
            .chain(config.start_dir.clone())
            .chain(UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
            .collect();

        let probe_accessor = Arc::clone(&accessor);
        let status_and_dir =
            tokio::task::spawn_blocking(move || resolve_start_dir(&*probe_accessor, candidates))
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "Start directory probe aborted");
                    (AppStatus::Ready, PathBuf::from("/"))
                });

        let (status, cwd) = status_and_dir;

        let mut fs = FSState::new(cwd);
        fs.sort = config.sort;
        fs.view_mode = config.view_mode;
        fs.show_hidden = config.show_hidden;

        let mut state = AppState::new(fs);
        state.status = status;

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(BrowserSnapshot::from(&state));

        let mut event_loop = Self {
            state,
            pool: WorkerPool::new(accessor, config.fs_workers, task_tx),
            prefs,
            task_rx,
            action_rx,
            snapshot_tx,
            in_flight: 0,
        };

        match event_loop.state.status.clone() {
            AppStatus::Ready => {
                info!(cwd = %event_loop.state.cwd().display(), "Browser ready");
                event_loop.request_listing();
            }
            AppStatus::PermissionDenied { path } => {
                error!(path = %path.display(), "Storage access denied, browser disabled");
            }
        }
        event_loop.publish();

        let handle = BrowserHandle {
            action_tx,
            snapshot_rx,
        };

        (event_loop, handle)
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Drive the loop until `Action::Quit` or every handle is dropped.
    pub async fn run(mut self) {
        info!("Event loop started");

        loop {
            tokio::select! {
                action = self.action_rx.recv() => match action {
                    Some(Action::Quit) | None => break,
                    Some(action) => self.handle_action(action).await,
                },

                Some(result) = self.task_rx.recv() => self.handle_task_result(result),
            }

            self.publish();
        }

        info!(in_flight = self.in_flight, "Event loop stopped");
    }

    /// Apply results until nothing dispatched is outstanding.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(result) = self.task_rx.recv().await else {
                break;
            };
            self.handle_task_result(result);
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(BrowserSnapshot::from(&self.state));
    }

    #[instrument(level = "debug", skip(self, action), fields(action = action.name()))]
    pub async fn handle_action(&mut self, action: Action) {
        if !self.state.is_ready() {
            debug!("Browser disabled, action ignored");
            return;
        }

        self.state.clear_transients();

        match action {
            Action::Activate(entry) => self.activate(entry).await,

            Action::LongPress(entry) => {
                if !self.state.mode.long_press(entry) {
                    debug!("Long press ignored while moving");
                }
            }

            Action::NavigateUp => self.navigate_up().await,

            Action::NavigateTo(path) => self.change_directory(path).await,

            Action::ResetNavigation(path) => {
                self.state.search.reset();
                self.state.mode.cancel();
                self.change_directory(path).await;
            }

            Action::Refresh => self.refresh(),

            Action::Search(query) => self.start_search(&query),

            Action::ClearSearch => {
                let had_results = self.state.search.clear_active();
                if had_results || self.state.pending_search.is_some() {
                    self.state.on_context_change();
                }
            }

            Action::ReturnToResults => {
                if self.state.search.restore_stash() {
                    self.state.on_context_change();
                } else {
                    debug!("No stashed results to return to");
                }
            }

            Action::SetFilter(filter) => self.state.fs.set_filter(filter.as_deref()),

            Action::SetSort(order) => {
                debug!(sort = %order, "Sort changed");
                self.state.fs.sort = order;
            }

            Action::SetViewMode(view_mode) => self.state.fs.view_mode = view_mode,

            Action::CycleViewMode => self.state.fs.view_mode = self.state.fs.view_mode.next(),

            Action::SetShowHidden(show) => self.state.fs.show_hidden = show,

            Action::MoveSelected => {
                if !self.state.mode.begin_move() {
                    debug!("Nothing selected to move");
                }
            }

            Action::DeleteSelected => match self.state.mode.take_for_delete() {
                Some(paths) if !paths.is_empty() => {
                    info!(count = paths.len(), "Deleting selection");
                    self.dispatch_op(FileSystemOperation::Delete { paths });
                }
                Some(_) => debug!("Empty selection, nothing to delete"),
                None => debug!("Delete requested outside selection"),
            },

            Action::PasteHere => match self.state.mode.take_for_paste() {
                Some(sources) => {
                    let dest_dir = self.state.cwd().to_path_buf();
                    info!(count = sources.len(), dest = %dest_dir.display(), "Pasting moved entries");
                    self.dispatch_op(FileSystemOperation::MoveInto { sources, dest_dir });
                }
                None => debug!("Paste requested outside move mode"),
            },

            Action::Cancel => {
                if self.state.mode.cancel() {
                    debug!("Mode cancelled");
                }
            }

            Action::CreateDirectory(name) => match validate_folder_name(&name) {
                Ok(name) => {
                    let parent = self.state.cwd().to_path_buf();
                    self.dispatch_op(FileSystemOperation::CreateDirectory {
                        parent,
                        name: name.to_string(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Rejected folder name");
                    self.state.last_error = Some(e.to_string());
                }
            },

            Action::Quit => trace!("Quit is handled by run()"),
        }
    }

    async fn activate(&mut self, entry: Entry) {
        if self.state.mode.is_selecting() {
            self.state.mode.toggle(entry);
            return;
        }

        if self.state.search.is_active() {
            let target = if entry.is_dir {
                entry.path
            } else {
                entry
                    .parent()
                    .map_or_else(|| entry.path.clone(), Path::to_path_buf)
            };

            self.state.search.stash_active();
            self.change_directory(target).await;
            return;
        }

        if entry.is_dir {
            self.change_directory(entry.path).await;
        } else {
            debug!(path = %entry.path.display(), "Open requested");
            self.state.open_request = Some(entry.path);
        }
    }

    async fn navigate_up(&mut self) {
        if self.state.search.clear_active() {
            self.state.on_context_change();
            return;
        }

        let Some(parent) = self.state.fs.parent().map(Path::to_path_buf) else {
            debug!("Already at filesystem root");
            return;
        };

        let left = self.state.cwd().to_path_buf();
        self.change_directory(parent).await;
        self.state.fs.highlight = Some(left);
    }

    /// Enter `dir`, list it and remember it as last visited.
    async fn change_directory(&mut self, dir: PathBuf) {
        info!(dir = %dir.display(), "Changing directory");

        self.state.on_context_change();
        self.state.search.clear_active();
        self.state.fs.enter(dir);
        self.state.fs.set_filter(None);
        self.request_listing();

        if let Err(e) = self.prefs.set_last_visited(self.state.cwd()).await {
            warn!(error = %e, "Could not persist last visited directory");
        }
    }

    fn request_listing(&mut self) {
        self.state.fs.is_loading = true;
        let request_id = self.dispatch(FileSystemOperation::ListDirectory {
            path: self.state.cwd().to_path_buf(),
        });
        self.state.pending_listing = Some(request_id);
    }

    /// Re-list the directory and re-run an active search.
    fn refresh(&mut self) {
        self.request_listing();

        if let Some(active) = self.state.search.active() {
            let operation = FileSystemOperation::Search {
                root: active.root.clone(),
                query: active.query.clone(),
            };
            let request_id = self.dispatch(operation);
            self.state.pending_search = Some(request_id);
        }
    }

    fn start_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            debug!("Blank search ignored");
            return;
        }

        self.state.search.discard_stash();
        self.state.on_context_change();

        let request_id = self.dispatch(FileSystemOperation::Search {
            root: self.state.cwd().to_path_buf(),
            query: CompactString::new(query),
        });
        self.state.pending_search = Some(request_id);
    }

    fn dispatch(&mut self, operation: FileSystemOperation) -> RequestId {
        self.in_flight += 1;
        self.pool.dispatch(operation)
    }

    fn dispatch_op(&mut self, operation: FileSystemOperation) {
        let request_id = self.dispatch(operation);
        self.state.pending_ops.push(request_id);
    }

    pub fn handle_task_result(&mut self, result: TaskResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            TaskResult::DirectoryLoaded {
                request_id,
                path,
                entries,
            } => {
                if self.state.accepts_listing(request_id, &path) {
                    debug!(request_id, count = entries.len(), "Listing applied");
                    self.state.fs.set_entries(entries);
                    self.state.pending_listing = None;
                } else {
                    debug!(request_id, path = %path.display(), "Stale listing discarded");
                }
            }

            TaskResult::SearchCompleted {
                request_id,
                root,
                query,
                results,
            } => {
                if self.state.accepts_search(request_id) {
                    info!(request_id, query = %query, count = results.len(), "Search results applied");
                    self.state.search.set_results(SearchResults {
                        query,
                        root,
                        results,
                    });
                    self.state.pending_search = None;
                } else {
                    debug!(request_id, query = %query, "Stale search discarded");
                }
            }

            TaskResult::OperationCompleted { request_id, report } => {
                self.state.finish_op(request_id);
                info!(
                    request_id,
                    operation = %report.kind,
                    succeeded = report.succeeded.len(),
                    failed = report.failed.len(),
                    "Operation finished"
                );
                self.state.last_report = Some(report);
                self.refresh();
            }

            TaskResult::Failed { request_id, error } => {
                error!(request_id, error = %error, "Filesystem worker failed");

                if self.state.pending_listing == Some(request_id) {
                    self.state.pending_listing = None;
                    self.state.fs.set_entries(Vec::new());
                }
                if self.state.pending_search == Some(request_id) {
                    self.state.pending_search = None;
                }
                if self.state.finish_op(request_id) {
                    self.refresh();
                }
            }
        }
    }
}

/// First candidate that can be read wins.
///
/// A denied candidate is skipped like any other unusable one; the browser is
/// disabled only when nothing could be opened and at least one candidate was
/// refused. With no refusal at all, `/` is used.
fn resolve_start_dir(
    accessor: &dyn FileSystemAccessor,
    candidates: Vec<PathBuf>,
) -> (AppStatus, PathBuf) {
    let mut first_denied: Option<PathBuf> = None;

    for dir in candidates {
        match accessor.probe_access(&dir) {
            Ok(()) => return (AppStatus::Ready, dir),
            Err(e) if e.is_permission_denied() => {
                warn!(dir = %dir.display(), "Start candidate refused, trying next");
                first_denied.get_or_insert(dir);
            }
            Err(e) => debug!(dir = %dir.display(), error = %e, "Start candidate unusable"),
        }
    }

    match first_denied {
        Some(path) => (AppStatus::PermissionDenied { path: path.clone() }, path),
        None => (AppStatus::Ready, PathBuf::from("/")),
    }
}

fn validate_folder_name(name: &str) -> AppResult<&str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::invalid_input("name", "Folder name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(AppError::invalid_input("name", "Folder name cannot be '.' or '..'"));
    }
    if name.contains(['/', '\\']) {
        return Err(AppError::invalid_input(
            "name",
            "Folder name cannot contain path separators",
        ));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::accessor::LocalFileSystem;
    use crate::model::selection::ModeKind;
    use crate::preferences::MemoryPreferenceStore;
    use tempfile::TempDir;

    /// tmp/
    ///   a.txt
    ///   docs/
    ///     report.pdf
    ///     notes/
    ///       todo.txt
    ///   dest/
    fn sample_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir_all(tmp.path().join("docs/notes")).unwrap();
        std::fs::write(tmp.path().join("docs/report.pdf"), b"pdf").unwrap();
        std::fs::write(tmp.path().join("docs/notes/todo.txt"), b"todo").unwrap();
        std::fs::create_dir(tmp.path().join("dest")).unwrap();
        tmp
    }

    async fn loop_at(dir: &Path) -> (EventLoop, BrowserHandle, Arc<MemoryPreferenceStore>) {
        let prefs = Arc::new(MemoryPreferenceStore::with_last_visited(dir.to_path_buf()));
        let (mut event_loop, handle) =
            EventLoop::start(Config::default(), Arc::new(LocalFileSystem), prefs.clone()).await;
        event_loop.settle().await;
        (event_loop, handle, prefs)
    }

    fn entry(path: &Path) -> Entry {
        Entry::from_path(path).unwrap()
    }

    fn names(event_loop: &EventLoop) -> Vec<String> {
        BrowserSnapshot::from(event_loop.state())
            .entries
            .iter()
            .map(|e| e.name.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_start_opens_last_visited() {
        let tmp = sample_tree();
        let (event_loop, handle, _) = loop_at(tmp.path()).await;

        assert_eq!(event_loop.state().cwd(), tmp.path());
        assert_eq!(names(&event_loop), vec!["dest", "docs", "a.txt"]);
        assert_eq!(handle.snapshot().entries.len(), 3);
        assert!(!handle.snapshot().is_loading);
    }

    #[tokio::test]
    async fn test_start_falls_back_to_configured_dir() {
        let tmp = sample_tree();
        let prefs = Arc::new(MemoryPreferenceStore::with_last_visited(
            tmp.path().join("deleted-since"),
        ));
        let config = Config {
            start_dir: Some(tmp.path().join("docs")),
            ..Config::default()
        };

        let (event_loop, _handle) =
            EventLoop::start(config, Arc::new(LocalFileSystem), prefs.clone()).await;

        assert_eq!(event_loop.state().cwd(), tmp.path().join("docs"));
        // startup does not rewrite the preference
        assert_eq!(prefs.current(), Some(tmp.path().join("deleted-since")));
    }

    #[tokio::test]
    async fn test_navigation_persists_and_highlights() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, prefs) = loop_at(tmp.path()).await;
        let docs = tmp.path().join("docs");

        event_loop.handle_action(Action::Activate(entry(&docs))).await;
        event_loop.settle().await;
        assert_eq!(event_loop.state().cwd(), docs);
        assert_eq!(prefs.current(), Some(docs.clone()));
        assert_eq!(names(&event_loop), vec!["notes", "report.pdf"]);

        event_loop.handle_action(Action::NavigateUp).await;
        event_loop.settle().await;
        assert_eq!(event_loop.state().cwd(), tmp.path());
        assert_eq!(event_loop.state().fs.highlight.as_deref(), Some(docs.as_path()));

        event_loop.handle_action(Action::CycleViewMode).await;
        assert!(event_loop.state().fs.highlight.is_none());
    }

    #[tokio::test]
    async fn test_activate_file_requests_open() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        let file = tmp.path().join("a.txt");
        event_loop.handle_action(Action::Activate(entry(&file))).await;
        assert_eq!(event_loop.state().open_request.as_deref(), Some(file.as_path()));
        assert_eq!(event_loop.state().cwd(), tmp.path());
    }

    #[tokio::test]
    async fn test_navigate_up_at_root_is_noop() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::ResetNavigation(PathBuf::from("/"))).await;
        event_loop.settle().await;
        event_loop.handle_action(Action::NavigateUp).await;

        assert_eq!(event_loop.state().cwd(), Path::new("/"));
        assert!(event_loop.state().fs.highlight.is_none());
    }

    #[tokio::test]
    async fn test_search_follow_and_return() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::Search("TXT".to_string())).await;
        event_loop.settle().await;
        assert_eq!(names(&event_loop), vec!["a.txt", "todo.txt"]);

        let todo = tmp.path().join("docs/notes/todo.txt");
        event_loop.handle_action(Action::Activate(entry(&todo))).await;
        event_loop.settle().await;

        let state = event_loop.state();
        assert_eq!(state.cwd(), tmp.path().join("docs/notes"));
        assert!(!state.search.is_active());
        assert!(state.search.can_return());
        assert_eq!(names(&event_loop), vec!["todo.txt"]);

        event_loop.handle_action(Action::ReturnToResults).await;
        let state = event_loop.state();
        assert_eq!(state.search.active().unwrap().query, "TXT");
        assert!(!state.search.can_return());
        assert_eq!(names(&event_loop), vec!["a.txt", "todo.txt"]);
    }

    #[tokio::test]
    async fn test_new_search_discards_stash_and_blank_is_ignored() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::Search("docs".to_string())).await;
        event_loop.settle().await;
        event_loop
            .handle_action(Action::Activate(entry(&tmp.path().join("docs"))))
            .await;
        event_loop.settle().await;
        assert!(event_loop.state().search.can_return());

        event_loop.handle_action(Action::Search("   ".to_string())).await;
        assert!(event_loop.state().search.can_return());
        assert!(event_loop.state().pending_search.is_none());

        event_loop.handle_action(Action::Search("todo".to_string())).await;
        assert!(!event_loop.state().search.can_return());
        event_loop.settle().await;
        assert_eq!(names(&event_loop), vec!["todo.txt"]);
    }

    #[tokio::test]
    async fn test_navigate_up_dismisses_results_first() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::Search("pdf".to_string())).await;
        event_loop.settle().await;
        event_loop.handle_action(Action::NavigateUp).await;

        assert!(!event_loop.state().search.is_active());
        assert_eq!(event_loop.state().cwd(), tmp.path());
        assert_eq!(names(&event_loop).len(), 3);
    }

    #[tokio::test]
    async fn test_navigation_discards_pending_search() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::Search("txt".to_string())).await;
        event_loop
            .handle_action(Action::NavigateTo(tmp.path().join("dest")))
            .await;
        event_loop.settle().await;

        assert!(!event_loop.state().search.is_active());
        assert!(names(&event_loop).is_empty());
    }

    #[tokio::test]
    async fn test_stale_listing_is_dropped() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop
            .handle_action(Action::NavigateTo(tmp.path().join("docs")))
            .await;
        event_loop
            .handle_action(Action::NavigateTo(tmp.path().join("dest")))
            .await;
        event_loop.settle().await;
        assert!(names(&event_loop).is_empty());

        let bogus = entry(&tmp.path().join("a.txt"));
        event_loop.handle_task_result(TaskResult::DirectoryLoaded {
            request_id: 0,
            path: tmp.path().join("dest"),
            entries: vec![bogus],
        });
        assert!(names(&event_loop).is_empty());
    }

    #[tokio::test]
    async fn test_delete_selection_refreshes() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop
            .handle_action(Action::LongPress(entry(&tmp.path().join("a.txt"))))
            .await;
        event_loop
            .handle_action(Action::Activate(entry(&tmp.path().join("docs"))))
            .await;
        assert_eq!(event_loop.state().mode.selected().unwrap().len(), 2);

        event_loop.handle_action(Action::DeleteSelected).await;
        assert_eq!(event_loop.state().mode.kind(), ModeKind::Normal);
        event_loop.settle().await;

        assert!(!tmp.path().join("docs").exists());
        assert_eq!(names(&event_loop), vec!["dest"]);
        let report = event_loop.state().last_report.as_ref().unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert!(event_loop.state().pending_ops.is_empty());
    }

    #[tokio::test]
    async fn test_delete_refreshes_active_search() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop.handle_action(Action::Search("txt".to_string())).await;
        event_loop.settle().await;
        event_loop
            .handle_action(Action::LongPress(entry(&tmp.path().join("a.txt"))))
            .await;
        event_loop.handle_action(Action::DeleteSelected).await;
        event_loop.settle().await;

        assert!(event_loop.state().search.is_active());
        assert_eq!(names(&event_loop), vec!["todo.txt"]);
    }

    #[tokio::test]
    async fn test_move_survives_navigation_and_pastes() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;
        let dest = tmp.path().join("dest");

        event_loop
            .handle_action(Action::LongPress(entry(&tmp.path().join("a.txt"))))
            .await;
        event_loop.handle_action(Action::MoveSelected).await;
        event_loop.handle_action(Action::Activate(entry(&dest))).await;
        event_loop.settle().await;
        assert_eq!(event_loop.state().mode.kind(), ModeKind::Moving);

        event_loop.handle_action(Action::PasteHere).await;
        event_loop.settle().await;

        assert!(dest.join("a.txt").is_file());
        assert!(!tmp.path().join("a.txt").exists());
        assert_eq!(names(&event_loop), vec!["a.txt"]);
        assert_eq!(event_loop.state().mode.kind(), ModeKind::Normal);
    }

    #[tokio::test]
    async fn test_selection_dropped_on_navigation() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop
            .handle_action(Action::LongPress(entry(&tmp.path().join("a.txt"))))
            .await;
        event_loop
            .handle_action(Action::NavigateTo(tmp.path().join("docs")))
            .await;
        assert_eq!(event_loop.state().mode.kind(), ModeKind::Normal);
    }

    #[tokio::test]
    async fn test_reset_navigation_clears_everything() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop
            .handle_action(Action::LongPress(entry(&tmp.path().join("a.txt"))))
            .await;
        event_loop.handle_action(Action::MoveSelected).await;
        event_loop.handle_action(Action::Search("pdf".to_string())).await;
        event_loop.settle().await;

        event_loop
            .handle_action(Action::ResetNavigation(tmp.path().join("docs")))
            .await;
        event_loop.settle().await;

        let state = event_loop.state();
        assert_eq!(state.mode.kind(), ModeKind::Normal);
        assert!(!state.search.is_active());
        assert!(!state.search.can_return());
        assert_eq!(state.cwd(), tmp.path().join("docs"));
    }

    #[tokio::test]
    async fn test_create_directory_validates_name() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        for bad in ["", "  ", "..", "a/b"] {
            event_loop
                .handle_action(Action::CreateDirectory(bad.to_string()))
                .await;
            assert!(event_loop.state().last_error.is_some(), "accepted {bad:?}");
            assert!(event_loop.state().pending_ops.is_empty());
        }

        event_loop
            .handle_action(Action::CreateDirectory(" Photos ".to_string()))
            .await;
        assert!(event_loop.state().last_error.is_none());
        event_loop.settle().await;

        assert!(tmp.path().join("Photos").is_dir());
        assert!(names(&event_loop).contains(&"Photos".to_string()));
    }

    #[tokio::test]
    async fn test_filter_cleared_on_directory_change() {
        let tmp = sample_tree();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        event_loop
            .handle_action(Action::SetFilter(Some("TXT".to_string())))
            .await;
        assert_eq!(names(&event_loop), vec!["a.txt"]);

        event_loop
            .handle_action(Action::NavigateTo(tmp.path().join("docs")))
            .await;
        event_loop.settle().await;
        assert!(event_loop.state().fs.filter.is_none());
        assert_eq!(names(&event_loop).len(), 2);
    }

    struct DeniedAccessor;

    impl FileSystemAccessor for DeniedAccessor {
        fn list_children(&self, dir: &Path) -> AppResult<Vec<Entry>> {
            Err(AppError::PermissionDenied(dir.to_path_buf()))
        }

        fn create_directory(&self, parent: &Path, _name: &str) -> AppResult<PathBuf> {
            Err(AppError::PermissionDenied(parent.to_path_buf()))
        }

        fn delete_recursive(&self, path: &Path) -> AppResult<()> {
            Err(AppError::PermissionDenied(path.to_path_buf()))
        }

        fn move_or_rename(&self, source: &Path, _dest: &Path) -> AppResult<()> {
            Err(AppError::PermissionDenied(source.to_path_buf()))
        }

        fn probe_access(&self, dir: &Path) -> AppResult<()> {
            Err(AppError::PermissionDenied(dir.to_path_buf()))
        }
    }

    #[tokio::test]
    async fn test_permission_denied_is_terminal() {
        let prefs = Arc::new(MemoryPreferenceStore::with_last_visited(PathBuf::from(
            "/storage",
        )));
        let (mut event_loop, handle) =
            EventLoop::start(Config::default(), Arc::new(DeniedAccessor), prefs).await;

        assert_eq!(
            handle.snapshot().status,
            AppStatus::PermissionDenied {
                path: PathBuf::from("/storage")
            }
        );

        event_loop
            .handle_action(Action::NavigateTo(PathBuf::from("/other")))
            .await;
        assert_eq!(event_loop.state().cwd(), Path::new("/storage"));
        assert!(event_loop.state().pending_listing.is_none());
    }

    /// Local filesystem with one directory that refuses to be read.
    struct LockedDir {
        locked: PathBuf,
    }

    impl LockedDir {
        fn check(&self, path: &Path) -> AppResult<()> {
            if path == self.locked {
                Err(AppError::PermissionDenied(path.to_path_buf()))
            } else {
                Ok(())
            }
        }
    }

    impl FileSystemAccessor for LockedDir {
        fn list_children(&self, dir: &Path) -> AppResult<Vec<Entry>> {
            self.check(dir)?;
            LocalFileSystem.list_children(dir)
        }

        fn create_directory(&self, parent: &Path, name: &str) -> AppResult<PathBuf> {
            LocalFileSystem.create_directory(parent, name)
        }

        fn delete_recursive(&self, path: &Path) -> AppResult<()> {
            LocalFileSystem.delete_recursive(path)
        }

        fn move_or_rename(&self, source: &Path, dest: &Path) -> AppResult<()> {
            LocalFileSystem.move_or_rename(source, dest)
        }

        fn probe_access(&self, dir: &Path) -> AppResult<()> {
            self.check(dir)?;
            LocalFileSystem.probe_access(dir)
        }
    }

    #[tokio::test]
    async fn test_unreadable_last_visited_does_not_disable_browser() {
        let tmp = sample_tree();
        let docs = tmp.path().join("docs");
        let accessor = Arc::new(LockedDir {
            locked: docs.clone(),
        });
        let prefs = Arc::new(MemoryPreferenceStore::with_last_visited(
            tmp.path().to_path_buf(),
        ));

        let (mut first, _handle) =
            EventLoop::start(Config::default(), accessor.clone(), prefs.clone()).await;
        first.settle().await;
        first.handle_action(Action::NavigateTo(docs.clone())).await;
        first.settle().await;
        assert!(names(&first).is_empty());
        assert_eq!(prefs.current(), Some(docs.clone()));

        let config = Config {
            start_dir: Some(tmp.path().to_path_buf()),
            ..Config::default()
        };
        let (mut second, handle) = EventLoop::start(config, accessor, prefs).await;
        second.settle().await;

        assert_eq!(handle.snapshot().status, AppStatus::Ready);
        assert_eq!(second.state().cwd(), tmp.path());
        assert_eq!(names(&second).len(), 3);
    }

    #[test]
    fn test_resolve_start_dir_skips_refused_candidates() {
        let tmp = sample_tree();
        let docs = tmp.path().join("docs");
        let accessor = LockedDir {
            locked: docs.clone(),
        };

        let (status, dir) = resolve_start_dir(
            &accessor,
            vec![docs.clone(), tmp.path().join("missing"), tmp.path().join("dest")],
        );
        assert_eq!(status, AppStatus::Ready);
        assert_eq!(dir, tmp.path().join("dest"));

        let (status, dir) =
            resolve_start_dir(&accessor, vec![tmp.path().join("missing"), docs.clone()]);
        assert_eq!(status, AppStatus::PermissionDenied { path: docs.clone() });
        assert_eq!(dir, docs);

        let (status, dir) = resolve_start_dir(&accessor, vec![tmp.path().join("missing")]);
        assert_eq!(status, AppStatus::Ready);
        assert_eq!(dir, Path::new("/"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_entered() {
        let tmp = sample_tree();
        let link = tmp.path().join("docs_link");
        std::os::unix::fs::symlink(tmp.path().join("docs"), &link).unwrap();
        let (mut event_loop, _handle, _) = loop_at(tmp.path()).await;

        let linked = entry(&link);
        assert!(linked.is_dir && linked.is_symlink);

        event_loop.handle_action(Action::Activate(linked.clone())).await;
        event_loop.settle().await;
        assert_eq!(event_loop.state().cwd(), link);
        assert!(event_loop.state().open_request.is_none());
        assert_eq!(names(&event_loop), vec!["notes", "report.pdf"]);

        event_loop
            .handle_action(Action::ResetNavigation(tmp.path().to_path_buf()))
            .await;
        event_loop.handle_action(Action::Search("link".to_string())).await;
        event_loop.settle().await;
        assert_eq!(names(&event_loop), vec!["docs_link"]);

        event_loop.handle_action(Action::Activate(linked)).await;
        event_loop.settle().await;
        assert_eq!(event_loop.state().cwd(), link);
        assert!(event_loop.state().search.can_return());
    }

    #[tokio::test]
    async fn test_run_publishes_snapshots() {
        let tmp = sample_tree();
        let prefs = Arc::new(MemoryPreferenceStore::with_last_visited(
            tmp.path().to_path_buf(),
        ));
        let (event_loop, mut handle) =
            EventLoop::start(Config::default(), Arc::new(LocalFileSystem), prefs).await;
        let runner = tokio::spawn(event_loop.run());

        let docs = tmp.path().join("docs");
        handle.send(Action::NavigateTo(docs.clone())).unwrap();
        let snap = handle
            .wait_for(|s| s.cwd == docs && !s.is_loading)
            .await
            .unwrap();
        assert_eq!(snap.entries.len(), 2);

        handle.send(Action::Quit).unwrap();
        runner.await.unwrap();
        assert!(handle.send(Action::Refresh).is_err());
    }

    #[test]
    fn test_validate_folder_name() {
        assert_eq!(validate_folder_name("  New  ").unwrap(), "New");
        assert!(validate_folder_name(".").is_err());
        assert!(validate_folder_name("a\\b").is_err());
        assert!(validate_folder_name(".hidden").is_ok());
    }
}
