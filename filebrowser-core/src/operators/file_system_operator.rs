//! ``src/operators/file_system_operator.rs``
//! ============================================================================
//! # `FileSystemOperator`: Blocking Work off the Event Loop
//!
//! Action -> Event Loop -> `WorkerPool::dispatch` -> `FileSystemOperator`
//!
//! Every blocking filesystem call runs here, on `spawn_blocking`, gated by a
//! semaphore sized from `Config::fs_workers`. Results travel back to the event
//! loop as `TaskResult`s tagged with the request id they were dispatched under.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use compact_str::CompactString;
use tokio::sync::{Semaphore, mpsc::UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::controller::event_loop::TaskResult;
use crate::error::AppError;
use crate::fs::accessor::FileSystemAccessor;
use crate::fs::dir_scanner::scan_dir;
use crate::operators::filename_search_task::run_search;

/// Monotonic id stamped on every dispatched request.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemOperation {
    ListDirectory {
        path: PathBuf,
    },

    Search {
        root: PathBuf,
        query: CompactString,
    },

    CreateDirectory {
        parent: PathBuf,
        name: String,
    },

    /// Best-effort recursive delete of every path.
    Delete {
        paths: Vec<PathBuf>,
    },

    /// Best-effort rename of every source to `dest_dir/<base name>`.
    MoveInto {
        sources: Vec<PathBuf>,
        dest_dir: PathBuf,
    },
}

/// Kind tag carried by `OperationReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    CreateDirectory,
    Delete,
    Move,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateDirectory => "create_directory",
            Self::Delete => "delete",
            Self::Move => "move",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a mutating operation; failures never abort the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl OperationReport {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn record(&mut self, path: &Path, result: Result<(), AppError>) {
        match result {
            Ok(()) => self.succeeded.push(path.to_path_buf()),
            Err(e) => {
                warn!(operation = %self.kind, path = %path.display(), error = %e, "Item failed, continuing");
                self.failed.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl FileSystemOperation {
    /// Get operation name for logging
    #[must_use]
    pub const fn operation_name(&self) -> &'static str {
        match self {
            Self::ListDirectory { .. } => "list_directory",
            Self::Search { .. } => "search",
            Self::CreateDirectory { .. } => "create_directory",
            Self::Delete { .. } => "delete",
            Self::MoveInto { .. } => "move_into",
        }
    }

    /// Run to completion on the current (blocking) thread.
    pub fn execute(self, request_id: RequestId, accessor: &dyn FileSystemAccessor) -> TaskResult {
        match self {
            Self::ListDirectory { path } => {
                let entries = scan_dir(accessor, &path);
                TaskResult::DirectoryLoaded {
                    request_id,
                    path,
                    entries,
                }
            }

            Self::Search { root, query } => {
                let results = run_search(accessor, &root, &query);
                TaskResult::SearchCompleted {
                    request_id,
                    root,
                    query,
                    results,
                }
            }

            Self::CreateDirectory { parent, name } => {
                let mut report = OperationReport::new(OperationKind::CreateDirectory);
                let target = parent.join(&name);
                report.record(&target, accessor.create_directory(&parent, &name).map(|_| ()));
                TaskResult::OperationCompleted { request_id, report }
            }

            Self::Delete { paths } => {
                let mut report = OperationReport::new(OperationKind::Delete);
                for path in &paths {
                    report.record(path, accessor.delete_recursive(path));
                }
                TaskResult::OperationCompleted { request_id, report }
            }

            Self::MoveInto { sources, dest_dir } => {
                let mut report = OperationReport::new(OperationKind::Move);
                for source in &sources {
                    report.record(source, move_one(accessor, source, &dest_dir));
                }
                TaskResult::OperationCompleted { request_id, report }
            }
        }
    }
}

fn move_one(
    accessor: &dyn FileSystemAccessor,
    source: &Path,
    dest_dir: &Path,
) -> Result<(), AppError> {
    let name = source.file_name().ok_or_else(|| {
        AppError::file_operation_failed("move", source, "path has no base name")
    })?;
    let dest = dest_dir.join(name);

    if dest == source {
        debug!(path = %source.display(), "Already in destination");
        return Ok(());
    }

    accessor.move_or_rename(source, &dest)
}

impl fmt::Display for FileSystemOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListDirectory { path } => write!(f, "ListDirectory({})", path.display()),
            Self::Search { root, query } => write!(f, "Search({}, {query:?})", root.display()),
            Self::CreateDirectory { parent, name } => {
                write!(f, "CreateDirectory({}/{name})", parent.display())
            }
            Self::Delete { paths } => write!(f, "Delete({} items)", paths.len()),
            Self::MoveInto { sources, dest_dir } => {
                write!(f, "MoveInto({} items -> {})", sources.len(), dest_dir.display())
            }
        }
    }
}

/// Bounded pool of blocking filesystem workers.
#[derive(Clone)]
pub struct WorkerPool {
    accessor: Arc<dyn FileSystemAccessor>,
    permits: Arc<Semaphore>,
    task_tx: UnboundedSender<TaskResult>,
    next_id: RequestId,
}

impl WorkerPool {
    #[must_use]
    pub fn new(
        accessor: Arc<dyn FileSystemAccessor>,
        workers: usize,
        task_tx: UnboundedSender<TaskResult>,
    ) -> Self {
        Self {
            accessor,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            task_tx,
            next_id: 0,
        }
    }

    #[must_use]
    pub fn accessor(&self) -> &Arc<dyn FileSystemAccessor> {
        &self.accessor
    }

    /// Queue `operation` and return the id its result will carry.
    pub fn dispatch(&mut self, operation: FileSystemOperation) -> RequestId {
        self.next_id += 1;
        let request_id = self.next_id;

        debug!(request_id, operation = %operation, "Dispatching filesystem operation");

        FileSystemOperator {
            request_id,
            operation,
            accessor: Arc::clone(&self.accessor),
            permits: Arc::clone(&self.permits),
            task_tx: self.task_tx.clone(),
        }
        .spawn();

        request_id
    }
}

/// One dispatched request on its way through the pool.
pub struct FileSystemOperator {
    pub request_id: RequestId,
    pub operation: FileSystemOperation,
    accessor: Arc<dyn FileSystemAccessor>,
    permits: Arc<Semaphore>,
    task_tx: UnboundedSender<TaskResult>,
}

impl FileSystemOperator {
    pub fn spawn(self) -> JoinHandle<()> {
        let span = info_span!(
            "file_operation_execute",
            request_id = self.request_id,
            operation_type = self.operation.operation_name(),
        );

        tokio::spawn(
            async move {
                let Self {
                    request_id,
                    operation,
                    accessor,
                    permits,
                    task_tx,
                } = self;

                let Ok(_permit) = permits.acquire_owned().await else {
                    warn!("Worker pool closed, dropping request");
                    return;
                };

                let started = Instant::now();
                let joined =
                    tokio::task::spawn_blocking(move || operation.execute(request_id, &*accessor))
                        .await;

                let result = joined.unwrap_or_else(|e| TaskResult::Failed {
                    request_id,
                    error: AppError::task_failed(request_id, e.to_string()),
                });

                info!(
                    duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Filesystem operation finished"
                );

                if task_tx.send(result).is_err() {
                    debug!("Event loop gone, result dropped");
                }
            }
            .instrument(span),
        )
    }
}
