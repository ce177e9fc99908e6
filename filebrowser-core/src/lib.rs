pub mod error;

pub mod config;

pub mod preferences;
pub use preferences::{MemoryPreferenceStore, PreferenceStore, TomlPreferenceStore};

pub mod controller {

    pub mod actions;
    pub use actions::Action;

    pub mod event_loop;
    pub use event_loop::{BrowserHandle, EventLoop, TaskResult};
}

pub mod model {
    pub mod app_state;
    pub use app_state::{AppState, AppStatus};

    pub mod fs_state;
    pub use fs_state::{FSState, ViewMode};

    pub mod search_state;
    pub use search_state::{SearchResults, SearchState};

    pub mod selection;
    pub use selection::{EntrySet, ModeKind, UiMode};

    pub mod sort_filter;
    pub use sort_filter::{DescendingPolicy, SortDirection, SortKey, SortOrder, present};
}

pub mod view {
    pub mod snapshots;
    pub use snapshots::*;
}

pub use view::*;

pub mod fs {
    pub mod accessor;
    pub use accessor::{FileSystemAccessor, LocalFileSystem};

    pub mod dir_scanner;

    pub mod entry;
    pub use entry::Entry;
}

pub mod operators {
    pub mod filename_search_task;

    pub mod file_system_operator;
    pub use file_system_operator::{
        FileSystemOperation, OperationKind, OperationReport, RequestId, WorkerPool,
    };
}

pub mod logging;
pub use logging::{LoggerConfig, init_logging};

pub use config::Config;

pub use error::{AppError, AppResult};

pub use controller::{Action, BrowserHandle, EventLoop};

pub use fs::{Entry, FileSystemAccessor, LocalFileSystem};
