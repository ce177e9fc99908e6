//! Last-visited directory preference.
//!
//! The only persisted state: one absolute path, read once at startup and
//! written on every directory change.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::debug;

use crate::config::{APPLICATION, ORGANIZATION, QUALIFIER};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait PreferenceStore: Send + Sync + 'static {
    async fn last_visited(&self) -> AppResult<Option<PathBuf>>;

    async fn set_last_visited(&self, path: &Path) -> AppResult<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    last_visited: Option<PathBuf>,
}

/// Stores the preference as `state.toml` in the platform data directory.
#[derive(Debug, Clone)]
pub struct TomlPreferenceStore {
    file_path: PathBuf,
}

impl TomlPreferenceStore {
    #[must_use]
    pub const fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Store under the platform data dir resolved by `directories`.
    pub fn platform_default() -> AppResult<Self> {
        let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or_else(|| AppError::Other("Could not determine data directory.".to_string()))?;

        Ok(Self::new(dirs.data_dir().join("state.toml")))
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

#[async_trait]
impl PreferenceStore for TomlPreferenceStore {
    async fn last_visited(&self) -> AppResult<Option<PathBuf>> {
        let text = match TokioFs::read_to_string(&self.file_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AppError::ConfigIo {
                    path: self.file_path.clone(),
                    source,
                });
            }
        };

        let state: PersistedState = toml::from_str(&text)?;
        Ok(state.last_visited)
    }

    async fn set_last_visited(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            TokioFs::create_dir_all(parent)
                .await
                .map_err(|source| AppError::ConfigIo {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let state = PersistedState {
            last_visited: Some(path.to_path_buf()),
        };
        let text = toml::to_string(&state)?;

        // write-then-rename
        let tmp_path = self.file_path.with_extension("tmp");
        TokioFs::write(&tmp_path, text)
            .await
            .map_err(|source| AppError::ConfigIo {
                path: tmp_path.clone(),
                source,
            })?;
        TokioFs::rename(&tmp_path, &self.file_path)
            .await
            .map_err(|source| AppError::ConfigIo {
                path: self.file_path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "Persisted last visited directory");
        Ok(())
    }
}

/// In-process store for embedding without persistence.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    last_visited: Mutex<Option<PathBuf>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn with_last_visited(path: PathBuf) -> Self {
        Self {
            last_visited: Mutex::new(Some(path)),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<PathBuf> {
        self.last_visited
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn last_visited(&self) -> AppResult<Option<PathBuf>> {
        Ok(self.current())
    }

    async fn set_last_visited(&self, path: &Path) -> AppResult<()> {
        let mut guard = self
            .last_visited
            .lock()
            .map_err(|e| AppError::Other(e.to_string()))?;
        *guard = Some(path.to_path_buf());
        Ok(())
    }
}
