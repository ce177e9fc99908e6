//! src/config.rs
//! ============================================================================
//! # Config: Browser Configuration Loader and Saver
//!
//! User-editable settings, stored as TOML in the platform config directory
//! resolved through [`directories`](https://docs.rs/directories).
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load().await?;
//! config.save().await?;
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use tokio::fs as TokioFs;

use crate::logging::LoggerConfig;
use crate::model::fs_state::ViewMode;
use crate::model::sort_filter::SortOrder;

pub(crate) const QUALIFIER: &str = "org";
pub(crate) const ORGANIZATION: &str = "filebrowser";
pub(crate) const APPLICATION: &str = "FileBrowser";

/// Main configuration struct for the browser core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Include names starting with '.'.
    pub show_hidden: bool,

    /// Directory to open when no last-visited path is stored.
    pub start_dir: Option<PathBuf>,

    pub sort: SortOrder,

    pub view_mode: ViewMode,

    /// Concurrent blocking filesystem workers.
    pub fs_workers: usize,

    pub logging: LoggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_hidden: true,
            start_dir: None,
            sort: SortOrder::default(),
            view_mode: ViewMode::default(),
            fs_workers: 1,
            logging: LoggerConfig::default(),
        }
    }
}

impl Config {
    /// Loads config from the platform config dir, writing defaults on first run.
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save_to(&path).await?;

            Ok(default_config)
        }
    }

    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        info!("Loading config from {}", path.display());
        let text = TokioFs::read_to_string(path).await?;
        let cfg: Self = toml::from_str(&text)?;

        Ok(cfg.normalized())
    }

    /// Saves config to the platform config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    // at least one worker
    pub(crate) fn normalized(mut self) -> Self {
        self.fs_workers = self.fs_workers.max(1);
        self
    }
}
