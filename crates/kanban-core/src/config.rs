use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{KanbanError, KanbanResult};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Whether the ordering column may be used.
///
/// `Auto` defers to schema detection at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    #[default]
    Auto,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default)]
    pub ordering: OrderingMode,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("kanban.db")
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            log_level: None,
            default_page_size: default_page_size(),
            ordering: OrderingMode::Auto,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/kanban/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("kanban/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("kanban\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Load from the platform config file, falling back to defaults when it
    /// is absent or unreadable. Environment overrides are applied last.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| Self::from_file(&path).ok())
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load from an explicit path. Unlike [`AppConfig::load`], errors are reported.
    pub fn load_from(path: &Path) -> KanbanResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> KanbanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> KanbanResult<Self> {
        toml::from_str(content).map_err(|e| KanbanError::Serialization(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("KANBAN_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(bind) = std::env::var("KANBAN_BIND") {
            self.bind_address = bind;
        }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn effective_page_size(&self) -> u32 {
        self.default_page_size.clamp(1, MAX_PAGE_SIZE)
    }
}
