// Store configuration loaded from YAML

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hard ceiling on any page size
pub const MAX_PAGE_LIMIT: usize = 100;

const fn default_limit() -> usize {
    50
}

const fn default_max_limit() -> usize {
    100
}

const fn default_popular_tags() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination bounds for queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size when a query gives no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Upper clamp for any requested limit, itself capped at `MAX_PAGE_LIMIT`
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Fallback filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub page: PageConfig,

    /// How many tags the stats report lists as popular
    #[serde(default = "default_popular_tags")]
    pub popular_tags: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            page: PageConfig::default(),
            popular_tags: default_popular_tags(),
        }
    }
}

impl Config {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).wrap_err("Failed to parse config YAML")?;
        config.checked()
    }

    /// Load from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read config file {:?}", path))?;
        debug!(path = ?path, "Loaded config file");
        Self::from_yaml(&content)
    }

    /// Load from the user config dir, or defaults when no file exists
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/taskindex/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskindex").join("config.yaml"))
    }

    fn checked(mut self) -> Result<Self> {
        if self.page.max_limit == 0 {
            return Err(eyre!("page.max_limit must be at least 1"));
        }
        self.page.max_limit = self.page.max_limit.min(MAX_PAGE_LIMIT);
        self.page.default_limit = self.page.default_limit.clamp(1, self.page.max_limit);
        Ok(self)
    }
}
