//! Dashboard configuration.
//!
//! Read from an optional TOML file; every field falls back to a default.
//!
//! ```toml
//! data_path = "seattle_requests_2024_2025.json"
//! closed_label = "Closed"
//! top_departments = 10
//! top_types = 15
//! top_communities = 10
//! granularity = "weekly"
//! log_level = "info"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, Granularity};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";
pub const DATA_PATH_ENV: &str = "DASHBOARD_DATA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON dataset produced by the ingestion job
    pub data_path: PathBuf,
    /// Status label counted as closed
    pub closed_label: String,
    pub top_departments: usize,
    pub top_types: usize,
    pub top_communities: usize,
    /// Default time-series bucket width
    pub granularity: Granularity,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("seattle_requests_2024_2025.json"),
            closed_label: aggregate::DEFAULT_CLOSED_LABEL.to_string(),
            top_departments: aggregate::DEFAULT_TOP_DEPARTMENTS,
            top_types: aggregate::DEFAULT_TOP_TYPES,
            top_communities: aggregate::DEFAULT_TOP_COMMUNITIES,
            granularity: Granularity::Weekly,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Explicit file if given, else `dashboard.toml` when present, else
    /// defaults. `DASHBOARD_DATA` then overrides the dataset path.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATA_PATH_ENV).filter(|value| !value.is_empty()) {
            self.data_path = PathBuf::from(path);
        }
    }
}
