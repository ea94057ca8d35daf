//! Error types for loading datasets and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal dataset load failure. No partial table is ever returned.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Input file does not exist
    #[error("dataset not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Input exists but does not match the record schema
    #[error("malformed dataset {}: {detail}", path.display())]
    SourceMalformed { path: PathBuf, detail: String },

    /// Any other read failure
    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::SourceMalformed {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
