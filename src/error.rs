#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),

    #[error("task #{0} not found")]
    NotFound(u32),

    #[error("io error at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed task file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },
}

impl TodoError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Validation and lookup failures leave the collection untouched.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

pub type Result<T, E = TodoError> = std::result::Result<T, E>;
