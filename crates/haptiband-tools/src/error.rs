//! 图案库错误类型

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Failed to access pattern file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid pattern library JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern {name:?}: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("Pattern not found: {0}")]
    NotFound(String),
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
