use std::path::PathBuf;

use thiserror::Error;

/// Every way a pipeline run can abort. Row-level problems are not here;
/// they travel as [`crate::extract::SkipReason`] values.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("page structure changed: {0}")]
    Structure(String),

    #[error("page parsed but yielded no usable rows ({skipped} skipped)")]
    EmptyResult { skipped: usize },

    #[error("schema initialization failed: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("persisting into {table} failed: {source}")]
    Persistence {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("required tables missing {0}")]
    TablesMissing(&'static str),

    #[error("export to {path:?} failed: {reason}")]
    Export { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        PipelineError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Export {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
