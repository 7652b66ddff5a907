use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input format error: {0}")]
    InputFormat(String),

    #[error("inconsistent matrices: {0}")]
    InconsistentMatrix(String),

    #[error("headers not consistent across matrices: {}", path.display())]
    HeaderMismatch { path: PathBuf },

    #[error(
        "row names do not match across matrices: {} row {row} expected '{expected}', found '{found}'",
        path.display()
    )]
    RowMismatch {
        path: PathBuf,
        row: usize,
        expected: String,
        found: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("analysis not ready: {0}")]
    AnalysisNotReady(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
