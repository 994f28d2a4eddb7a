use std::path::PathBuf;
use thiserror::Error;

use crate::engine::JobStatus;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The source location of a partition does not name a document.
    #[error("cannot resolve document id for partition {0}")]
    MissingDocumentId(PathBuf),

    #[error("input path does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("output location already exists: {0}")]
    OutputExists(PathBuf),

    #[error("engine is busy; cannot accept job {0}")]
    EngineBusy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed index record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("output at {0} is incomplete (no _SUCCESS marker)")]
    IncompleteOutput(PathBuf),

    #[error("illegal job state transition {from:?} -> {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("task {task} failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
