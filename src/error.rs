use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RepoError {
    #[error("missing config file dcc-repo.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no project found for project code '{0}'")]
    UnknownProject(String),

    #[error("invalid last modified timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("missing required field '{field}' in {context}")]
    MissingField { field: &'static str, context: String },

    #[error("unknown workflow type: {0}")]
    UnknownWorkflowType(String),

    #[error("unknown library strategy: {0}")]
    UnknownLibraryStrategy(String),

    #[error("invalid archive document: {0}")]
    InvalidArchive(String),

    #[error("archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("GDC request failed: {0}")]
    GdcHttp(String),

    #[error("GDC returned status {status}: {message}")]
    GdcStatus { status: u16, message: String },

    #[error("could not get {0} after repeated timeouts")]
    GdcRetriesExhausted(String),

    #[error(
        "pagination total ({total}) not equal to files size ({actual}); either a logic error or files were added while iterating"
    )]
    PaginationMismatch { total: u64, actual: u64 },

    #[error("git command failed: {0}")]
    Git(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
