use crate::model::DsoRef;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkError {
    /// Bad or missing command-line input. The CLI follows these with usage text.
    #[error("{0}")]
    Args(String),

    #[error("Object not found: {0}")]
    NotFound(DsoRef),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BulkError {
    pub fn args(message: impl Into<String>) -> Self {
        BulkError::Args(message.into())
    }

    /// True for errors caused by the invocation itself rather than the repository.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, BulkError::Args(_))
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;
