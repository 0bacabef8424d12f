use docx_store::StoreError;
use thiserror::Error;

/// Errors raised while validating or executing a document command
#[derive(Error, Debug)]
pub enum DocEditError {
    #[error("Pre-conditions not met")]
    PreconditionFailed,

    #[error("Could not find target location: {0}")]
    LocationNotFound(String),

    #[error("Content required for {0} actions")]
    MissingContent(String),

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Post-conditions not met")]
    PostconditionFailed,

    #[error("Document error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for DocEditError {
    fn from(err: serde_json::Error) -> Self {
        DocEditError::InvalidCommand(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocEditError>;
