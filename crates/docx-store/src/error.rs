use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document package: {0}")]
    Archive(String),

    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("Document package has no {0} part")]
    MissingPart(String),

    #[error("Paragraph index {index} out of range (document has {count} paragraphs)")]
    IndexOutOfRange { index: usize, count: usize },
}

impl From<zip::result::ZipError> for StoreError {
    fn from(err: zip::result::ZipError) -> Self {
        StoreError::Archive(err.to_string())
    }
}
