/// Tag extraction errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `TagError`
pub type Result<T> = std::result::Result<T, TagError>;

#[derive(Error, Debug)]
pub enum TagError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported or unreadable audio file
    #[error("Cannot read tags: {0}")]
    Read(#[from] lofty::error::LoftyError),

    /// Artwork too large
    #[error("Artwork too large: {0} bytes (max {1})")]
    TooLarge(usize, usize),

    /// I/O error while writing artwork
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TagError> for pod_core::PodError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::Io(e) => pod_core::PodError::Io(e),
            other => pod_core::PodError::metadata(other.to_string()),
        }
    }
}
