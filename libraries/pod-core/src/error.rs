/// Core error types for podsync
use crate::types::{PlaylistId, TrackId};
use thiserror::Error;

/// Result type alias using `PodError`
pub type Result<T> = std::result::Result<T, PodError>;

/// Core error type for podsync
#[derive(Error, Debug)]
pub enum PodError {
    /// Catalog adapter errors (open, parse, persist)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Tag extraction errors
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Playlist not found
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate entry
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PodError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
