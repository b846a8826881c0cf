use pod_core::{PlaylistId, PodError, TrackId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the file-backed catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Device mount not found: {0}")]
    MountNotFound(PathBuf),

    #[error("Cannot read catalog {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    #[error("Cannot remove built-in playlist '{0}'")]
    BuiltinPlaylist(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<CatalogError> for PodError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io(e) => PodError::Io(e),
            CatalogError::Serialization(e) => PodError::Serialization(e),
            CatalogError::TrackNotFound(id) => PodError::TrackNotFound(id),
            CatalogError::PlaylistNotFound(id) => PodError::PlaylistNotFound(id),
            CatalogError::BuiltinPlaylist(name) => {
                PodError::invalid_input(format!("cannot remove built-in playlist '{name}'"))
            }
            other => PodError::catalog(other.to_string()),
        }
    }
}
