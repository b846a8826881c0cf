use pod_catalog::CatalogError;
use pod_core::PodError;
use thiserror::Error;

/// Errors that can occur during sync and catalog maintenance commands
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Core(#[from] PodError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Playlist '{0}' doesn't exist")]
    UnknownPlaylist(String),

    #[error("Playlist '{0}' already exists")]
    PlaylistExists(String),

    #[error("Playlist '{0}' is not a smart playlist")]
    NotSmart(String),

    #[error("Catalog has no {0} playlist")]
    MissingPlaylist(&'static str),

    #[error("Invalid usage: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Whether the error is an unrecoverable setup failure
    /// (missing mount, unreadable catalog, unknown playlist)
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::Catalog(
                CatalogError::MountNotFound(_)
                    | CatalogError::Unreadable { .. }
                    | CatalogError::Malformed { .. }
            ) | Self::UnknownPlaylist(_)
                | Self::PlaylistExists(_)
                | Self::NotSmart(_)
                | Self::MissingPlaylist(_)
                | Self::Core(PodError::Catalog(_))
        )
    }

    /// Whether the error comes from invalid command input
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Core(PodError::InvalidInput(_)))
    }
}
