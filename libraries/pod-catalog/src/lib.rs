//! File-backed track store for podsync.
//!
//! One JSON catalog format serves both sides of a sync: the local mirror
//! (absolute track paths) and the device (paths relative to the mount point,
//! audio under `iPod_Control/Music/Fnn`). Smart playlists are evaluated by
//! [`spl::evaluate`].

mod catalog;
mod error;
pub mod spl;

pub use catalog::{
    FileCatalog, ARTWORK_DIR, DEVICE_CATALOG_PATH, MASTER_PLAYLIST_NAME, MUSIC_DIR,
    PODCASTS_PLAYLIST_NAME,
};
pub use error::{CatalogError, Result};
