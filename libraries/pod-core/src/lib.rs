//! podsync Core
//!
//! Catalog-agnostic domain types, collaborator traits, and error handling for podsync.
//!
//! This crate provides the foundational building blocks shared by the catalog
//! adapter, the tag extractor, the synchronization engine, and the CLI.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `SmartPlaylist`, `SmartRule`
//! - **Rule decode tables**: `RuleField`, `RuleAction`, `LimitKind`, `LimitSort`
//! - **Core Traits**: `Catalog` (track store adapter), `TagReader` (audio tag extractor)
//! - **Error Handling**: Unified `PodError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use pod_core::types::{Playlist, Track};
//!
//! let track = Track::new("My Favorite Song", "/music/song.mp3");
//! assert_eq!(track.stars(), ".");
//!
//! let playlist = Playlist::standard("Road Trip");
//! assert!(!playlist.is_smart());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{PodError, Result};
pub use traits::{Catalog, TagReader};

pub use types::{
    AudioTags, CatalogKind, DiskSpace, LimitKind, LimitSort, Playlist, PlaylistId, PlaylistKind,
    RuleAction, RuleField, SmartLimit, SmartPlaylist, SmartPrefs, SmartRule, Track, TrackId,
    ValueKind, MARK_UNPLAYED_PENDING, MARK_UNPLAYED_UNKNOWN, UNITS_DAY, UNITS_MONTH, UNITS_WEEK,
};
