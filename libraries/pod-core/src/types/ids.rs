/// ID types for catalog entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier, unique within one catalog instance.
///
/// Local and device catalogs number their tracks independently; ids from
/// the two spaces are never compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(u32);

impl TrackId {
    /// Placeholder id carried by a track that has not been added to a catalog
    pub const UNASSIGNED: TrackId = TrackId(0);

    /// Create a track ID from its raw value
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this id refers to a catalog entry
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TrackId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Playlist identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(u64);

impl PlaylistId {
    /// Placeholder id for a playlist not yet added to a catalog
    pub const UNASSIGNED: PlaylistId = PlaylistId(0);

    /// Create a playlist ID from its raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<u64> for PlaylistId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
