/// Track domain type
use crate::types::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `mark_unplayed` value flagging a podcast episode that still has to be copied
pub const MARK_UNPLAYED_PENDING: u8 = 0x02;

/// Device `mark_unplayed` values at or above this are never merged back
pub const MARK_UNPLAYED_UNKNOWN: u8 = 255;

/// A track as recorded by a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog-local identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    #[serde(default)]
    pub artist: Option<String>,

    /// Album name
    #[serde(default)]
    pub album: Option<String>,

    /// Genre
    #[serde(default)]
    pub genre: Option<String>,

    /// Track number
    #[serde(default)]
    pub track_number: Option<u32>,

    /// Release year
    #[serde(default)]
    pub year: Option<u32>,

    /// Rating, 0-100 in steps of 20 per star
    #[serde(default)]
    pub rating: u8,

    /// Play count
    #[serde(default)]
    pub play_count: u32,

    /// When the track was last played
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,

    /// When the track was added to the catalog
    pub added_at: DateTime<Utc>,

    /// File size in bytes
    #[serde(default)]
    pub size: u64,

    /// Duration in milliseconds
    #[serde(default)]
    pub duration_ms: u32,

    /// Bitrate in kbps
    #[serde(default)]
    pub bitrate: u32,

    /// Catalog-recorded path.
    ///
    /// Absolute for the local catalog, relative to the mount point for the device.
    #[serde(default)]
    pub path: Option<String>,

    /// Whether the file has been transferred to the catalog's storage
    #[serde(default)]
    pub transferred: bool,

    /// Unplayed mark (`MARK_UNPLAYED_PENDING` for pending podcasts)
    #[serde(default)]
    pub mark_unplayed: u8,

    /// Resume position in milliseconds
    #[serde(default)]
    pub bookmark_ms: u32,

    /// Podcast episode flag
    #[serde(default)]
    pub podcast: bool,

    /// Attached thumbnail, relative to the catalog's artwork directory
    #[serde(default)]
    pub artwork: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: TrackId::UNASSIGNED,
            title: title.into(),
            artist: None,
            album: None,
            genre: None,
            track_number: None,
            year: None,
            rating: 0,
            play_count: 0,
            last_played: None,
            added_at: Utc::now(),
            size: 0,
            duration_ms: 0,
            bitrate: 0,
            path: Some(path.into()),
            transferred: false,
            mark_unplayed: 0,
            bookmark_ms: 0,
            podcast: false,
            artwork: None,
        }
    }

    /// Copy of this track ready to be added to another catalog
    pub fn duplicate(&self) -> Self {
        Self {
            id: TrackId::UNASSIGNED,
            ..self.clone()
        }
    }

    /// Rating rendered as stars, `.` when unrated
    pub fn stars(&self) -> String {
        match self.rating / 20 {
            0 => ".".to_string(),
            n => "*".repeat(n as usize),
        }
    }

    /// Whether `other` carries the same artist and title
    pub fn same_song(&self, other: &Track) -> bool {
        self.title == other.title && self.artist == other.artist
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }

    /// Whether this is a podcast episode waiting to be copied to the device
    pub fn is_pending_podcast(&self) -> bool {
        self.mark_unplayed == MARK_UNPLAYED_PENDING
    }
}
