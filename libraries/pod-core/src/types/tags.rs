/// Tag values read from an audio file
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
    pub year: Option<u32>,
    /// Duration in milliseconds
    pub duration_ms: u32,
    /// Bitrate in kbps
    pub bitrate: u32,
}

impl AudioTags {
    /// Check if tags carry any useful information
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.genre.is_none()
            && self.track_number.is_none()
            && self.year.is_none()
    }
}
