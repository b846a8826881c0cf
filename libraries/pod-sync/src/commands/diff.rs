use super::{Context, Pair};
use crate::error::Result;
use chrono::{DateTime, Utc};
use pod_core::Catalog;
use tracing::debug;

/// Statistics that differ between a device track and its local counterpart
///
/// Each pair is `(local, device)`; `None` when that field agrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDiff {
    pub title: String,
    pub artist: String,
    pub rating: Option<(u8, u8)>,
    pub plays: Option<(u32, u32)>,
    pub last_played: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
}

/// Compare play statistics of every mapped device track
pub fn diff(ctx: &Context) -> Result<Vec<TrackDiff>> {
    let Pair { local, device, map } = ctx.open_pair()?;
    let mut diffs = Vec::new();

    for track in device.tracks() {
        let Some(local_track) = map.local_for(track.id).and_then(|id| local.catalog.track(id)) else {
            continue;
        };
        if !track.same_song(local_track) {
            debug!(
                "Mapping mismatch: {} / {} is not {} / {}",
                track.artist.as_deref().unwrap_or_default(),
                track.title,
                local_track.artist.as_deref().unwrap_or_default(),
                local_track.title
            );
            continue;
        }

        let entry = TrackDiff {
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_default(),
            rating: (local_track.rating != track.rating).then_some((local_track.rating, track.rating)),
            plays: (local_track.play_count != track.play_count)
                .then_some((local_track.play_count, track.play_count)),
            last_played: (local_track.last_played != track.last_played)
                .then_some((local_track.last_played, track.last_played)),
        };
        if entry.rating.is_some() || entry.plays.is_some() || entry.last_played.is_some() {
            diffs.push(entry);
        }
    }
    Ok(diffs)
}
