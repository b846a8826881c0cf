//! Plain-text rendering of command results

use chrono::{DateTime, Local, Utc};
use pod_core::Track;
use pod_sync::commands::playlist::{PlaylistSummary, RulesView};
use pod_sync::commands::TrackDiff;

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn when(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "never".to_string(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// One line per track: title, artist, album, stars, play count
pub fn track_table(tracks: &[Track]) -> Vec<String> {
    let mut lines = Vec::with_capacity(tracks.len() + 1);
    lines.push(format!(
        "{:<30} {:<20} {:<20} {:>6} {:>5}",
        "Title", "Artist", "Album", "Rating", "Plays"
    ));
    for track in tracks {
        lines.push(format!(
            "{:<30} {:<20} {:<20} {:>6} {:>5}",
            clip(&track.title, 30),
            clip(track.artist.as_deref().unwrap_or_default(), 20),
            clip(track.album.as_deref().unwrap_or_default(), 20),
            track.stars(),
            track.play_count
        ));
    }
    lines
}

/// Local vs device values for each differing field
pub fn diff_lines(diffs: &[TrackDiff]) -> Vec<String> {
    let mut lines = Vec::new();
    for diff in diffs {
        lines.push(format!("{} ({})", diff.title, diff.artist));
        if let Some((local, device)) = diff.rating {
            lines.push(format!("    rating:      {local:>3} | {device:>3}"));
        }
        if let Some((local, device)) = diff.plays {
            lines.push(format!("    plays:       {local:>3} | {device:>3}"));
        }
        if let Some((local, device)) = diff.last_played {
            lines.push(format!("    last played: {} | {}", when(local), when(device)));
        }
    }
    lines
}

pub fn playlist_table(playlists: &[PlaylistSummary]) -> Vec<String> {
    let mut lines = Vec::with_capacity(playlists.len() + 1);
    lines.push(format!("{:<30} {:>5} {:>7} {:>9}", "Name", "Id", "Items", "Size (MB)"));
    for playlist in playlists {
        let name = if playlist.smart {
            format!("{} (smart)", playlist.name)
        } else {
            playlist.name.clone()
        };
        lines.push(format!(
            "{:<30} {:>5} {:>7} {:>9}",
            clip(&name, 30),
            playlist.id.to_string(),
            playlist.items,
            playlist.size_bytes / 1_048_576
        ));
    }
    lines
}

pub fn rules_lines(views: &[RulesView]) -> Vec<String> {
    let mut lines = Vec::new();
    for view in views {
        lines.push(format!("{} ({})", view.name, view.id));
        lines.extend(view.prefs.iter().map(|p| format!("  {p}")));
        lines.extend(view.rules.iter().map(|r| format!("    {r}")));
    }
    lines
}
