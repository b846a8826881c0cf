use super::{infer_mode, matching_ids, Context};
use crate::error::Result;
use crate::files::file_size;
use pod_core::{Catalog, TagReader, TrackId};
use tracing::{info, warn};

/// Refresh file size, duration and bitrate of matching local tracks
///
/// Returns the ids of the tracks that changed.
pub fn update(
    ctx: &Context,
    patterns: &[String],
    prompt: &mut dyn crate::prompt::Prompt,
    tags: &dyn TagReader,
) -> Result<Vec<TrackId>> {
    let mut side = ctx.open_local()?;
    let ids = matching_ids(&side.catalog, patterns, infer_mode)?;
    if ids.is_empty() {
        info!("No matching tracks found");
        return Ok(Vec::new());
    }
    if !prompt.proceed(&format!("Update {} tracks?", ids.len())) {
        return Ok(Vec::new());
    }

    let mut updated = Vec::new();
    for id in ids {
        let Some(track) = side.catalog.track(id) else {
            continue;
        };
        let Some(file) = side.catalog.resolve_path(track) else {
            warn!("{} has no file, skipping", track.title);
            continue;
        };
        let size = file_size(Some(&file));
        let audio = match tags.read_tags(&file) {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!("Couldn't read tags from {}: {}", file.display(), e);
                None
            }
        };

        let Some(track) = side.catalog.track_mut(id) else {
            continue;
        };
        let before = (track.size, track.duration_ms, track.bitrate);
        if size > 0 {
            track.size = size;
        }
        if let Some(audio) = audio {
            if audio.duration_ms > 0 {
                track.duration_ms = audio.duration_ms;
            }
            if audio.bitrate > 0 {
                track.bitrate = audio.bitrate;
            }
        }
        if before != (track.size, track.duration_ms, track.bitrate) {
            info!("Updated {}", file.display());
            updated.push(id);
        }
    }

    if !updated.is_empty() {
        ctx.save_local(&mut side)?;
    }
    Ok(updated)
}
