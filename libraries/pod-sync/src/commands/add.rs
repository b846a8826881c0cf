use super::{Context, Opened, Target};
use crate::engine::attach_artwork;
use crate::error::{Result, SyncError};
use crate::matcher::absolutize;
use crate::options::ADD_FREE_FLOOR;
use pod_core::{AudioTags, Catalog, TagReader, Track, TrackId, MARK_UNPLAYED_PENDING};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<TrackId>,
    /// Files already present, not audio, or without usable tags
    pub skipped: usize,
    /// Device files skipped to keep the free-space floor
    pub no_space: usize,
}

/// Add audio files, or every audio file under the given directories
///
/// On the device the files are transferred and thumbnails attached; at least
/// 5,000,000 bytes are kept free.
pub fn add(
    ctx: &Context,
    target: Target,
    inputs: &[PathBuf],
    podcast: bool,
    tags: &dyn TagReader,
) -> Result<AddReport> {
    let mut opened = ctx.open_target(target)?;
    let catalog = opened.catalog_mut();

    let master = catalog
        .master_playlist()
        .map(|p| p.id)
        .ok_or(SyncError::MissingPlaylist("master"))?;
    let podcasts = if podcast {
        Some(
            catalog
                .podcasts_playlist()
                .map(|p| p.id)
                .ok_or(SyncError::MissingPlaylist("podcast"))?,
        )
    } else {
        None
    };

    let mut free = match target {
        Target::Device => catalog.space()?.map(|s| s.available),
        Target::Local => None,
    };
    let artwork_dir = tempfile::Builder::new().prefix("podsync-art").tempdir()?;
    let mut known: HashSet<String> = catalog.tracks().iter().filter_map(|t| t.path.clone()).collect();
    let mut report = AddReport::default();

    for file in collect_files(inputs) {
        let name = file.to_string_lossy().into_owned();
        if known.contains(&name) {
            warn!("File already in catalog: {}", name);
            report.skipped += 1;
            continue;
        }
        let Some(audio) = read_audio(tags, &file) else {
            report.skipped += 1;
            continue;
        };
        let Some(title) = audio.title.clone().filter(|t| !t.is_empty()) else {
            warn!("{} has no title tag, skipping", name);
            report.skipped += 1;
            continue;
        };

        let size = std::fs::metadata(&file)?.len();
        if !reserve(&mut free, size) {
            warn!("Not enough free space for {}, skipping", name);
            report.no_space += 1;
            continue;
        }

        let mut track = Track::new(title, name.clone());
        track.artist = audio.artist;
        track.album = audio.album;
        track.genre = audio.genre;
        track.track_number = audio.track_number;
        track.year = audio.year;
        track.duration_ms = audio.duration_ms;
        track.bitrate = audio.bitrate;
        track.size = size;
        track.rating = ctx.options.rating.min(5) * 20;
        if podcasts.is_some() {
            track.podcast = true;
            track.mark_unplayed = MARK_UNPLAYED_PENDING;
            if track.album.as_deref().map_or(true, str::is_empty) {
                track.album = Some(track.title.clone());
            }
        }
        if target == Target::Device {
            track.path = None;
            track.transferred = false;
        }

        let id = catalog.add_track(track)?;
        catalog.add_to_playlist(master, id)?;
        if let Some(list) = podcasts {
            catalog.add_to_playlist(list, id)?;
        }

        if target == Target::Device && !ctx.options.dry_run {
            if let Err(e) = catalog.transfer_file(id, &file) {
                warn!("Copying {} failed: {}, skipping", name, e);
                if let Err(e) = catalog.remove_track(id) {
                    debug!("Could not drop failed add {}: {}", id, e);
                }
                report.skipped += 1;
                continue;
            }
            attach_artwork(catalog, tags, id, &file, artwork_dir.path());
        }

        if let Some(track) = catalog.track(id) {
            info!("Added file: {}", name);
            debug!("          Artist: {}", track.artist.as_deref().unwrap_or_default());
            debug!("           Album: {}", track.album.as_deref().unwrap_or_default());
            debug!("           Title: {}", track.title);
            debug!("          Rating: {}", track.stars());
        }
        known.insert(name);
        report.added.push(id);
    }

    if report.added.is_empty() {
        info!("Nothing added, not writing catalog");
    } else {
        if let Opened::Device(device) = &mut opened {
            device.update_smart_playlists();
        }
        ctx.save_opened(&mut opened)?;
        info!("{} tracks added", report.added.len());
    }
    if let Err(e) = artwork_dir.close() {
        debug!("Could not clear temporary artwork: {}", e);
    }
    Ok(report)
}

/// Take `size` bytes out of the free-space estimate, keeping the floor
///
/// `None` means unbounded.
fn reserve(free: &mut Option<u64>, size: u64) -> bool {
    match free {
        None => true,
        Some(available) if available.saturating_sub(size) < ADD_FREE_FLOOR => false,
        Some(available) => {
            *available -= size;
            true
        }
    }
}

fn read_audio(tags: &dyn TagReader, file: &Path) -> Option<AudioTags> {
    if !tags.is_audio_file(file) {
        debug!("{} not an audio file, skipping", file.display());
        return None;
    }
    match tags.read_tags(file) {
        Ok(audio) if audio.is_empty() => {
            warn!("No tags for {}, skipping", file.display());
            None
        }
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!("Couldn't read tags from {}: {}, skipping", file.display(), e);
            None
        }
    }
}

/// Expand directories recursively; paths are made absolute
fn collect_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(
                WalkDir::new(input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| absolutize(e.path())),
            );
        } else if input.is_file() {
            files.push(absolutize(input));
        } else {
            warn!("{} not found, skipping", input.display());
        }
    }
    files
}
