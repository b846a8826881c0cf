use super::Context;
use crate::error::{Result, SyncError};
use crate::extended::ExtField;
use crate::playlists::{copy_smart_playlists, CopyPlaylistsReport};
use pod_core::{Catalog, Track};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpReport {
    /// Files copied into the music directory
    pub copied: usize,
    /// Device tracks already present locally and skipped
    pub duplicates: usize,
    /// Device tracks whose file is gone
    pub missing: usize,
    pub playlists: CopyPlaylistsReport,
}

/// File name for a dumped track
///
/// `<n>-<title><ext>`, or `<title><ext>` without a track number. A collision
/// serial always carries the number: `<n>-<title>-<serial><ext>`.
pub fn dump_file_name(track_number: Option<u32>, title: &str, ext: &str, serial: Option<u32>) -> String {
    let n = track_number.unwrap_or(0);
    match serial {
        Some(serial) => format!("{n}-{title}-{serial}{ext}"),
        None if n < 1 => format!("{title}{ext}"),
        None => format!("{n}-{title}{ext}"),
    }
}

/// Copy every device file into the music directory and the local catalog
///
/// Files land in `<music_dir>/<artist>/<album>/`. Tracks the identity map
/// already ties to the same song locally are skipped unless forced. Smart
/// playlists follow once anything was copied.
pub fn dump(ctx: &Context) -> Result<DumpReport> {
    info!("Attempting to dump device data");
    let mut side = ctx.open_local()?;
    let device = ctx.open_device()?;
    let mut map = ctx.open_map(&side.catalog, &device)?;
    map.carry_forward(&side.catalog, &device);

    let music_dir = &ctx.paths.music_dir;
    if !ctx.options.dry_run {
        fs::create_dir_all(music_dir)?;
    }
    let master = side
        .catalog
        .master_playlist()
        .map(|p| p.id)
        .ok_or(SyncError::MissingPlaylist("master"))?;

    let total = device.tracks().len();
    let mut report = DumpReport::default();

    for track in device.tracks() {
        let Some(source) = device.resolve_path(track).filter(|p| p.is_file()) else {
            warn!(
                "File for {} ({}) not found, skipping",
                track.title,
                track.artist.as_deref().unwrap_or_default()
            );
            report.missing += 1;
            continue;
        };

        let duplicate = map
            .local_for(track.id)
            .and_then(|id| side.catalog.track(id))
            .is_some_and(|local| local.same_song(track));
        if duplicate {
            report.duplicates += 1;
            if ctx.options.force {
                warn!("Duplicate found for {}, copying anyway (--force)", track.title);
            } else {
                warn!("Duplicate found for {}, skipping", track.title);
                continue;
            }
        }

        let dest = destination(music_dir, track, &source);
        if !ctx.options.dry_run {
            if let Some(dir) = dest.parent() {
                fs::create_dir_all(dir)?;
            }
            if let Err(e) = fs::copy(&source, &dest) {
                warn!("Error copying {} to {}: {}, skipping", source.display(), dest.display(), e);
                continue;
            }
        }

        let mut copy = track.duplicate();
        copy.path = Some(dest.to_string_lossy().into_owned());
        copy.artwork = None;
        let id = side.catalog.add_track(copy)?;
        side.catalog.add_to_playlist(master, id)?;
        side.extended
            .set(id, ExtField::FilenameLocale, dest.to_string_lossy());
        if let Some(local) = side.catalog.track(id) {
            map.record(local, track);
        }
        map.set_link(track.id, id);

        report.copied += 1;
        info!("{} ({}) {}/{}", track.title, track.artist.as_deref().unwrap_or_default(), report.copied, total);
        if ctx.options.limit_reached(report.copied) {
            debug!("Reached {} files (--limit set)", report.copied);
            break;
        }
    }

    if report.copied > 0 {
        info!("{} tracks copied, now copying smart playlists", report.copied);
        report.playlists = copy_smart_playlists(&device, &mut side.catalog)?;
        ctx.save_local(&mut side)?;
        map.persist(ctx.options.dry_run)?;
    }
    Ok(report)
}

/// Free destination path, probing serial suffixes on collision
fn destination(music_dir: &Path, track: &Track, source: &Path) -> PathBuf {
    let artist = component(track.artist.as_deref());
    let album = component(track.album.as_deref());
    let title = component(Some(track.title.as_str()));
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let dir = music_dir.join(artist).join(album);

    let mut candidate = dir.join(dump_file_name(track.track_number, &title, &ext, None));
    let mut serial = 1;
    while candidate.is_file() {
        candidate = dir.join(dump_file_name(track.track_number, &title, &ext, Some(serial)));
        serial += 1;
    }
    candidate
}

fn component(value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => v.replace('/', "_"),
        None => UNKNOWN.to_string(),
    }
}
