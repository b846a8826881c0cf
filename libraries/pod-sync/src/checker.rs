//! Catalog consistency checks and repairs
//!
//! Both variants work in memory; the caller saves the catalog only when the
//! report says it was modified.

use crate::error::{Result, SyncError};
use crate::extended::{file_hash, ExtField, ExtendedMetadata};
use crate::files::{file_size, remove_file};
use crate::identity::IdentityMap;
use crate::options::{SyncOptions, STUB_FILE_FLOOR};
use crate::prompt::{Decision, Prompt};
use pod_core::{Catalog, PlaylistId, Track, TrackId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A smart playlist rule referencing a playlist that doesn't exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub playlist: String,
    pub playlist_id: PlaylistId,
    pub missing: PlaylistId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// The catalog changed and should be saved
    pub modified: bool,
    /// No unresolved inconsistency remains
    pub in_sync: bool,
    /// Repairs applied, including deleted files
    pub repairs: usize,
    pub files_in_catalog: usize,
    /// The operator quit; repairs were discarded
    pub aborted: bool,
    /// Extended metadata hashes were refreshed
    pub extended_changed: bool,
    pub smart_issues: Vec<RuleIssue>,
}

impl CheckReport {
    fn repaired(&mut self) {
        self.modified = true;
        self.repairs += 1;
    }
}

/// Validate playlist references in smart playlist rules (read-only)
pub fn check_smart_playlists(catalog: &dyn Catalog) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    for playlist in catalog.playlists() {
        let Some(smart) = &playlist.smart else {
            continue;
        };
        debug!("Checking playlist '{}' ({}) consistency", playlist.name, playlist.id);
        for target in smart.rules.iter().filter_map(|r| r.playlist_reference()) {
            match catalog.playlist(target) {
                Some(referenced) => debug!(
                    "Rule in smart playlist '{}' refers to playlist '{}'",
                    playlist.name, referenced.name
                ),
                None => {
                    warn!(
                        "Rule in playlist '{}' ({}) matches unknown playlist {}",
                        playlist.name, playlist.id, target
                    );
                    issues.push(RuleIssue {
                        playlist: playlist.name.clone(),
                        playlist_id: playlist.id,
                        missing: target,
                    });
                }
            }
        }
    }
    issues
}

/// Check the local catalog against the filesystem
///
/// Tracks whose file is missing are dropped, sizes are corrected, stub files
/// are deleted with their track, duplicate paths are dropped, master
/// membership is restored and content hashes are refreshed.
pub fn check_local(
    catalog: &mut dyn Catalog,
    extended: &mut ExtendedMetadata,
    opts: &SyncOptions,
) -> Result<CheckReport> {
    let mut report = CheckReport {
        smart_issues: check_smart_playlists(catalog),
        ..CheckReport::default()
    };
    let master = catalog
        .master_playlist()
        .map(|p| p.id)
        .ok_or(SyncError::MissingPlaylist("master"))?;

    info!("Checking tracks...");
    let ids: Vec<TrackId> = catalog.tracks().iter().map(|t| t.id).collect();
    let mut paths = HashSet::new();
    let mut songs = HashSet::new();

    for id in ids {
        let Some(track) = catalog.track(id).cloned() else {
            continue;
        };
        let file = catalog.resolve_path(&track).filter(|f| f.is_file());
        let Some(file) = file else {
            info!(
                "Fixed: file for {} ({}) not found, removed from catalog",
                track.title,
                track.path.as_deref().unwrap_or_default()
            );
            catalog.remove_track(id)?;
            extended.remove_record(id);
            report.repaired();
            continue;
        };

        let size = file_size(Some(&file));
        if track.size != size {
            debug!(
                "Catalog size of '{}' ({}) mismatched with file (file/catalog: {}/{})",
                file.display(),
                track.title,
                size,
                track.size
            );
            if let Some(t) = catalog.track_mut(id) {
                t.size = size;
            }
            report.repaired();
        }
        if size < STUB_FILE_FLOOR {
            info!("Local file '{}' ({}) is empty, deleting", file.display(), track.title);
            catalog.remove_track(id)?;
            extended.remove_record(id);
            remove_file(&file, opts.dry_run);
            report.repaired();
            continue;
        }

        if !paths.insert(file.clone()) {
            info!("Fixed: {} appears twice in catalog, removing one", file.display());
            catalog.remove_track(id)?;
            extended.remove_record(id);
            report.repaired();
            continue;
        }

        let song = song_key(&track);
        if !songs.insert(song.clone()) {
            debug!("{} (file {}, id {}) duplicated (song name)", song, file.display(), id);
        }

        if !catalog.playlist(master).is_some_and(|p| p.contains(id)) {
            warn!("{} ({}) not in master playlist, fixing", track.title, artist(&track));
            catalog.add_to_playlist(master, id)?;
            report.repaired();
        }

        let hash = file_hash(&file);
        let stored = extended.get(id, ExtField::Md5Hash).map(str::to_string);
        if stored.is_none() {
            warn!("Hash for '{}' missing", track.title);
        }
        if hash != stored {
            if stored.is_some() {
                warn!("Hash for '{}' invalid, updating", track.title);
            }
            match hash {
                Some(h) => extended.set(id, ExtField::Md5Hash, h),
                None => extended.delete(id, ExtField::Md5Hash),
            }
            report.extended_changed = true;
        }
    }

    report.files_in_catalog = paths.len();
    report.in_sync = report.smart_issues.is_empty();
    finish(catalog, &report);
    Ok(report)
}

/// Check the device catalog against the device music directory and the
/// identity map
///
/// Missing files and orphaned files are repaired only with the operator's
/// consent. Quitting discards the catalog repairs and skips the orphan scan;
/// finishing early keeps them.
pub fn check_device(
    device: &mut dyn Catalog,
    map: &mut IdentityMap,
    local: &dyn Catalog,
    prompt: &mut dyn Prompt,
    opts: &SyncOptions,
) -> Result<CheckReport> {
    let music_dir = device
        .music_dir()
        .ok_or_else(|| SyncError::Usage("catalog has no music directory".into()))?;

    info!("Scanning music files");
    let music_files = scan_music_files(&music_dir);
    info!("Found {} files", music_files.len());
    let on_disk: HashSet<String> = music_files.iter().map(|p| lower(p)).collect();

    let mut report = CheckReport {
        smart_issues: check_smart_playlists(device),
        in_sync: true,
        ..CheckReport::default()
    };
    let master = device
        .master_playlist()
        .map(|p| p.id)
        .ok_or(SyncError::MissingPlaylist("master"))?;

    let ids: Vec<TrackId> = device.tracks().iter().map(|t| t.id).collect();
    let mut catalog_files = HashSet::new();
    let mut songs = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut remove_all = false;
    let mut scan_orphans = true;

    for id in ids {
        let Some(track) = device.track(id).cloned() else {
            continue;
        };
        let file = device.resolve_path(&track);
        let key = file.as_deref().map(lower);

        match &key {
            Some(k) if !catalog_files.insert(k.clone()) => {
                warn!("{} (file {}) duplicated (filename)", track.title, k);
            }
            Some(_) => {}
            None => warn!("No file recorded for {}", track.title),
        }
        let song = song_key(&track);
        if !songs.insert(song.clone()) {
            warn!("{} (id {}) duplicated (song name)", song, id);
        }
        if !seen_ids.insert(id) {
            warn!("{} duplicated (id {})", song, id);
        }

        match map.local_for(id).and_then(|l| local.track(l)) {
            None => warn!("Can't find local track for device id {} ({})", id, track.title),
            Some(lt) if !lt.same_song(&track) => {
                warn!("Device track {} has different metadata to local track {}", id, lt.id)
            }
            Some(_) => {}
        }

        if !device.playlist(master).is_some_and(|p| p.contains(id)) {
            warn!("{} ({}) not in master playlist, fixing", track.title, artist(&track));
            device.add_to_playlist(master, id)?;
            report.repaired();
        }

        let present = match (&file, &key) {
            (Some(f), Some(k)) => on_disk.contains(k) && f.is_file(),
            _ => false,
        };
        if !present {
            let location = key.clone().unwrap_or_default();
            let decision = if remove_all {
                Decision::Yes
            } else {
                prompt.remove_missing_track(&track, &location)
            };
            match decision {
                Decision::Quit => {
                    info!("Quitting");
                    report.modified = false;
                    report.aborted = true;
                    scan_orphans = false;
                    break;
                }
                Decision::Finish => {
                    info!("Finishing");
                    scan_orphans = false;
                    break;
                }
                Decision::Yes | Decision::All => {
                    remove_all |= decision == Decision::All;
                    device.remove_track(id)?;
                    map.remove(&track);
                    if let Some(f) = &file {
                        if f.is_file() {
                            remove_file(f, opts.dry_run);
                        }
                    }
                    info!("Removed track {}", track.title);
                    report.repaired();
                }
                Decision::No => report.in_sync = false,
            }
            continue;
        }

        if let Some(f) = &file {
            let size = file_size(Some(f));
            if track.size != size {
                debug!(
                    "'{}' ({}) catalog/file size mismatch (file/catalog: {}/{}), fixing",
                    f.display(),
                    track.title,
                    size,
                    track.size
                );
                if let Some(t) = device.track_mut(id) {
                    t.size = size;
                }
                report.repaired();
            }
        }
    }

    if scan_orphans {
        for path in &music_files {
            if catalog_files.contains(&lower(path)) {
                continue;
            }
            match prompt.delete_orphan_file(path) {
                Decision::Yes | Decision::All => {
                    remove_file(path, opts.dry_run);
                    info!("Removed orphaned file {}", path.display());
                    report.repairs += 1;
                }
                Decision::Quit | Decision::Finish => {
                    info!("Quitting");
                    report.in_sync = false;
                    break;
                }
                Decision::No => report.in_sync = false,
            }
        }
    }

    report.files_in_catalog = catalog_files.len();
    if !report.smart_issues.is_empty() {
        report.in_sync = false;
    }
    finish(device, &report);
    Ok(report)
}

fn finish(catalog: &mut dyn Catalog, report: &CheckReport) {
    info!("Found {} files in catalog", report.files_in_catalog);
    if report.modified {
        catalog.update_smart_playlists();
    }
    if report.in_sync {
        info!("{} catalog and files are fully synchronised", catalog.kind());
    } else {
        warn!("{} catalog and files are not in sync", catalog.kind());
    }
}

fn scan_music_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Error scanning {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn lower(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

fn artist(track: &Track) -> &str {
    track.artist.as_deref().unwrap_or_default()
}

fn song_key(track: &Track) -> String {
    format!(
        "{}:{}:{}",
        track.title,
        track.album.as_deref().unwrap_or_default(),
        artist(track)
    )
}
