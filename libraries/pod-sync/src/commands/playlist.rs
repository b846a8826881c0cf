//! Playlist management on either catalog

use super::{matching_ids, remove_file, Context, Opened, Target};
use crate::error::{Result, SyncError};
use crate::matcher::{FieldMask, MatchMode};
use crate::prompt::Prompt;
use pod_core::{Catalog, Playlist, PlaylistId, PlaylistKind, SmartPrefs, Track, TrackId};
use tracing::{info, warn};

/// One row of the playlist listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub name: String,
    pub id: PlaylistId,
    pub items: usize,
    pub size_bytes: u64,
    pub smart: bool,
    pub kind: PlaylistKind,
}

/// A smart playlist rendered for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesView {
    pub name: String,
    pub id: PlaylistId,
    pub prefs: Vec<String>,
    pub rules: Vec<String>,
}

fn find(catalog: &dyn Catalog, name: &str) -> Result<PlaylistId> {
    catalog
        .playlist_by_name(name)
        .map(|p| p.id)
        .ok_or_else(|| SyncError::UnknownPlaylist(name.to_string()))
}

fn member_tracks(catalog: &dyn Catalog, playlist: &Playlist) -> Vec<Track> {
    playlist
        .tracks
        .iter()
        .filter_map(|&id| catalog.track(id).cloned())
        .collect()
}

/// Create an empty playlist, optionally as the podcast playlist
pub fn create(ctx: &Context, target: Target, name: &str, podcast: bool) -> Result<PlaylistId> {
    let mut opened = ctx.open_target(target)?;
    let catalog = opened.catalog_mut();
    if catalog.playlist_by_name(name).is_some() {
        return Err(SyncError::PlaylistExists(name.to_string()));
    }
    let playlist = if podcast {
        if catalog.podcasts_playlist().is_some() {
            return Err(SyncError::Usage("catalog already has a podcast playlist".into()));
        }
        Playlist::with_kind(name, PlaylistKind::Podcasts)
    } else {
        Playlist::standard(name)
    };
    let id = catalog.add_playlist(playlist)?;
    ctx.save_opened(&mut opened)?;
    info!(
        "Created playlist '{}'{}",
        name,
        if podcast { " and set as podcast list" } else { "" }
    );
    Ok(id)
}

/// Every playlist with its track count and total size
pub fn list(ctx: &Context, target: Target) -> Result<Vec<PlaylistSummary>> {
    let opened = ctx.open_target(target)?;
    let catalog = opened.catalog();
    Ok(catalog
        .playlists()
        .iter()
        .map(|p| {
            let tracks = member_tracks(catalog, p);
            PlaylistSummary {
                name: p.name.clone(),
                id: p.id,
                items: tracks.len(),
                size_bytes: tracks.iter().map(|t| t.size).sum(),
                smart: p.is_smart(),
                kind: p.kind,
            }
        })
        .collect())
}

/// Tracks of the named playlist
pub fn tracks(ctx: &Context, target: Target, name: &str) -> Result<Vec<Track>> {
    let opened = ctx.open_target(target)?;
    let catalog = opened.catalog();
    let id = find(catalog, name)?;
    Ok(catalog
        .playlist(id)
        .map(|p| member_tracks(catalog, p))
        .unwrap_or_default())
}

/// Rules of one smart playlist, or of every smart playlist when `name` is `None`
pub fn rules(ctx: &Context, target: Target, name: Option<&str>) -> Result<Vec<RulesView>> {
    let opened = ctx.open_target(target)?;
    let catalog = opened.catalog();
    let selected: Vec<&Playlist> = match name {
        Some(name) => {
            let id = find(catalog, name)?;
            let playlist = catalog
                .playlist(id)
                .ok_or_else(|| SyncError::UnknownPlaylist(name.to_string()))?;
            if !playlist.is_smart() {
                return Err(SyncError::NotSmart(name.to_string()));
            }
            vec![playlist]
        }
        None => catalog.playlists().iter().filter(|p| p.is_smart()).collect(),
    };

    let lookup = |id: PlaylistId| catalog.playlist(id).map(|p| p.name.clone());
    Ok(selected
        .into_iter()
        .filter_map(|p| {
            let smart = p.smart.as_ref()?;
            Some(RulesView {
                name: p.name.clone(),
                id: p.id,
                prefs: describe_prefs(&smart.prefs, smart.rules.len()),
                rules: smart.rules.iter().map(|r| r.describe(&lookup)).collect(),
            })
        })
        .collect())
}

/// Preference lines shown above a smart playlist's rules
pub fn describe_prefs(prefs: &SmartPrefs, rule_count: usize) -> Vec<String> {
    let mut lines = vec![
        format!("Live update: {}", if prefs.live_update { "True" } else { "False" }),
        format!(
            "Match {} of the following rules: ({})",
            if prefs.match_any { "ANY" } else { "ALL" },
            rule_count
        ),
    ];
    if let Some(limit) = &prefs.limit {
        lines.push(format!(
            "Limit to {} {}, sorted by {}",
            limit.value,
            limit.kind.label(),
            limit.sort.label()
        ));
    }
    if prefs.match_checked_only {
        lines.push("Match only checked tracks".to_string());
    }
    lines
}

fn field_matches(catalog: &dyn Catalog, patterns: &[String]) -> Result<Vec<TrackId>> {
    matching_ids(catalog, patterns, |_| MatchMode::Fields(FieldMask::ALL))
}

/// Add tracks matching any pattern; returns those not already members
pub fn add(ctx: &Context, target: Target, name: &str, patterns: &[String]) -> Result<Vec<Track>> {
    let mut opened = ctx.open_target(target)?;
    let catalog = opened.catalog_mut();
    let id = find(catalog, name)?;
    let matched = field_matches(catalog, patterns)?;
    if matched.is_empty() {
        warn!("No tracks matching {:?}", patterns);
        return Ok(Vec::new());
    }

    let mut added = Vec::new();
    for track_id in matched {
        if catalog.playlist(id).is_some_and(|p| p.contains(track_id)) {
            continue;
        }
        catalog.add_to_playlist(id, track_id)?;
        if let Some(track) = catalog.track(track_id) {
            added.push(track.clone());
        }
    }
    ctx.save_opened(&mut opened)?;
    Ok(added)
}

/// Remove matching tracks from a playlist; with `delete_files` the tracks and
/// their files are deleted from the catalog too
pub fn remove(ctx: &Context, target: Target, name: &str, patterns: &[String]) -> Result<Vec<Track>> {
    let mut opened = ctx.open_target(target)?;
    let id = find(opened.catalog(), name)?;
    let matched = field_matches(opened.catalog(), patterns)?;
    if matched.is_empty() {
        warn!("No tracks matching {:?}", patterns);
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for track_id in matched {
        if !opened.catalog_mut().remove_from_playlist(id, track_id)? {
            continue;
        }
        if let Some(track) = opened.catalog().track(track_id).cloned() {
            if ctx.options.delete_files {
                info!("Deleting {}", track.title);
                delete_track(ctx, &mut opened, &track);
            }
            removed.push(track);
        }
    }
    ctx.save_opened(&mut opened)?;
    Ok(removed)
}

/// Delete a playlist; returns `false` if the operator declined
///
/// A playlist holding tracks needs confirmation unless forced. With
/// `delete_files` its tracks and their files go too.
pub fn delete(ctx: &Context, target: Target, name: &str, prompt: &mut dyn Prompt) -> Result<bool> {
    let mut opened = ctx.open_target(target)?;
    let id = find(opened.catalog(), name)?;
    let members = opened
        .catalog()
        .playlist(id)
        .map(|p| member_tracks(opened.catalog(), p))
        .unwrap_or_default();

    if !members.is_empty()
        && !ctx.options.force
        && !prompt.proceed(&format!(
            "Playlist '{}' contains {} tracks. Continue?",
            name,
            members.len()
        ))
    {
        return Ok(false);
    }

    if ctx.options.delete_files && !members.is_empty() {
        info!("Deleting playlist tracks and files");
        for track in &members {
            delete_track(ctx, &mut opened, track);
        }
    }
    opened.catalog_mut().remove_playlist(id)?;
    ctx.save_opened(&mut opened)?;
    info!("Deleted playlist '{}'", name);
    Ok(true)
}

/// Remove a track and its file
fn delete_track(ctx: &Context, opened: &mut Opened, track: &Track) {
    let file = opened.catalog().resolve_path(track);
    if let Err(e) = opened.catalog_mut().remove_track(track.id) {
        warn!("Track {} not found while deleting: {}", track.id, e);
        return;
    }
    if let Some(extended) = opened.extended_mut() {
        extended.remove_record(track.id);
    }
    if let Some(file) = file.filter(|f| f.is_file()) {
        remove_file(&file, ctx.options.dry_run);
    }
}
