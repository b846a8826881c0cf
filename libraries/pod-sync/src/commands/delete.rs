use super::{matching_ids, remove_file, target_mode, Context, Target};
use crate::error::Result;
use crate::extended::ExtField;
use crate::prompt::Prompt;
use pod_core::{Catalog, Track, TrackId};
use tracing::{info, warn};

/// Device pattern selecting every track without a live local counterpart
pub const NOT_IN_LOCAL: &str = "notdb";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    /// Tracks matched by the patterns
    pub matched: Vec<Track>,
    /// How many of them were removed
    pub deleted: usize,
    /// The operator declined
    pub cancelled: bool,
}

/// Delete tracks matching any pattern
///
/// Local patterns naming an existing path select by path, anything else is a
/// regex over title, artist and album. On the device, [`NOT_IN_LOCAL`]
/// selects every track the identity map can't tie to a local track.
pub fn delete(
    ctx: &Context,
    target: Target,
    patterns: &[String],
    prompt: &mut dyn Prompt,
) -> Result<DeleteReport> {
    match target {
        Target::Local => delete_local(ctx, patterns, prompt),
        Target::Device => delete_device(ctx, patterns, prompt),
    }
}

fn confirm(catalog: &dyn Catalog, ids: &[TrackId], prompt: &mut dyn Prompt) -> (Vec<Track>, bool) {
    let matched: Vec<Track> = ids.iter().filter_map(|&id| catalog.track(id).cloned()).collect();
    let go = !matched.is_empty() && prompt.proceed(&format!("Delete {} tracks?", matched.len()));
    (matched, go)
}

fn delete_local(ctx: &Context, patterns: &[String], prompt: &mut dyn Prompt) -> Result<DeleteReport> {
    let mut side = ctx.open_local()?;
    let ids = matching_ids(&side.catalog, patterns, |p| target_mode(Target::Local, p))?;
    let (matched, go) = confirm(&side.catalog, &ids, prompt);
    let mut report = DeleteReport {
        matched,
        cancelled: !go,
        ..DeleteReport::default()
    };
    if !go {
        if report.matched.is_empty() {
            info!("No matching tracks found");
        }
        return Ok(report);
    }

    for track in &report.matched {
        info!(
            "Deleting {} ({})",
            track.title,
            track.artist.as_deref().unwrap_or_default()
        );
        let file = side.catalog.resolve_path(track);
        if let Err(e) = side.catalog.remove_track(track.id) {
            warn!("Track {} not found while deleting: {}", track.id, e);
            continue;
        }
        side.extended.remove_record(track.id);
        if ctx.options.delete_files {
            if let Some(file) = file {
                remove_file(&file, ctx.options.dry_run);
            }
        }
        report.deleted += 1;
    }

    side.catalog.update_smart_playlists();
    ctx.save_local(&mut side)?;
    Ok(report)
}

fn delete_device(ctx: &Context, patterns: &[String], prompt: &mut dyn Prompt) -> Result<DeleteReport> {
    let super::Pair {
        local: mut side,
        mut device,
        mut map,
    } = ctx.open_pair()?;
    map.carry_forward(&side.catalog, &device);

    let ids: Vec<TrackId> = if patterns.iter().any(|p| p == NOT_IN_LOCAL) {
        device
            .tracks()
            .iter()
            .filter(|t| !map.is_mapped(t.id))
            .map(|t| t.id)
            .collect()
    } else {
        matching_ids(&device, patterns, |p| target_mode(Target::Device, p))?
    };

    let (matched, go) = confirm(&device, &ids, prompt);
    let mut report = DeleteReport {
        matched,
        cancelled: !go,
        ..DeleteReport::default()
    };
    if !go {
        if report.matched.is_empty() {
            info!("No matching tracks found");
        }
        return Ok(report);
    }

    for track in &report.matched {
        info!(
            "Deleting {} ({})",
            track.title,
            track.artist.as_deref().unwrap_or_default()
        );
        if let Some(local_id) = map.local_for(track.id) {
            side.extended.delete(local_id, ExtField::FilenameIpod);
        }
        map.remove(track);
        let file = device.resolve_path(track);
        if let Err(e) = device.remove_track(track.id) {
            warn!("Track {} not found while deleting: {}", track.id, e);
            continue;
        }
        if ctx.options.delete_files {
            if let Some(file) = file {
                remove_file(&file, ctx.options.dry_run);
            }
        }
        report.deleted += 1;
    }

    device.update_smart_playlists();
    ctx.save(&device)?;
    map.persist(ctx.options.dry_run)?;
    side.extended.persist(
        &ctx.paths.extended_file(),
        &ctx.paths.local_db,
        &side.catalog,
        false,
        ctx.options.dry_run,
    )?;
    Ok(report)
}
