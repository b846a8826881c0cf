use super::{Context, Opened, Pair, Target};
use crate::engine::attach_artwork;
use crate::error::Result;
use crate::extended::PersistReport;
use crate::identity::RebuildReport;
use pod_catalog::FileCatalog;
use pod_core::{Catalog, TagReader, TrackId};
use tracing::{debug, info};

/// Rebuild the identity map from catalog contents and write it
pub fn make_map(ctx: &Context) -> Result<RebuildReport> {
    let Pair { local, device, mut map } = ctx.open_pair()?;
    let report = map.rebuild(&local.catalog, &device);
    map.persist(ctx.options.dry_run)?;
    Ok(report)
}

/// Re-evaluate the smart playlists of a catalog and save it
///
/// Returns the number of smart playlists evaluated.
pub fn evaluate(ctx: &Context, target: Target) -> Result<usize> {
    let mut opened = ctx.open_target(target)?;
    info!("Updating smart playlists");
    let catalog = opened.catalog_mut();
    catalog.update_smart_playlists();
    let count = catalog.playlists().iter().filter(|p| p.is_smart()).count();
    ctx.save_opened(&mut opened)?;
    Ok(count)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixArtworkReport {
    pub scanned: usize,
    /// Tracks that received a thumbnail
    pub attached: usize,
}

/// Re-extract thumbnails for every device track
pub fn fix_artwork(ctx: &Context, tags: &dyn TagReader) -> Result<FixArtworkReport> {
    info!("Fixing artwork on device");
    let mut opened = Opened::Device(ctx.open_device()?);
    let device = opened.catalog_mut();
    let dir = tempfile::Builder::new().prefix("podsync-art").tempdir()?;
    let mut report = FixArtworkReport::default();

    let ids: Vec<TrackId> = device.tracks().iter().map(|t| t.id).collect();
    for id in ids {
        report.scanned += 1;
        if ctx.options.dry_run {
            continue;
        }
        let Some(file) = device.track(id).and_then(|t| device.resolve_path(t)) else {
            continue;
        };
        if attach_artwork(device, tags, id, &file, dir.path()) {
            report.attached += 1;
        }
    }

    ctx.save_opened(&mut opened)?;
    if let Err(e) = dir.close() {
        debug!("Could not clear temporary artwork: {}", e);
    }
    info!("Attached artwork to {} of {} tracks", report.attached, report.scanned);
    Ok(report)
}

/// Rewrite the extended metadata file, rehashing every local file
pub fn write_extended_info(ctx: &Context) -> Result<PersistReport> {
    let mut side = ctx.with_extended(FileCatalog::open(&ctx.paths.local_db)?)?;
    side.extended.persist(
        &ctx.paths.extended_file(),
        &ctx.paths.local_db,
        &side.catalog,
        true,
        ctx.options.dry_run,
    )
}
