//! Synchronization engine
//!
//! One run walks a fixed sequence of states, never revisiting one:
//! open, validate smart playlists, merge play statistics from the device,
//! evaluate local playlists, compute the copy, delete and space plan, confirm,
//! delete stale device tracks, copy new ones and finalize.

use crate::checker::check_smart_playlists;
use crate::error::Result;
use crate::extended::{ExtField, ExtendedMetadata};
use crate::files::remove_file;
use crate::identity::IdentityMap;
use crate::options::{StatePaths, SyncOptions};
use crate::plan::SyncPlan;
use crate::prompt::Prompt;
use pod_catalog::FileCatalog;
use pod_core::{Catalog, TagReader, TrackId, MARK_UNPLAYED_UNKNOWN};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};

/// Phases of a sync run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncState {
    Open,
    ValidateSmartPlaylists,
    MergeStats,
    EvaluateLocalPlaylists,
    ComputeCopySet,
    ComputeDeleteSet,
    ComputeSpaceBudget,
    Confirm,
    ApplyDeletes,
    ApplyCopies,
    Finalize,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    Full,
    /// Stop after merging statistics and saving the local catalog
    MetadataOnly,
}

/// Outcome of the copy phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub copied: usize,
    pub failed: usize,
    pub stopped_at_limit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Local tracks whose statistics changed
    pub merged: usize,
    pub plan: Option<SyncPlan>,
    pub deleted: usize,
    pub copies: CopyOutcome,
    /// The operator declined the plan; nothing was applied
    pub aborted: bool,
}

pub struct SyncEngine {
    local: Box<dyn Catalog>,
    device: Box<dyn Catalog>,
    tags: Box<dyn TagReader>,
    map: IdentityMap,
    extended: ExtendedMetadata,
    paths: StatePaths,
    options: SyncOptions,
    state: SyncState,
    artwork_dir: Option<TempDir>,
    device_snapshot: Option<NamedTempFile>,
}

impl SyncEngine {
    /// Open the local catalog and the device mounted at `paths.mountpoint`
    pub fn open(paths: StatePaths, options: SyncOptions, tags: Box<dyn TagReader>) -> Result<Self> {
        let local = FileCatalog::open(&paths.local_db)?;
        let device = FileCatalog::open_device(&paths.mountpoint)?;
        Self::new(Box::new(local), Box::new(device), tags, paths, options)
    }

    /// Load the identity map and extended metadata for an opened catalog pair
    pub fn new(
        mut local: Box<dyn Catalog>,
        device: Box<dyn Catalog>,
        tags: Box<dyn TagReader>,
        paths: StatePaths,
        options: SyncOptions,
    ) -> Result<Self> {
        let mut extended =
            ExtendedMetadata::load(&paths.extended_file(), &paths.local_db, local.as_ref())?;
        let restored = extended.restore_paths(local.as_mut());
        if restored > 0 {
            info!("Restored {} track paths from extended info", restored);
        }
        let map = IdentityMap::load(paths.map_file(), local.as_ref(), device.as_ref())?;
        let device_snapshot = snapshot(device.file_path())?;
        let artwork_dir = tempfile::Builder::new().prefix("podsync-art").tempdir()?;

        Ok(Self {
            local,
            device,
            tags,
            map,
            extended,
            paths,
            options,
            state: SyncState::Open,
            artwork_dir: Some(artwork_dir),
            device_snapshot,
        })
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn local(&self) -> &dyn Catalog {
        self.local.as_ref()
    }

    pub fn device(&self) -> &dyn Catalog {
        self.device.as_ref()
    }

    pub fn map(&self) -> &IdentityMap {
        &self.map
    }

    pub fn extended(&self) -> &ExtendedMetadata {
        &self.extended
    }

    fn advance(&mut self, next: SyncState) {
        debug_assert!(next >= self.state, "sync state went back from {:?} to {next:?}", self.state);
        debug!("Sync state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run every phase in order
    pub fn run(&mut self, mode: SyncMode, prompt: &mut dyn Prompt) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        self.validate_smart_playlists();
        summary.merged = self.merge_stats();
        self.evaluate_local_playlists()?;
        if mode == SyncMode::MetadataOnly {
            info!("Metadata sync done");
            self.advance(SyncState::Done);
            return Ok(summary);
        }

        let plan = self.plan();
        self.advance(SyncState::Confirm);
        if !prompt.confirm_plan(&plan) {
            info!("Sync cancelled, nothing applied");
            summary.aborted = true;
            summary.plan = Some(plan);
            self.advance(SyncState::Done);
            return Ok(summary);
        }

        summary.deleted = self.apply_deletes(&plan);
        summary.copies = self.apply_copies(&plan)?;
        summary.plan = Some(plan);
        self.finalize()?;
        info!("Done!");
        Ok(summary)
    }

    /// Log broken playlist references in both catalogs
    pub fn validate_smart_playlists(&mut self) {
        self.advance(SyncState::ValidateSmartPlaylists);
        if !check_smart_playlists(self.device.as_ref()).is_empty() {
            warn!("Playlist inconsistencies in the device catalog");
        }
        if !check_smart_playlists(self.local.as_ref()).is_empty() {
            warn!("Playlist inconsistencies in the local catalog");
        }
    }

    /// Copy listening statistics from device tracks to their local counterparts
    ///
    /// Returns how many local tracks changed. Pairs whose artist or title
    /// disagree are skipped.
    pub fn merge_stats(&mut self) -> usize {
        self.advance(SyncState::MergeStats);
        debug!("Merging play counts and ratings...");
        let mut changed = 0;

        for dtrack in self.device.tracks() {
            let Some(ltrack) = self.map.local_for(dtrack.id).and_then(|id| self.local.track(id))
            else {
                warn!("Can't find local track for device id {} ({})", dtrack.id, dtrack.title);
                continue;
            };
            if !ltrack.same_song(dtrack) {
                warn!(
                    "({}) {} ({}) on device not matched with catalog ({}, {}), skipping",
                    ltrack.id,
                    dtrack.title,
                    dtrack.artist.as_deref().unwrap_or_default(),
                    ltrack.title,
                    ltrack.artist.as_deref().unwrap_or_default()
                );
                continue;
            }
            self.map.record(ltrack, dtrack);

            let local_id = ltrack.id;
            let Some(ltrack) = self.local.track_mut(local_id) else {
                continue;
            };
            let mut notes = Vec::new();
            if ltrack.rating != dtrack.rating {
                notes.push(format!("{} -> {}", ltrack.stars(), dtrack.stars()));
                ltrack.rating = dtrack.rating;
            }
            if ltrack.play_count != dtrack.play_count {
                notes.push(format!("{} -> {} plays", ltrack.play_count, dtrack.play_count));
                ltrack.play_count = dtrack.play_count;
            }
            if ltrack.last_played != dtrack.last_played {
                notes.push("last played".to_string());
                ltrack.last_played = dtrack.last_played;
            }
            if ltrack.mark_unplayed != dtrack.mark_unplayed && dtrack.mark_unplayed < MARK_UNPLAYED_UNKNOWN {
                notes.push("unplayed mark".to_string());
                ltrack.mark_unplayed = dtrack.mark_unplayed;
            }
            if ltrack.bookmark_ms != dtrack.bookmark_ms {
                notes.push("bookmark".to_string());
                ltrack.bookmark_ms = dtrack.bookmark_ms;
            }
            if !notes.is_empty() {
                debug!("{:<30.30} ({})", ltrack.title, notes.join(", "));
                changed += 1;
            }
        }

        if changed > 0 {
            info!("Merged stats from {} tracks", changed);
        }
        changed
    }

    /// Re-evaluate local smart playlists and save the local side
    pub fn evaluate_local_playlists(&mut self) -> Result<()> {
        self.advance(SyncState::EvaluateLocalPlaylists);
        self.local.update_smart_playlists();
        if self.options.dry_run {
            debug!("Not saving local catalog (dry-run)");
            return Ok(());
        }
        self.local.save()?;
        self.extended.persist(
            &self.paths.extended_file(),
            self.local.file_path(),
            self.local.as_ref(),
            false,
            false,
        )?;
        Ok(())
    }

    /// Compute what to copy and delete
    pub fn plan(&mut self) -> SyncPlan {
        let mut plan = SyncPlan::default();
        self.advance(SyncState::ComputeCopySet);
        plan.compute_copy_set(self.local.as_ref(), self.device.as_ref());
        self.advance(SyncState::ComputeDeleteSet);
        plan.compute_delete_set(self.device.as_ref(), &self.map);
        self.advance(SyncState::ComputeSpaceBudget);
        plan.compute_space_budget(self.device.as_ref(), &self.map);

        let mut paths = HashSet::new();
        for item in &plan.copy_set {
            if let Some(track) = self.local.track(item.local_id) {
                if !paths.insert(track.path.clone()) {
                    warn!(
                        "Duplicate track: {} ({})",
                        track.path.as_deref().unwrap_or_default(),
                        track.title
                    );
                }
            }
        }
        plan
    }

    /// Remove every delete-set track from the device
    ///
    /// Returns how many tracks were removed.
    pub fn apply_deletes(&mut self, plan: &SyncPlan) -> usize {
        self.advance(SyncState::ApplyDeletes);
        let mut removed = 0;

        for &id in &plan.delete_set {
            let Some(track) = self.device.track(id).cloned() else {
                continue;
            };
            debug!(
                "Removing {} ({})",
                track.title,
                track.path.as_deref().unwrap_or_default()
            );
            if let Some(local_id) = self.map.local_for(id) {
                self.extended.delete(local_id, ExtField::FilenameIpod);
            }
            self.map.remove(&track);
            let file = self.device.resolve_path(&track);

            if let Err(e) = self.device.remove_track(id) {
                warn!("Couldn't remove {} from device catalog: {}", track.title, e);
                continue;
            }
            if let Some(file) = file.filter(|f| f.is_file()) {
                remove_file(&file, self.options.dry_run);
            }
            removed += 1;
        }
        removed
    }

    /// Copy every pending track to the device
    ///
    /// Stops early once the copy limit is reached. The device catalog is
    /// flushed every `checkpoint_interval` copies.
    pub fn apply_copies(&mut self, plan: &SyncPlan) -> Result<CopyOutcome> {
        self.advance(SyncState::ApplyCopies);
        let mut outcome = CopyOutcome::default();
        let podcasts = plan.podcast_ids();
        let total = plan.pending.len();
        let master = self.device.master_playlist().map(|p| p.id);
        let podcast_list = self.device.podcasts_playlist().map(|p| p.id);

        for (n, &local_id) in plan.pending.iter().enumerate() {
            let Some(ltrack) = self.local.track(local_id).cloned() else {
                warn!("Local track {} disappeared, skipping", local_id);
                outcome.failed += 1;
                continue;
            };
            let Some(source) = self.local.resolve_path(&ltrack).filter(|p| p.is_file()) else {
                warn!(
                    "Can't find {}, skipping",
                    ltrack.path.as_deref().unwrap_or_default()
                );
                outcome.failed += 1;
                continue;
            };

            let mut copy = ltrack.duplicate();
            copy.path = None;
            copy.transferred = false;
            copy.artwork = None;
            let dev_id = self.device.add_track(copy)?;
            if let Some(master) = master {
                self.device.add_to_playlist(master, dev_id)?;
            }
            if podcasts.contains(&local_id) {
                if let Some(list) = podcast_list {
                    self.device.add_to_playlist(list, dev_id)?;
                    info!("Added '{}' to podcast playlist", ltrack.title);
                }
            }

            let mut thumb = "";
            if !self.options.dry_run {
                if let Err(e) = self.device.transfer_file(dev_id, &source) {
                    warn!("Copying {} failed: {}, skipping", source.display(), e);
                    if let Err(e) = self.device.remove_track(dev_id) {
                        debug!("Could not drop failed copy {}: {}", dev_id, e);
                    }
                    outcome.failed += 1;
                    continue;
                }
                let attached = self.artwork_dir.as_ref().is_some_and(|dir| {
                    attach_artwork(
                        self.device.as_mut(),
                        self.tags.as_ref(),
                        dev_id,
                        &source,
                        dir.path(),
                    )
                });
                if attached {
                    thumb = " (+thumb)";
                }
            }

            if let Some(dtrack) = self.device.track(dev_id) {
                self.map.record(&ltrack, dtrack);
                if let Some(path) = dtrack.path.as_deref() {
                    self.extended.set(local_id, ExtField::FilenameIpod, path);
                }
            }
            self.map.set_link(dev_id, local_id);
            outcome.copied += 1;
            info!(
                "Copying: {} ({}){} ({}/{})",
                ltrack.title,
                ltrack.artist.as_deref().unwrap_or_default(),
                thumb,
                n + 1,
                total
            );

            if self.options.checkpoint_interval > 0
                && outcome.copied % self.options.checkpoint_interval == 0
            {
                self.checkpoint()?;
            }
            if self.options.limit_reached(outcome.copied) {
                info!("Stopping after {} tracks (limit reached)", outcome.copied);
                outcome.stopped_at_limit = true;
                break;
            }
        }
        Ok(outcome)
    }

    fn checkpoint(&mut self) -> Result<()> {
        debug!("Flushing device catalog after {} copies", self.options.checkpoint_interval);
        self.device.update_smart_playlists();
        if !self.options.dry_run {
            self.device.save()?;
        }
        Ok(())
    }

    /// Persist everything and clean up
    pub fn finalize(&mut self) -> Result<()> {
        self.advance(SyncState::Finalize);
        debug!("Updating playlists...");
        self.device.update_smart_playlists();
        let dry_run = self.options.dry_run;

        if !dry_run {
            info!("Writing device catalog...");
            self.device.save()?;
        }
        self.extended.persist(
            &self.paths.extended_file(),
            self.local.file_path(),
            self.local.as_ref(),
            false,
            dry_run,
        )?;
        self.map.persist(dry_run)?;

        if let Some(snapshot) = self.device_snapshot.take() {
            if !dry_run {
                debug!("Backing up device catalog...");
                fs::create_dir_all(&self.paths.state_dir)?;
                fs::copy(snapshot.path(), self.paths.device_backup_file())?;
            }
        }
        if let Some(dir) = self.artwork_dir.take() {
            if let Err(e) = dir.close() {
                debug!("Could not clear temporary artwork: {}", e);
            }
        }

        self.advance(SyncState::Done);
        Ok(())
    }
}

/// Best-effort thumbnail extraction; failures are logged and dropped
pub(crate) fn attach_artwork(
    catalog: &mut dyn Catalog,
    tags: &dyn TagReader,
    id: TrackId,
    source: &Path,
    dir: &Path,
) -> bool {
    match tags.extract_artwork(source, dir) {
        Ok(Some(image)) => match catalog.set_artwork(id, &image) {
            Ok(()) => true,
            Err(e) => {
                debug!("Could not attach artwork for {}: {}", source.display(), e);
                false
            }
        },
        Ok(None) => false,
        Err(e) => {
            debug!("No artwork from {}: {}", source.display(), e);
            false
        }
    }
}

/// Copy of the device catalog file as it was before the run
fn snapshot(catalog: &Path) -> Result<Option<NamedTempFile>> {
    if !catalog.is_file() {
        return Ok(None);
    }
    let file = NamedTempFile::new()?;
    fs::copy(catalog, file.path())?;
    Ok(Some(file))
}
