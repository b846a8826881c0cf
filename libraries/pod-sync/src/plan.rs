//! Copy and delete sets for one sync run

use crate::identity::IdentityMap;
use crate::options::SYNC_SAFETY_MARGIN;
use pod_core::{Catalog, DiskSpace, TrackId};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A local track that must be present on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyItem {
    pub local_id: TrackId,
    /// Also goes into the device podcast playlist
    pub is_podcast: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Every local track the device should hold, each once
    pub copy_set: Vec<CopyItem>,
    /// Device tracks to remove
    pub delete_set: Vec<TrackId>,
    /// Size of the whole copy set
    pub total_bytes: u64,
    /// Size of the copy set members not yet on the device
    pub copy_bytes: u64,
    /// Size reclaimed by the delete set
    pub stale_bytes: u64,
    /// Copy set members with no device counterpart, in copy order
    pub pending: Vec<TrackId>,
    /// Device free space minus the safety margin, when known
    pub byte_budget: Option<u64>,
    pub insufficient_space: bool,
}

impl SyncPlan {
    /// Compute the copy set, the delete set and the space budget
    pub fn build(local: &dyn Catalog, device: &dyn Catalog, map: &IdentityMap) -> Self {
        let mut plan = Self::default();
        plan.compute_copy_set(local, device);
        plan.compute_delete_set(device, map);
        plan.compute_space_budget(device, map);
        plan
    }

    /// Tracks of every local playlist mirrored by name on the device, plus
    /// pending podcast episodes
    pub(crate) fn compute_copy_set(&mut self, local: &dyn Catalog, device: &dyn Catalog) {
        let mut seen = HashSet::new();

        for playlist in local.playlists() {
            if playlist.is_master() || playlist.is_podcasts() {
                continue;
            }
            if device.playlist_by_name(&playlist.name).is_none() {
                continue;
            }
            info!("Playlist: {} ({} tracks)", playlist.name, playlist.tracks.len());
            for &id in &playlist.tracks {
                if let Some(track) = local.track(id) {
                    if seen.insert(id) {
                        self.push_copy(id, false, track.size);
                    }
                }
            }
        }

        match local.podcasts_playlist() {
            Some(podcasts) => {
                info!("Playlist: {} ({} tracks)", podcasts.name, podcasts.tracks.len());
                for &id in &podcasts.tracks {
                    let Some(track) = local.track(id) else {
                        continue;
                    };
                    if track.is_pending_podcast() && seen.insert(id) {
                        self.push_copy(id, true, track.size);
                    }
                }
            }
            None => debug!("Local catalog has no podcast playlist"),
        }
        if device.podcasts_playlist().is_none() {
            warn!("Device doesn't have a podcast playlist");
        }
    }

    fn push_copy(&mut self, local_id: TrackId, is_podcast: bool, size: u64) {
        self.copy_set.push(CopyItem {
            local_id,
            is_podcast,
            size,
        });
        self.total_bytes += size;
    }

    /// Device tracks that are unmapped or whose counterpart isn't being copied
    pub(crate) fn compute_delete_set(&mut self, device: &dyn Catalog, map: &IdentityMap) {
        let wanted: HashSet<TrackId> = self.copy_set.iter().map(|c| c.local_id).collect();
        for track in device.tracks() {
            match map.local_for(track.id) {
                Some(local_id) if wanted.contains(&local_id) => {}
                _ => {
                    self.delete_set.push(track.id);
                    self.stale_bytes += track.size;
                }
            }
        }
        info!(
            "Will remove {} stale tracks from device ({} MB)",
            self.delete_set.len(),
            self.stale_bytes / 1024 / 1024
        );
    }

    /// Split the copy set into already-present and pending, then compare the
    /// bytes still to transfer against the device's free space
    pub(crate) fn compute_space_budget(&mut self, device: &dyn Catalog, map: &IdentityMap) {
        self.copy_bytes = self.total_bytes;
        for item in &self.copy_set {
            let on_device = map
                .device_for(item.local_id)
                .and_then(|id| device.track(id));
            match on_device {
                Some(existing) => self.copy_bytes = self.copy_bytes.saturating_sub(existing.size),
                None => self.pending.push(item.local_id),
            }
        }

        info!(
            "Preparing to copy {} new tracks ({} MB, total {} MB)",
            self.pending.len(),
            self.copy_bytes / 1024 / 1024,
            self.total_bytes / 1024 / 1024
        );

        match device.space() {
            Ok(Some(space)) => self.check_space(space),
            Ok(None) => debug!("Device free space unknown, skipping space check"),
            Err(e) => warn!("Could not read device free space: {}", e),
        }
    }

    /// Budget is free space minus the safety margin; a shortfall only warns
    pub(crate) fn check_space(&mut self, space: DiskSpace) {
        let budget = space.available.saturating_sub(SYNC_SAFETY_MARGIN);
        self.byte_budget = Some(budget);
        self.insufficient_space = self.copy_bytes > budget;
        if self.insufficient_space {
            warn!(
                "Insufficient space to copy (need {} MB, have {} MB)",
                self.copy_bytes / 1024 / 1024,
                budget / 1024 / 1024
            );
        }
    }

    /// Whether nothing needs copying or deleting
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.delete_set.is_empty()
    }

    /// Whether no copy set member has its device counterpart in the delete set
    pub fn is_disjoint(&self, map: &IdentityMap) -> bool {
        let deleted: HashSet<TrackId> = self.delete_set.iter().copied().collect();
        self.copy_set.iter().all(|item| {
            map.device_for(item.local_id)
                .map_or(true, |dev| !deleted.contains(&dev))
        })
    }

    pub(crate) fn podcast_ids(&self) -> HashSet<TrackId> {
        self.copy_set
            .iter()
            .filter(|c| c.is_podcast)
            .map(|c| c.local_id)
            .collect()
    }
}
