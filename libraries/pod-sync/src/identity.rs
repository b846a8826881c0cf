//! Identity map: persistent local-path to device-path correlation
//!
//! The file holds one `localPath;devicePath` pair per line. Loading resolves
//! the pairs against both catalogs into a device-id to local-id lookup; the
//! pairs recorded during the run form a new generation, which is the only
//! thing persisted.

use crate::error::Result;
use crate::files::{file_size, parent_dir};
use pod_core::{Catalog, Track, TrackId};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Relative size difference tolerated when rebuilding the map
pub const REBUILD_SIZE_TOLERANCE: f64 = 0.01;

/// Outcome of [`IdentityMap::rebuild`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Device tracks matched to a local track
    pub matched: usize,
    /// Device tracks examined
    pub scanned: usize,
    /// Candidates rejected because the file sizes differed too much
    pub size_mismatches: usize,
}

#[derive(Debug, Clone)]
pub struct IdentityMap {
    path: PathBuf,
    old: Vec<(String, String)>,
    new: BTreeMap<String, String>,
    links: HashMap<TrackId, TrackId>,
}

impl IdentityMap {
    /// Empty map that will persist to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            old: Vec::new(),
            new: BTreeMap::new(),
            links: HashMap::new(),
        }
    }

    /// Read the pair file and resolve it against both catalogs
    ///
    /// A missing file yields an empty map. Malformed lines are skipped.
    pub fn load(path: impl Into<PathBuf>, local: &dyn Catalog, device: &dyn Catalog) -> Result<Self> {
        let mut map = Self::empty(path);

        match fs::read_to_string(&map.path) {
            Ok(raw) => {
                for line in raw.lines() {
                    let line = line.trim_end_matches('\r');
                    match line.rsplit_once(';') {
                        Some((l, d)) if !l.is_empty() && !d.is_empty() => {
                            map.old.push((l.to_string(), d.to_string()));
                        }
                        _ if line.trim().is_empty() => {}
                        _ => debug!("Skipping malformed map line: {:?}", line),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No map file at {}, will create later", map.path.display());
            }
            Err(e) => return Err(e.into()),
        }

        map.resolve(local, device);
        debug!(
            "Loaded {} map entries, {} resolved",
            map.old.len(),
            map.links.values().filter(|l| l.is_assigned()).count()
        );
        Ok(map)
    }

    fn resolve(&mut self, local: &dyn Catalog, device: &dyn Catalog) {
        let by_device_path: HashMap<&str, TrackId> = device
            .tracks()
            .iter()
            .filter_map(|t| Some((t.path.as_deref()?, t.id)))
            .collect();
        let by_local_path: HashMap<&str, TrackId> = local
            .tracks()
            .iter()
            .filter_map(|t| Some((t.path.as_deref()?, t.id)))
            .collect();

        self.links = device
            .tracks()
            .iter()
            .map(|t| (t.id, TrackId::UNASSIGNED))
            .collect();
        for (l, d) in &self.old {
            if let (Some(&dev), Some(&loc)) = (by_device_path.get(d.as_str()), by_local_path.get(l.as_str())) {
                self.links.insert(dev, loc);
            }
        }
    }

    /// Record `local ↔ device` in the new generation
    ///
    /// No-op if either track has no path.
    pub fn record(&mut self, local: &Track, device: &Track) {
        if let (Some(l), Some(d)) = (non_empty(&local.path), non_empty(&device.path)) {
            self.new.insert(l.to_string(), d.to_string());
        }
    }

    /// Drop any new-generation entry pointing at this device track
    pub fn remove(&mut self, device: &Track) {
        if let Some(d) = non_empty(&device.path) {
            self.new.retain(|_, v| v != d);
        }
        self.links.remove(&device.id);
    }

    /// Carry every resolved link into the new generation
    ///
    /// Used by commands that touch the device without a stats merge.
    pub fn carry_forward(&mut self, local: &dyn Catalog, device: &dyn Catalog) {
        let pairs: Vec<(TrackId, TrackId)> = self
            .links
            .iter()
            .filter(|(_, l)| l.is_assigned())
            .map(|(d, l)| (*d, *l))
            .collect();
        for (dev, loc) in pairs {
            if let (Some(lt), Some(dt)) = (local.track(loc), device.track(dev)) {
                self.record(lt, dt);
            }
        }
    }

    /// Write the new generation, replacing the file atomically
    pub fn persist(&self, dry_run: bool) -> Result<()> {
        if dry_run {
            debug!("Not writing map file (dry-run)");
            return Ok(());
        }
        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        for (l, d) in &self.new {
            writeln!(file, "{l};{d}")?;
        }
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!("Wrote {} map entries to {}", self.new.len(), self.path.display());
        Ok(())
    }

    /// Re-derive the map from catalog contents
    ///
    /// A device track matches a local track with the same title, artist and
    /// album whose file is nonempty and within 1% of the device file's size.
    pub fn rebuild(&mut self, local: &dyn Catalog, device: &dyn Catalog) -> RebuildReport {
        let mut by_song: HashMap<(&str, Option<&str>, Option<&str>), Vec<&Track>> = HashMap::new();
        for track in local.tracks() {
            by_song
                .entry(song_key(track))
                .or_default()
                .push(track);
        }

        let mut report = RebuildReport::default();
        for dtrack in device.tracks() {
            report.scanned += 1;
            let Some(candidates) = by_song.get(&song_key(dtrack)) else {
                continue;
            };
            let device_size = file_size(device.resolve_path(dtrack).as_deref());

            let found = candidates.iter().find(|ltrack| {
                let local_size = file_size(local.resolve_path(ltrack).as_deref());
                if local_size == 0 {
                    return false;
                }
                let delta = local_size.abs_diff(device_size) as f64 / local_size as f64;
                if delta < REBUILD_SIZE_TOLERANCE {
                    true
                } else {
                    info!(
                        "Filesize mismatch for {} ({}/{}), ignoring",
                        dtrack.title, device_size, local_size
                    );
                    report.size_mismatches += 1;
                    false
                }
            });

            if let Some(ltrack) = found {
                self.record(ltrack, dtrack);
                self.links.insert(dtrack.id, ltrack.id);
                report.matched += 1;
            }
        }

        info!(
            "Matched {} out of {} tracks on device",
            report.matched, report.scanned
        );
        report
    }

    /// Local counterpart of a device track
    pub fn local_for(&self, device_id: TrackId) -> Option<TrackId> {
        self.links
            .get(&device_id)
            .copied()
            .filter(|l| l.is_assigned())
    }

    /// Device counterpart of a local track
    pub fn device_for(&self, local_id: TrackId) -> Option<TrackId> {
        if !local_id.is_assigned() {
            return None;
        }
        self.links
            .iter()
            .filter(|(_, l)| **l == local_id)
            .map(|(d, _)| *d)
            .min()
    }

    pub fn is_mapped(&self, device_id: TrackId) -> bool {
        self.local_for(device_id).is_some()
    }

    pub fn set_link(&mut self, device_id: TrackId, local_id: TrackId) {
        self.links.insert(device_id, local_id);
    }

    pub fn unlink(&mut self, device_id: TrackId) {
        self.links.insert(device_id, TrackId::UNASSIGNED);
    }

    /// New-generation pairs, ordered by local path
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.new.iter().map(|(l, d)| (l.as_str(), d.as_str()))
    }

    /// Pairs read from disk
    pub fn loaded_entries(&self) -> &[(String, String)] {
        &self.old
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn non_empty(path: &Option<String>) -> Option<&str> {
    path.as_deref().filter(|p| !p.is_empty())
}

fn song_key(track: &Track) -> (&str, Option<&str>, Option<&str>) {
    (
        track.title.as_str(),
        track.artist.as_deref(),
        track.album.as_deref(),
    )
}
