//! Shared options bundle and on-disk state layout

use std::path::{Path, PathBuf};

/// Bytes kept in reserve when estimating whether a sync fits on the device
pub const SYNC_SAFETY_MARGIN: u64 = 13_000_000;
/// Bytes left free on the device when adding files directly
pub const ADD_FREE_FLOOR: u64 = 5_000_000;
/// Copies between device catalog checkpoints
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;
/// Files smaller than this are treated as corrupt stubs
pub const STUB_FILE_FLOOR: u64 = 10;

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Compute and report, but never write catalogs, state files or audio files
    pub dry_run: bool,
    /// Override duplicate and confirmation guards
    pub force: bool,
    /// Remove audio files along with catalog entries
    pub delete_files: bool,
    /// Stop after this many file copies
    pub limit: Option<usize>,
    /// Copies between device catalog checkpoints during sync
    pub checkpoint_interval: usize,
    /// Star rating (0-5) assigned to added tracks
    pub rating: u8,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            delete_files: false,
            limit: None,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            rating: 0,
        }
    }
}

impl SyncOptions {
    pub(crate) fn limit_reached(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| limit > 0 && count >= limit)
    }
}

/// Where catalogs and side files live
#[derive(Debug, Clone)]
pub struct StatePaths {
    /// Directory holding the identity map and backups
    pub state_dir: PathBuf,
    /// Local catalog file
    pub local_db: PathBuf,
    /// Device mount point
    pub mountpoint: PathBuf,
    /// Root of the local music tree, used by `dump`
    pub music_dir: PathBuf,
}

impl StatePaths {
    /// Conventional layout: `local.json` inside `state_dir`
    pub fn new(state_dir: impl Into<PathBuf>, mountpoint: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            local_db: state_dir.join("local.json"),
            music_dir: state_dir.join("music"),
            mountpoint: mountpoint.into(),
            state_dir,
        }
    }

    /// Extended metadata file, next to the local catalog
    pub fn extended_file(&self) -> PathBuf {
        let mut name = self.local_db.as_os_str().to_owned();
        name.push(".ext");
        PathBuf::from(name)
    }

    /// Identity map file
    pub fn map_file(&self) -> PathBuf {
        self.state_dir.join("map")
    }

    /// Backup of the device catalog taken by `sync`
    pub fn device_backup_file(&self) -> PathBuf {
        self.state_dir.join("device-catalog.bak")
    }

    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }
}
