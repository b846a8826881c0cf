//! Operator commands
//!
//! Each command opens what it needs, performs its work and persists the
//! result itself. Output formatting is left to the caller.

mod add;
mod check;
mod delete;
mod diff;
mod dump;
mod list;
mod maintenance;
pub mod playlist;
mod update;

pub use add::{add, AddReport};
pub use check::check;
pub use delete::{delete, DeleteReport, NOT_IN_LOCAL};
pub use diff::{diff, TrackDiff};
pub use dump::{dump, dump_file_name, DumpReport};
pub use list::list;
pub use maintenance::{evaluate, fix_artwork, make_map, write_extended_info, FixArtworkReport};
pub use update::update;

use crate::error::Result;
use crate::extended::ExtendedMetadata;
pub(crate) use crate::files::remove_file;
use crate::identity::IdentityMap;
use crate::matcher::{FieldMask, MatchMode};
use crate::options::{StatePaths, SyncOptions};
use pod_catalog::FileCatalog;
use pod_core::{Catalog, TrackId};
use std::path::Path;
use tracing::debug;

/// Which catalog a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Local,
    Device,
}

/// Shared state for every command invocation
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: StatePaths,
    pub options: SyncOptions,
}

/// Local catalog together with its extended metadata
pub struct LocalSide {
    pub catalog: FileCatalog,
    pub extended: ExtendedMetadata,
}

impl Context {
    pub fn new(paths: StatePaths, options: SyncOptions) -> Self {
        Self { paths, options }
    }

    /// Open the local catalog, creating it if needed, and its extended metadata
    pub fn open_local(&self) -> Result<LocalSide> {
        self.with_extended(FileCatalog::open_or_create(&self.paths.local_db)?)
    }

    fn with_extended(&self, mut catalog: FileCatalog) -> Result<LocalSide> {
        let mut extended =
            ExtendedMetadata::load(&self.paths.extended_file(), &self.paths.local_db, &catalog)?;
        extended.restore_paths(&mut catalog);
        Ok(LocalSide { catalog, extended })
    }

    /// Open an existing local catalog, the device and the identity map
    pub fn open_pair(&self) -> Result<Pair> {
        let local = self.with_extended(FileCatalog::open(&self.paths.local_db)?)?;
        let device = self.open_device()?;
        let map = self.open_map(&local.catalog, &device)?;
        Ok(Pair { local, device, map })
    }

    pub fn open_device(&self) -> Result<FileCatalog> {
        Ok(FileCatalog::open_device(&self.paths.mountpoint)?)
    }

    pub fn open_map(&self, local: &dyn Catalog, device: &dyn Catalog) -> Result<IdentityMap> {
        IdentityMap::load(self.paths.map_file(), local, device)
    }

    /// Open the catalog a command targets
    pub fn open_target(&self, target: Target) -> Result<Opened> {
        Ok(match target {
            Target::Local => Opened::Local(self.open_local()?),
            Target::Device => Opened::Device(self.open_device()?),
        })
    }

    /// Save a catalog unless this is a dry run
    pub fn save(&self, catalog: &dyn Catalog) -> Result<()> {
        if self.options.dry_run {
            debug!("Not saving {} catalog (dry-run)", catalog.kind());
            return Ok(());
        }
        catalog.save()?;
        Ok(())
    }

    /// Save the local catalog and rewrite its extended metadata
    pub fn save_local(&self, side: &mut LocalSide) -> Result<()> {
        self.save(&side.catalog)?;
        side.extended.persist(
            &self.paths.extended_file(),
            &self.paths.local_db,
            &side.catalog,
            false,
            self.options.dry_run,
        )?;
        Ok(())
    }

    /// Save whichever catalog was opened
    pub fn save_opened(&self, opened: &mut Opened) -> Result<()> {
        match opened {
            Opened::Local(side) => self.save_local(side),
            Opened::Device(device) => self.save(device),
        }
    }
}

/// Both catalogs of a dual-catalog command
pub struct Pair {
    pub local: LocalSide,
    pub device: FileCatalog,
    pub map: IdentityMap,
}

/// A catalog opened for a [`Target`]
pub enum Opened {
    Local(LocalSide),
    Device(FileCatalog),
}

impl Opened {
    pub fn catalog(&self) -> &FileCatalog {
        match self {
            Self::Local(side) => &side.catalog,
            Self::Device(device) => device,
        }
    }

    pub fn catalog_mut(&mut self) -> &mut FileCatalog {
        match self {
            Self::Local(side) => &mut side.catalog,
            Self::Device(device) => device,
        }
    }

    pub fn extended_mut(&mut self) -> Option<&mut ExtendedMetadata> {
        match self {
            Self::Local(side) => Some(&mut side.extended),
            Self::Device(_) => None,
        }
    }
}

/// Path mode when the pattern names an existing file or directory,
/// regex over title, artist and album otherwise
pub fn infer_mode(pattern: &str) -> MatchMode {
    if Path::new(pattern).exists() {
        MatchMode::Path
    } else {
        MatchMode::Fields(FieldMask::ALL)
    }
}

/// Match mode for a command target; device paths are never filesystem paths
pub(crate) fn target_mode(target: Target, pattern: &str) -> MatchMode {
    match target {
        Target::Local => infer_mode(pattern),
        Target::Device => MatchMode::Fields(FieldMask::ALL),
    }
}

/// Ids of tracks matching any pattern, each once, in first-match order
pub(crate) fn matching_ids(
    catalog: &dyn Catalog,
    patterns: &[String],
    mode: impl Fn(&str) -> MatchMode,
) -> Result<Vec<TrackId>> {
    let mut ids = Vec::new();
    for pattern in patterns {
        debug!("Matching with pattern: {}", pattern);
        for track in crate::matcher::find_tracks(catalog, pattern, mode(pattern))? {
            if !ids.contains(&track.id) {
                ids.push(track.id);
            }
        }
    }
    Ok(ids)
}
