//! Small filesystem helpers shared by the catalog passes

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Size of a file, 0 if it can't be read
pub(crate) fn file_size(path: Option<&Path>) -> u64 {
    path.and_then(|p| fs::metadata(p).ok())
        .map_or(0, |m| m.len())
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Best-effort file removal honouring dry-run
pub(crate) fn remove_file(path: &Path, dry_run: bool) -> bool {
    if dry_run {
        debug!("Not deleting {} (dry-run)", path.display());
        return false;
    }
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Couldn't delete file {}: {}", path.display(), e);
            false
        }
    }
}
