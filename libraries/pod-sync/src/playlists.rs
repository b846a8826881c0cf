//! Smart playlist duplication between catalogs

use crate::error::Result;
use pod_core::{Catalog, PlaylistId};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlaylistsReport {
    /// Names of the playlists created in the target
    pub copied: Vec<String>,
    /// Playlist-reference rules pointed at the target's playlist of the same name
    pub rewritten_rules: usize,
    /// Rules whose referenced playlist has no counterpart in the target
    pub unresolved_rules: usize,
}

/// Duplicate every smart playlist of `from` into `to`
///
/// Playlists whose name already exists in `to` are left alone. Rules that
/// reference another playlist are rewritten to the id of the playlist with
/// the same name in `to`.
pub fn copy_smart_playlists(from: &dyn Catalog, to: &mut dyn Catalog) -> Result<CopyPlaylistsReport> {
    let mut report = CopyPlaylistsReport::default();
    let mut copied: Vec<PlaylistId> = Vec::new();

    for playlist in from.playlists().iter().filter(|p| p.is_smart()) {
        if to.playlist_by_name(&playlist.name).is_some() {
            debug!("Playlist '{}' already exists, not copying", playlist.name);
            continue;
        }
        let mut duplicate = playlist.duplicate();
        duplicate.tracks.clear();
        let id = to.add_playlist(duplicate)?;
        info!("Copied playlist '{}'", playlist.name);
        report.copied.push(playlist.name.clone());
        copied.push(id);
    }

    for id in copied {
        let rules = match to.playlist(id).and_then(|p| p.smart.as_ref()) {
            Some(smart) => smart.rules.clone(),
            None => continue,
        };
        let name = to.playlist(id).map(|p| p.name.clone()).unwrap_or_default();

        let mut rewritten = rules.clone();
        for rule in &mut rewritten {
            let Some(original) = rule.playlist_reference() else {
                continue;
            };
            let target = from
                .playlist(original)
                .and_then(|p| to.playlist_by_name(&p.name))
                .map(|p| p.id);
            match target {
                Some(target) => {
                    rule.from_value = target.get();
                    rule.to_value = target.get();
                    report.rewritten_rules += 1;
                }
                None => {
                    let missing = from
                        .playlist(original)
                        .map_or_else(|| original.to_string(), |p| p.name.clone());
                    warn!(
                        "Error copying smart playlist '{}', can't find playlist '{}' referenced in rules. Rebuild this playlist manually!",
                        name, missing
                    );
                    report.unresolved_rules += 1;
                }
            }
        }

        if rewritten != rules {
            if let Some(smart) = to.playlist_mut(id).and_then(|p| p.smart.as_mut()) {
                smart.rules = rewritten;
            }
        }
    }

    if report.rewritten_rules > 0 {
        warn!("One or more smart playlists has rules referring to other playlists");
        warn!("Those rules may not have copied correctly, verify them");
    }
    to.update_smart_playlists();
    Ok(report)
}
