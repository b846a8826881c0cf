use super::{matching_ids, target_mode, Context, Target};
use crate::error::Result;
use pod_core::{Catalog, Track};

/// Tracks matching any pattern, `.*` when none is given
pub fn list(ctx: &Context, target: Target, patterns: &[String]) -> Result<Vec<Track>> {
    let opened = ctx.open_target(target)?;
    let catalog = opened.catalog();
    let all = [".*".to_string()];
    let patterns = if patterns.is_empty() { &all[..] } else { patterns };

    let ids = matching_ids(catalog, patterns, |p| target_mode(target, p))?;
    Ok(ids
        .into_iter()
        .filter_map(|id| catalog.track(id).cloned())
        .collect())
}
