use super::{Context, Pair, Target};
use crate::checker::{check_device, check_local, CheckReport};
use crate::error::Result;
use crate::prompt::Prompt;
use pod_catalog::FileCatalog;
use tracing::info;

/// Check and repair a catalog, saving whatever was repaired
pub fn check(ctx: &Context, target: Target, prompt: &mut dyn Prompt) -> Result<CheckReport> {
    let report = match target {
        Target::Local => {
            let mut side = ctx.with_extended(FileCatalog::open(&ctx.paths.local_db)?)?;
            let report = check_local(&mut side.catalog, &mut side.extended, &ctx.options)?;
            if report.modified {
                ctx.save_local(&mut side)?;
            } else if report.extended_changed {
                side.extended.persist(
                    &ctx.paths.extended_file(),
                    &ctx.paths.local_db,
                    &side.catalog,
                    false,
                    ctx.options.dry_run,
                )?;
            }
            report
        }
        Target::Device => {
            let Pair {
                local,
                mut device,
                mut map,
            } = ctx.open_pair()?;
            map.carry_forward(&local.catalog, &device);
            let report = check_device(&mut device, &mut map, &local.catalog, prompt, &ctx.options)?;
            if report.modified && !report.aborted {
                ctx.save(&device)?;
                map.persist(ctx.options.dry_run)?;
            }
            report
        }
    };

    info!(
        "{} files in catalog, {} repairs",
        report.files_in_catalog, report.repairs
    );
    if report.in_sync && report.repairs == 0 {
        info!("Everything in sync");
    }
    Ok(report)
}
