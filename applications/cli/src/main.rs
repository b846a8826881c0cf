use anyhow::{Context as _, Result};
use clap::Parser;
use pod_sync::commands::{self, playlist, Context, Target};
use pod_sync::{SyncEngine, SyncMode};
use pod_tags::LoftyTagReader;
use podsync_cli::{output, Cli, Commands, ConsolePrompt, PlaylistCommand, Settings};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.globals.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(podsync_cli::exit_status(&e))
        }
    }
}

fn target(device: bool) -> Target {
    if device {
        Target::Device
    } else {
        Target::Local
    }
}

fn print(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.globals.config.as_deref()).context("loading settings")?;
    let (paths, options) = podsync_cli::resolve(&settings, &cli.globals);
    debug!("Local catalog: {}", paths.local_db.display());
    debug!("Device mount: {}", paths.mountpoint.display());
    if options.dry_run {
        info!("Dry run, nothing will be written");
    }

    let ctx = Context::new(paths, options);
    let tags = LoftyTagReader::new();
    let mut prompt = ConsolePrompt::new(ctx.options.force);

    match cli.command {
        Commands::Sync { meta } => {
            let mode = if meta {
                SyncMode::MetadataOnly
            } else {
                SyncMode::Full
            };
            let mut engine =
                SyncEngine::open(ctx.paths.clone(), ctx.options.clone(), Box::new(tags))?;
            let summary = engine.run(mode, &mut prompt)?;
            println!("{} tracks with updated statistics", summary.merged);
            if !summary.aborted && mode == SyncMode::Full {
                println!(
                    "{} tracks deleted, {} copied, {} failed",
                    summary.deleted, summary.copies.copied, summary.copies.failed
                );
                if summary.copies.stopped_at_limit {
                    println!("Stopped at the transfer limit");
                }
            }
        }

        Commands::Check { device } => {
            let report = commands::check(&ctx, target(device), &mut prompt)?;
            if report.aborted {
                println!("Check aborted, nothing changed");
            } else {
                println!(
                    "{} files in catalog, {} repairs",
                    report.files_in_catalog, report.repairs
                );
            }
            for issue in &report.smart_issues {
                println!(
                    "Smart playlist '{}' refers to missing playlist {}",
                    issue.playlist, issue.missing
                );
            }
        }

        Commands::Add {
            device,
            podcast,
            files,
        } => {
            let report = commands::add(&ctx, target(device), &files, podcast, &tags)?;
            println!(
                "{} added, {} skipped, {} left out for lack of space",
                report.added.len(),
                report.skipped,
                report.no_space
            );
        }

        Commands::Delete { device, patterns } => {
            let report = commands::delete(&ctx, target(device), &patterns, &mut prompt)?;
            if report.matched.is_empty() {
                println!("No matching tracks");
            } else {
                print(&output::track_table(&report.matched));
                println!("{} tracks deleted", report.deleted);
            }
        }

        Commands::List { device, patterns } => {
            let tracks = commands::list(&ctx, target(device), &patterns)?;
            print(&output::track_table(&tracks));
        }

        Commands::Diff => {
            let diffs = commands::diff(&ctx)?;
            println!("{:<40} local | device", "");
            print(&output::diff_lines(&diffs));
        }

        Commands::Update { patterns } => {
            let updated = commands::update(&ctx, &patterns, &mut prompt, &tags)?;
            println!("{} tracks updated", updated.len());
        }

        Commands::Dump => {
            let report = commands::dump(&ctx)?;
            println!(
                "{} copied, {} already present, {} missing on device",
                report.copied, report.duplicates, report.missing
            );
            for name in &report.playlists.copied {
                println!("Copied playlist '{name}'");
            }
        }

        Commands::MakeMap => {
            let report = commands::make_map(&ctx)?;
            println!(
                "{} of {} device tracks mapped, {} size mismatches",
                report.matched, report.scanned, report.size_mismatches
            );
        }

        Commands::Eval { device } => {
            let count = commands::evaluate(&ctx, target(device))?;
            println!("{count} smart playlists evaluated");
        }

        Commands::FixArtwork => {
            let report = commands::fix_artwork(&ctx, &tags)?;
            println!("Artwork attached to {} of {} tracks", report.attached, report.scanned);
        }

        Commands::WriteExt => {
            let report = commands::write_extended_info(&ctx)?;
            println!("{} records written, {} files hashed", report.records, report.hashed);
        }

        Commands::Playlist { device, action } => {
            run_playlist(&ctx, target(device), action, &mut prompt)?;
        }
    }

    Ok(())
}

fn run_playlist(
    ctx: &Context,
    target: Target,
    action: PlaylistCommand,
    prompt: &mut dyn pod_sync::Prompt,
) -> Result<()> {
    match action {
        PlaylistCommand::Create { name, podcast } => {
            let id = playlist::create(ctx, target, &name, podcast)?;
            println!("Created playlist '{name}' ({id})");
        }
        PlaylistCommand::List { name: None } => {
            print(&output::playlist_table(&playlist::list(ctx, target)?));
        }
        PlaylistCommand::List { name: Some(name) } => {
            print(&output::track_table(&playlist::tracks(ctx, target, &name)?));
        }
        PlaylistCommand::Rules { name } => {
            print(&output::rules_lines(&playlist::rules(ctx, target, name.as_deref())?));
        }
        PlaylistCommand::Add { name, patterns } => {
            let added = playlist::add(ctx, target, &name, &patterns)?;
            println!("{} tracks added to '{name}'", added.len());
        }
        PlaylistCommand::Remove { name, patterns } => {
            let removed = playlist::remove(ctx, target, &name, &patterns)?;
            println!("{} tracks removed from '{name}'", removed.len());
        }
        PlaylistCommand::Delete { name } => {
            if playlist::delete(ctx, target, &name, prompt)? {
                println!("Deleted playlist '{name}'");
            } else {
                println!("Playlist '{name}' kept");
            }
        }
    }
    Ok(())
}
