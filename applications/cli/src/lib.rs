//! podsync command line front end
//!
//! Argument parsing, settings, console prompts and output formatting. The
//! binary in `main.rs` wires these to the `pod_sync` commands.

pub mod cli;
pub mod config;
pub mod console;
pub mod output;

pub use cli::{Cli, Commands, GlobalArgs, PlaylistCommand};
pub use config::{ConfigError, Settings};
pub use console::ConsolePrompt;

use pod_sync::{StatePaths, SyncOptions};

/// Layer command line flags over loaded settings
pub fn resolve(settings: &Settings, globals: &GlobalArgs) -> (StatePaths, SyncOptions) {
    let mut settings = settings.clone();
    if let Some(mountpoint) = &globals.mountpoint {
        settings.mountpoint = mountpoint.clone();
    }
    if let Some(db) = &globals.local_db {
        settings.local_db = Some(db.clone());
    }
    if let Some(dir) = &globals.music_dir {
        settings.music_dir = Some(dir.clone());
    }
    if globals.limit.is_some() {
        settings.transfer_limit = globals.limit;
    }

    let mut options = settings.options();
    options.dry_run = globals.dry_run;
    options.force = globals.force;
    options.delete_files = globals.del_files;
    options.rating = globals.rating.unwrap_or_default();
    (settings.paths(), options)
}

/// Process exit status for a failed run
///
/// Invalid command input exits with 2, like clap's own usage errors. Every
/// other failure is a setup problem and exits with 1.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<pod_sync::SyncError>() {
        Some(e) if e.is_usage() => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_sync::SyncError;
    use std::path::PathBuf;

    #[test]
    fn flags_override_settings() {
        let settings = Settings {
            mountpoint: PathBuf::from("/mnt/ipod"),
            state_dir: PathBuf::from("/state"),
            transfer_limit: Some(10),
            ..Settings::default()
        };
        let globals = GlobalArgs {
            mountpoint: Some(PathBuf::from("/media/other")),
            limit: Some(3),
            rating: Some(4),
            dry_run: true,
            del_files: true,
            ..GlobalArgs::default()
        };

        let (paths, options) = resolve(&settings, &globals);
        assert_eq!(paths.mountpoint, PathBuf::from("/media/other"));
        assert_eq!(paths.local_db, PathBuf::from("/state/local.json"));
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.rating, 4);
        assert!(options.dry_run && options.delete_files && !options.force);
    }

    #[test]
    fn settings_apply_without_flags() {
        let settings = Settings {
            state_dir: PathBuf::from("/state"),
            transfer_limit: Some(10),
            checkpoint_interval: 7,
            ..Settings::default()
        };
        let (_, options) = resolve(&settings, &GlobalArgs::default());
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.checkpoint_interval, 7);
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let usage = anyhow::Error::new(SyncError::Usage("bad pattern".to_string()));
        assert_eq!(exit_status(&usage), 2);

        let setup = anyhow::Error::new(SyncError::MissingPlaylist("master"));
        assert_eq!(exit_status(&setup), 1);

        let config = anyhow::Error::new(ConfigError::Invalid("zero".to_string()));
        assert_eq!(exit_status(&config), 1);
    }
}
