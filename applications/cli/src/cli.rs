//! Command line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "podsync")]
#[command(about = "Keep an iPod and a local catalog in sync", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Device mount point
    #[arg(short = 'm', long, global = true)]
    pub mountpoint: Option<PathBuf>,

    /// Local catalog file
    #[arg(short = 'l', long, global = true)]
    pub local_db: Option<PathBuf>,

    /// Destination directory for `dump`
    #[arg(short = 'M', long, global = true)]
    pub music_dir: Option<PathBuf>,

    /// Star rating (0-5) given to added tracks
    #[arg(short = 'r', long, global = true, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub rating: Option<u8>,

    /// Remove audio files together with their catalog entries
    #[arg(long, global = true)]
    pub del_files: bool,

    /// Stop after this many file copies (0 for no limit)
    #[arg(long, global = true)]
    pub limit: Option<usize>,

    /// More output; repeat for more detail
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Skip confirmations and duplicate guards
    #[arg(short = 'f', long, global = true)]
    pub force: bool,

    /// Report what would happen without writing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Configuration file (default: ~/.podsync/config.toml)
    #[arg(long, global = true, env = "PODSYNC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge play statistics and copy playlist tracks to the device
    Sync {
        /// Only merge statistics and re-evaluate local smart playlists
        #[arg(long)]
        meta: bool,
    },

    /// Check a catalog against the files it references and repair it
    Check {
        #[arg(long)]
        device: bool,
    },

    /// Add audio files or directories
    Add {
        #[arg(long)]
        device: bool,

        /// Add as podcast episodes
        #[arg(long)]
        podcast: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete tracks matching any pattern (`notdb` on the device selects unmapped tracks)
    Delete {
        #[arg(long)]
        device: bool,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// List tracks matching any pattern, or every track
    List {
        #[arg(long)]
        device: bool,

        patterns: Vec<String>,
    },

    /// Show statistics that differ between mapped tracks
    Diff,

    /// Re-read tags of local tracks matching any pattern
    Update {
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Copy device tracks into the local music directory
    Dump,

    /// Rebuild the identity map from scratch
    MakeMap,

    /// Re-evaluate smart playlists
    Eval {
        #[arg(long)]
        device: bool,
    },

    /// Attach embedded cover art to device tracks
    FixArtwork,

    /// Rewrite extended metadata with fresh file hashes
    WriteExt,

    /// Manage playlists
    Playlist {
        #[arg(long, global = true)]
        device: bool,

        #[command(subcommand)]
        action: PlaylistCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum PlaylistCommand {
    /// Create an empty playlist
    Create {
        name: String,

        #[arg(long)]
        podcast: bool,
    },

    /// List playlists, or the tracks of one playlist
    List { name: Option<String> },

    /// Show smart playlist rules
    Rules { name: Option<String> },

    /// Add tracks matching any pattern
    Add {
        name: String,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Remove tracks matching any pattern
    Remove {
        name: String,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Delete a playlist
    Delete { name: String },
}

impl GlobalArgs {
    /// Log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
