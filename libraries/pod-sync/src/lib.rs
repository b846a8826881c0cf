//! Synchronization engine for podsync.
//!
//! Keeps a local catalog and a device catalog consistent:
//!
//! - [`identity::IdentityMap`] correlates local and device tracks across runs
//! - [`extended::ExtendedMetadata`] carries per-track side data for the local catalog
//! - [`checker`] repairs each catalog against the files on disk
//! - [`engine::SyncEngine`] merges play statistics back and mirrors the
//!   local playlists onto the device
//! - [`commands`] holds the operator-facing maintenance commands
//!
//! Confirmation questions go through the [`prompt::Prompt`] port so callers
//! decide how to ask.

pub mod checker;
pub mod commands;
pub mod engine;
pub mod error;
pub mod extended;
mod files;
pub mod identity;
pub mod matcher;
pub mod options;
pub mod plan;
pub mod playlists;
pub mod prompt;

pub use checker::{check_device, check_local, check_smart_playlists, CheckReport, RuleIssue};
pub use engine::{CopyOutcome, SyncEngine, SyncMode, SyncState, SyncSummary};
pub use error::{Result, SyncError};
pub use extended::{file_hash, ExtField, ExtendedMetadata, PersistReport};
pub use identity::{IdentityMap, RebuildReport};
pub use matcher::{find_tracks, FieldMask, MatchMode};
pub use options::{StatePaths, SyncOptions};
pub use plan::{CopyItem, SyncPlan};
pub use playlists::{copy_smart_playlists, CopyPlaylistsReport};
pub use prompt::{AssumeYes, Decision, Prompt, ScriptedPrompt};
