//! Operator confirmation port
//!
//! Commands decide what needs confirming and what each answer means; the
//! blocking console read lives in the CLI.

use crate::plan::SyncPlan;
use pod_core::Track;
use std::collections::VecDeque;
use std::path::Path;

/// Answer to a per-item repair question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply the repair to this item
    Yes,
    /// Leave this item alone
    No,
    /// Apply the repair to this and every remaining item
    All,
    /// Abort the whole run, discarding repairs
    Quit,
    /// Stop scanning, keeping repairs made so far
    Finish,
}

impl Decision {
    pub fn applies(self) -> bool {
        matches!(self, Self::Yes | Self::All)
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Prompt {
    /// Show the sync plan and ask whether to apply it
    fn confirm_plan(&mut self, plan: &SyncPlan) -> bool;

    /// A device track's file is gone; remove the track from the catalog?
    fn remove_missing_track(&mut self, track: &Track, location: &str) -> Decision;

    /// A file on the device has no catalog entry; delete it?
    fn delete_orphan_file(&mut self, path: &Path) -> Decision;

    /// Generic go/no-go question
    fn proceed(&mut self, message: &str) -> bool;
}

/// Prompt answering yes to everything, for batch runs
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm_plan(&mut self, _plan: &SyncPlan) -> bool {
        true
    }

    fn remove_missing_track(&mut self, _track: &Track, _location: &str) -> Decision {
        Decision::Yes
    }

    fn delete_orphan_file(&mut self, _path: &Path) -> Decision {
        Decision::Yes
    }

    fn proceed(&mut self, _message: &str) -> bool {
        true
    }
}

/// Prompt replaying a fixed sequence of decisions
///
/// Repair questions consume `decisions` in order and answer `No` once it is
/// exhausted; yes/no questions return `confirm`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    pub decisions: VecDeque<Decision>,
    pub confirm: bool,
    /// Every question asked, in order
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(decisions: impl IntoIterator<Item = Decision>, confirm: bool) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            confirm,
            asked: Vec::new(),
        }
    }

    fn next(&mut self) -> Decision {
        self.decisions.pop_front().unwrap_or(Decision::No)
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm_plan(&mut self, plan: &SyncPlan) -> bool {
        self.asked
            .push(format!("plan: {} copies", plan.copy_set.len()));
        self.confirm
    }

    fn remove_missing_track(&mut self, track: &Track, _location: &str) -> Decision {
        self.asked.push(format!("missing: {}", track.title));
        self.next()
    }

    fn delete_orphan_file(&mut self, path: &Path) -> Decision {
        self.asked.push(format!("orphan: {}", path.display()));
        self.next()
    }

    fn proceed(&mut self, message: &str) -> bool {
        self.asked.push(message.to_string());
        self.confirm
    }
}
