//! Interactive answers to the sync engine's questions

use dialoguer::{Confirm, Select};
use pod_core::Track;
use pod_sync::{Decision, Prompt, SyncPlan};
use std::path::Path;
use tracing::warn;

const BYTES_PER_MB: u64 = 1_048_576;

/// Repair answers in menu order; the default is "no"
const DECISIONS: [(&str, Decision); 5] = [
    ("yes", Decision::Yes),
    ("no", Decision::No),
    ("all", Decision::All),
    ("quit", Decision::Quit),
    ("finish", Decision::Finish),
];

/// Terminal prompt
///
/// With `force` every yes/no question is answered yes without asking;
/// repair questions are still asked. A failed terminal read answers "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt {
    force: bool,
}

impl ConsolePrompt {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    fn yes_no(&self, question: &str) -> bool {
        if self.force {
            return true;
        }
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                warn!("Could not read answer: {}", e);
                false
            })
    }

    fn decide(question: &str) -> Decision {
        let labels: Vec<&str> = DECISIONS.iter().map(|(label, _)| *label).collect();
        match Select::new()
            .with_prompt(question)
            .items(&labels)
            .default(1)
            .interact()
        {
            Ok(index) => decision_at(index),
            Err(e) => {
                warn!("Could not read answer: {}", e);
                Decision::No
            }
        }
    }
}

impl Prompt for ConsolePrompt {
    fn confirm_plan(&mut self, plan: &SyncPlan) -> bool {
        for line in plan_summary(plan) {
            println!("{line}");
        }
        plan.is_empty() || self.yes_no("Proceed with sync?")
    }

    fn remove_missing_track(&mut self, track: &Track, location: &str) -> Decision {
        println!(
            "Missing file for {} ({}): {}",
            track.title,
            track.artist.as_deref().unwrap_or_default(),
            location
        );
        Self::decide("Remove track from catalog?")
    }

    fn delete_orphan_file(&mut self, path: &Path) -> Decision {
        println!("File not in catalog: {}", path.display());
        Self::decide("Delete file?")
    }

    fn proceed(&mut self, message: &str) -> bool {
        self.yes_no(message)
    }
}

fn decision_at(index: usize) -> Decision {
    DECISIONS.get(index).map_or(Decision::No, |(_, d)| *d)
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// What a sync is about to do
pub fn plan_summary(plan: &SyncPlan) -> Vec<String> {
    let mut lines = vec![format!(
        "{} tracks to copy ({:.1} MB), {} tracks to delete ({:.1} MB)",
        plan.pending.len(),
        megabytes(plan.copy_bytes),
        plan.delete_set.len(),
        megabytes(plan.stale_bytes),
    )];
    if let Some(budget) = plan.byte_budget {
        lines.push(format!(
            "Device has {:.1} MB free, sync needs {:.1} MB",
            megabytes(budget),
            megabytes(plan.copy_bytes)
        ));
    }
    if plan.insufficient_space {
        lines.push("Warning: not everything will fit on the device".to_string());
    }
    lines
}
