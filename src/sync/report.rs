//! Outcome of a sync run.

use serde::Serialize;

use super::conflict::ResolutionSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub name: String,
    pub reason: String,
}

/// Counters plus per-item detail, serialised as-is for `--robot`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records written, by the main pass or by conflict resolution.
    pub synced: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub conflicts: usize,
    pub failures: Vec<ItemFailure>,
    pub skipped_items: Vec<SkippedItem>,
    pub warnings: Vec<String>,
    pub resolution: ResolutionSummary,
}

impl SyncReport {
    pub fn record_created(&mut self) {
        self.created += 1;
        self.synced += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
        self.synced += 1;
    }

    pub fn record_skipped(&mut self, name: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.skipped_items.push(SkippedItem {
            name: name.to_string(),
            reason: reason.into(),
        });
    }

    pub fn record_failure(&mut self, name: &str, error: impl ToString) {
        self.failed += 1;
        self.failures.push(ItemFailure {
            name: name.to_string(),
            error: error.to_string(),
        });
    }

    pub fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
