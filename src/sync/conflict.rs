//! Conflict resolution for same-name skills from different origins.
//!
//! A conflict is two records sharing a `name` whose owners differ. Each
//! detected conflict is queued as a [`ConflictContext`] and resolved exactly
//! once, in FIFO order, against a shared [`Registry`]. Registry mutations made
//! while resolving one context are visible to the next, which is what lets a
//! keep-both rename detect that its new name is already taken.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::decision::DecisionProvider;
use crate::core::{Registry, SkillRecord};
use crate::error::SyncError;

/// Operator choice for one conflict.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictChoice {
    /// Keep the local record, drop the incoming one
    #[default]
    Skip,
    /// Overwrite the local record with the incoming one
    Replace,
    /// Keep the local record and store the incoming one under `<owner>-<name>`
    KeepBoth,
}

impl ConflictChoice {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Replace => "replace",
            Self::KeepBoth => "keep-both",
        }
    }
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictChoice {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "replace" => Ok(Self::Replace),
            "keep-both" | "keep_both" | "keepboth" | "both" => Ok(Self::KeepBoth),
            other => Err(SyncError::Config(format!(
                "invalid conflict strategy {other} (expected skip|replace|keep-both)"
            ))),
        }
    }
}

/// One detected collision awaiting (or past) resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictContext {
    pub existing: SkillRecord,
    pub incoming: SkillRecord,
    pub resolution: Option<ConflictChoice>,
}

impl ConflictContext {
    #[must_use]
    pub const fn new(existing: SkillRecord, incoming: SkillRecord) -> Self {
        Self {
            existing,
            incoming,
            resolution: None,
        }
    }
}

/// Final disposition of one conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ResolutionResult {
    Skip,
    /// `target` was overwritten. `warning` and `original_name` are set when
    /// a keep-both rename landed on an occupied name.
    #[serde(rename_all = "camelCase")]
    Replace {
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        original_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Rename {
        new_name: String,
        original_name: String,
    },
}

impl ResolutionResult {
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Replace { .. } => "replace",
            Self::Rename { .. } => "rename",
        }
    }

    /// Registry name written by this resolution, if any.
    #[must_use]
    pub fn written_name(&self) -> Option<&str> {
        match self {
            Self::Skip => None,
            Self::Replace { target, .. } => Some(target),
            Self::Rename { new_name, .. } => Some(new_name),
        }
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Replace {
                warning: Some(warning),
                ..
            } => Some(warning),
            _ => None,
        }
    }
}

/// A conflict together with its resolution, kept for reporting.
#[derive(Debug, Clone)]
pub struct ResolvedConflict {
    pub context: ConflictContext,
    pub result: ResolutionResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameMapping {
    pub from: String,
    pub to: String,
}

/// Aggregate view over every resolved conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub skipped: usize,
    pub replaced: usize,
    pub renamed: usize,
    pub renames: Vec<RenameMapping>,
    pub warnings: Vec<String>,
}

impl ResolutionSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.skipped + self.replaced + self.renamed
    }
}

/// True iff both records share a name and their derived owners differ.
#[must_use]
pub fn is_conflict(existing: Option<&SkillRecord>, incoming: &SkillRecord) -> bool {
    existing.is_some_and(|existing| {
        existing.name == incoming.name && existing.origin_owner() != incoming.origin_owner()
    })
}

/// Deterministic keep-both name: `<owner>-<name>`.
///
/// Records with no derivable owner use `unknown` as the owner part.
#[must_use]
pub fn renamed_identifier(incoming: &SkillRecord) -> String {
    let owner = incoming.origin_owner();
    let owner = if owner.is_empty() { "unknown" } else { owner.as_str() };
    format!("{owner}-{}", incoming.name)
}

/// FIFO queue of conflicts plus the history of resolved ones.
pub struct ConflictResolver {
    provider: Box<dyn DecisionProvider>,
    queue: VecDeque<ConflictContext>,
    history: Vec<ResolvedConflict>,
}

impl ConflictResolver {
    #[must_use]
    pub fn new(provider: Box<dyn DecisionProvider>) -> Self {
        Self {
            provider,
            queue: VecDeque::new(),
            history: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, existing: SkillRecord, incoming: SkillRecord) {
        info!(
            skill = %incoming.name,
            existing = %existing.origin_label(),
            incoming = %incoming.origin_label(),
            "conflict queued"
        );
        self.queue.push_back(ConflictContext::new(existing, incoming));
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn history(&self) -> &[ResolvedConflict] {
        &self.history
    }

    /// Decision provider, shared with origin selection.
    pub fn provider(&mut self) -> &mut dyn DecisionProvider {
        self.provider.as_mut()
    }

    /// Drain the queue in enqueue order, returning one result per context.
    pub fn resolve_all(&mut self, registry: &mut Registry) -> Vec<ResolutionResult> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(context) = self.queue.pop_front() {
            results.push(self.resolve(context, registry));
        }
        results
    }

    /// Resolve one context and apply its outcome to `registry`.
    pub fn resolve(
        &mut self,
        mut context: ConflictContext,
        registry: &mut Registry,
    ) -> ResolutionResult {
        let choice = self.provider.decide(&context);
        context.resolution = Some(choice);
        let result = apply_choice(choice, &context, registry);

        match &result {
            ResolutionResult::Skip => info!(skill = %context.incoming.name, "conflict skipped"),
            ResolutionResult::Replace {
                target,
                warning: None,
                ..
            } => info!(skill = %target, "conflict resolved by replace"),
            ResolutionResult::Replace {
                warning: Some(warning),
                ..
            } => warn!("{warning}"),
            ResolutionResult::Rename {
                new_name,
                original_name,
            } => info!(from = %original_name, to = %new_name, "conflict resolved by rename"),
        }

        self.history.push(ResolvedConflict {
            context,
            result: result.clone(),
        });
        result
    }

    #[must_use]
    pub fn summary(&self) -> ResolutionSummary {
        let mut summary = ResolutionSummary::default();
        for resolved in &self.history {
            match &resolved.result {
                ResolutionResult::Skip => summary.skipped += 1,
                ResolutionResult::Replace {
                    target,
                    warning,
                    original_name,
                } => {
                    summary.replaced += 1;
                    if let Some(original) = original_name {
                        summary.renames.push(RenameMapping {
                            from: original.clone(),
                            to: target.clone(),
                        });
                    }
                    if let Some(warning) = warning {
                        summary.warnings.push(warning.clone());
                    }
                }
                ResolutionResult::Rename {
                    new_name,
                    original_name,
                } => {
                    summary.renamed += 1;
                    summary.renames.push(RenameMapping {
                        from: original_name.clone(),
                        to: new_name.clone(),
                    });
                }
            }
        }
        summary
    }
}

fn apply_choice(
    choice: ConflictChoice,
    context: &ConflictContext,
    registry: &mut Registry,
) -> ResolutionResult {
    let ConflictContext {
        existing, incoming, ..
    } = context;

    match choice {
        ConflictChoice::Skip => ResolutionResult::Skip,
        ConflictChoice::Replace => {
            registry.replace(&existing.name, incoming.clone());
            ResolutionResult::Replace {
                target: existing.name.clone(),
                warning: None,
                original_name: None,
            }
        }
        ConflictChoice::KeepBoth => {
            let new_name = renamed_identifier(incoming);
            let renamed = incoming.renamed(&new_name);

            if let Some(occupant) = registry.get(&new_name) {
                let warning = format!(
                    "'{new_name}' already exists (from {}); replaced it with '{}' from {}",
                    occupant.origin_label(),
                    incoming.name,
                    incoming.origin_label(),
                );
                registry.replace(&new_name, renamed);
                ResolutionResult::Replace {
                    target: new_name,
                    warning: Some(warning),
                    original_name: Some(incoming.name.clone()),
                }
            } else {
                registry.upsert(renamed);
                ResolutionResult::Rename {
                    new_name,
                    original_name: incoming.name.clone(),
                }
            }
        }
    }
}
