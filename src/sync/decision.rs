//! Operator decisions: conflict choices and origin selection.

use std::collections::VecDeque;
use std::io::{BufRead, Stderr, StdinLock, Write};

use colored::Colorize;
use tracing::warn;

use super::conflict::{ConflictChoice, ConflictContext};
use crate::catalog::CatalogSkill;
use crate::core::SkillRecord;

/// Source of decisions, fixed for the lifetime of a run.
pub trait DecisionProvider {
    /// Choose how to resolve one conflict.
    fn decide(&mut self, context: &ConflictContext) -> ConflictChoice;

    /// Pick one of several catalog entries sharing `name`.
    ///
    /// `candidates` is ordered by stars, highest first, and is never empty.
    fn choose_origin(&mut self, name: &str, candidates: &[CatalogSkill]) -> usize;
}

/// Applies one configured strategy without asking.
#[derive(Debug, Clone, Copy)]
pub struct NonInteractive {
    strategy: ConflictChoice,
}

impl NonInteractive {
    #[must_use]
    pub const fn new(strategy: ConflictChoice) -> Self {
        Self { strategy }
    }
}

impl DecisionProvider for NonInteractive {
    fn decide(&mut self, _context: &ConflictContext) -> ConflictChoice {
        self.strategy
    }

    fn choose_origin(&mut self, _name: &str, _candidates: &[CatalogSkill]) -> usize {
        0
    }
}

/// Plays back a fixed sequence of choices, then falls back to skip.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    choices: VecDeque<ConflictChoice>,
    origins: VecDeque<usize>,
}

impl ScriptedDecisions {
    #[must_use]
    pub fn new(choices: Vec<ConflictChoice>) -> Self {
        Self {
            choices: choices.into(),
            origins: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn with_origins(mut self, origins: Vec<usize>) -> Self {
        self.origins = origins.into();
        self
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn decide(&mut self, _context: &ConflictContext) -> ConflictChoice {
        self.choices.pop_front().unwrap_or_default()
    }

    fn choose_origin(&mut self, _name: &str, candidates: &[CatalogSkill]) -> usize {
        self.origins
            .pop_front()
            .filter(|index| *index < candidates.len())
            .unwrap_or(0)
    }
}

/// Prompts an operator on a terminal.
///
/// Each prompt reads a single line. Anything unrecognised falls back to
/// skip (or the first candidate) with a warning; there is no re-prompt.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl InteractivePrompt<StdinLock<'static>, Stderr> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    fn describe(&mut self, label: &str, record: &SkillRecord) {
        let updated = record
            .updated_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());
        let version = if record.version.is_empty() {
            "-"
        } else {
            record.version.as_str()
        };
        let _ = writeln!(
            self.output,
            "  {label:<9} {}  ({} stars, version {version}, updated {updated})",
            record.origin_label().bold(),
            record.stars,
        );
    }
}

/// Parse a conflict answer typed at the prompt.
#[must_use]
pub fn parse_choice(input: &str) -> Option<ConflictChoice> {
    match input.trim().to_lowercase().as_str() {
        "s" | "skip" => Some(ConflictChoice::Skip),
        "r" | "replace" => Some(ConflictChoice::Replace),
        "k" | "keep" | "keep-both" | "b" | "both" => Some(ConflictChoice::KeepBoth),
        _ => None,
    }
}

impl<R: BufRead, W: Write> DecisionProvider for InteractivePrompt<R, W> {
    fn decide(&mut self, context: &ConflictContext) -> ConflictChoice {
        let _ = writeln!(
            self.output,
            "\n{} '{}' already exists from a different origin",
            "Conflict:".yellow().bold(),
            context.incoming.name
        );
        self.describe("existing", &context.existing);
        self.describe("incoming", &context.incoming);
        let _ = write!(self.output, "  [s]kip, [r]eplace, [k]eep both? ");
        let _ = self.output.flush();

        let answer = self.read_line().unwrap_or_default();
        parse_choice(&answer).unwrap_or_else(|| {
            warn!(skill = %context.incoming.name, answer = %answer, "unrecognised answer, skipping");
            ConflictChoice::Skip
        })
    }

    fn choose_origin(&mut self, name: &str, candidates: &[CatalogSkill]) -> usize {
        let _ = writeln!(
            self.output,
            "\n{} '{name}' is published by {} sources:",
            "Choose:".cyan().bold(),
            candidates.len()
        );
        for (index, candidate) in candidates.iter().enumerate() {
            let _ = writeln!(
                self.output,
                "  {}) {}  ({} stars)",
                index + 1,
                candidate.repository,
                candidate.stars
            );
        }
        let _ = write!(self.output, "  number [1]: ");
        let _ = self.output.flush();

        let answer = self.read_line().unwrap_or_default();
        if answer.is_empty() {
            return 0;
        }
        match answer.parse::<usize>() {
            Ok(choice) if (1..=candidates.len()).contains(&choice) => choice - 1,
            _ => {
                warn!(skill = %name, answer = %answer, "invalid selection, using the top result");
                0
            }
        }
    }
}
