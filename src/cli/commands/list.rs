//! skillsync list - List locally stored skills

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::core::SkillRecord;
use crate::error::Result;
use crate::storage::SkillStore;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show skills carrying any of these tags
    #[arg(long, short)]
    pub tags: Vec<String>,

    /// Only show skills from this owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Maximum number of skills to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct SkillEntry<'a> {
    name: &'a str,
    origin: String,
    version: &'a str,
    stars: u64,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    original_name: Option<&'a str>,
}

impl<'a> From<&'a SkillRecord> for SkillEntry<'a> {
    fn from(record: &'a SkillRecord) -> Self {
        Self {
            name: &record.name,
            origin: record.origin_label(),
            version: &record.version,
            stars: record.stars,
            tags: &record.tags,
            original_name: record.original_name.as_deref(),
        }
    }
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let store = SkillStore::open(&ctx.root)?;
    let skills = filter(store.load_all()?, args);
    debug!(count = skills.len(), filters = ?args.tags, "listing skills");

    let entries: Vec<SkillEntry<'_>> = skills.iter().map(SkillEntry::from).collect();
    if ctx.robot_mode {
        return emit_robot(&robot_ok(entries));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("{} skill(s)", entries.len()));
    for entry in &entries {
        let mut line = format!(
            "{}  {}  {} stars",
            entry.name.bold(),
            entry.origin.dimmed(),
            entry.stars
        );
        if !entry.version.is_empty() {
            line.push_str(&format!("  v{}", entry.version));
        }
        if let Some(original) = entry.original_name {
            line.push_str(&format!("  (was {original})"));
        }
        if !entry.tags.is_empty() {
            line.push_str(&format!("  [{}]", entry.tags.join(", ")));
        }
        layout.bullet(&line);
    }
    emit_human(&layout);
    Ok(())
}

fn filter(skills: Vec<SkillRecord>, args: &ListArgs) -> Vec<SkillRecord> {
    skills
        .into_iter()
        .filter(|skill| {
            args.tags.is_empty()
                || args
                    .tags
                    .iter()
                    .any(|tag| skill.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        })
        .filter(|skill| {
            args.owner
                .as_deref()
                .is_none_or(|owner| skill.origin_owner().eq_ignore_ascii_case(owner))
        })
        .take(args.limit)
        .collect()
}
