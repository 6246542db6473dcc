//! skillsync sync - Pull skills from the catalog into the local store

use std::io::IsTerminal;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::AppContext;
use crate::catalog::{CatalogClient, SortBy};
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_partial};
use crate::error::{Result, SyncError};
use crate::fetch::ContentFetcher;
use crate::storage::SkillStore;
use crate::sync::{
    ConflictChoice, ConflictResolver, DecisionProvider, InteractivePrompt, NonInteractive,
    SyncEngine, SyncOptions, SyncReport, SyncTarget,
};

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Skill names to sync
    #[arg(value_name = "NAME", conflicts_with = "top")]
    pub names: Vec<String>,

    /// Sync the top N catalog entries instead of named skills
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Catalog results to consider per name lookup
    #[arg(long)]
    pub limit: Option<usize>,

    /// Catalog sort order
    #[arg(long, value_enum)]
    pub sort: Option<SortBy>,

    /// Use the catalog's semantic search for name lookups
    #[arg(long)]
    pub semantic: bool,

    /// Rewrite skills even when their metadata is unchanged
    #[arg(long)]
    pub force: bool,

    /// Never prompt; apply the conflict strategy and pick the top origin
    #[arg(long)]
    pub non_interactive: bool,

    /// Conflict strategy when not prompting
    #[arg(long, value_enum)]
    pub strategy: Option<ConflictChoice>,
}

impl SyncArgs {
    fn target(&self) -> Result<SyncTarget> {
        match (self.top, self.names.is_empty()) {
            (Some(0), _) => Err(SyncError::Config("--top must be at least 1".to_string())),
            (Some(count), _) => Ok(SyncTarget::Top(count)),
            (None, false) => Ok(SyncTarget::Names(self.names.clone())),
            (None, true) => Err(SyncError::Config(
                "name at least one skill or pass --top N".to_string(),
            )),
        }
    }
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let target = args.target()?;
    let api_key = ctx.config.require_api_key()?;

    let catalog = CatalogClient::new(&ctx.config.catalog, api_key)?;
    let fetcher = ContentFetcher::new(&ctx.config.github)?;
    let store = SkillStore::open(&ctx.root)?;

    let interactive = !(args.non_interactive
        || ctx.config.sync.non_interactive
        || ctx.robot_mode
        || !std::io::stdin().is_terminal());
    let strategy = args.strategy.unwrap_or(ctx.config.sync.default_strategy);
    debug!(interactive, strategy = %strategy, "decision provider selected");
    let provider: Box<dyn DecisionProvider> = if interactive {
        Box::new(InteractivePrompt::stdio())
    } else {
        Box::new(NonInteractive::new(strategy))
    };

    let mut options = SyncOptions::from_config(&ctx.config.sync);
    options.semantic = args.semantic;
    options.force = args.force;
    if let Some(limit) = args.limit {
        options.limit = limit.max(1);
    }
    if let Some(sort) = args.sort {
        options.sort_by = sort;
    }

    let mut engine = SyncEngine::new(
        &catalog,
        &fetcher,
        &store,
        ConflictResolver::new(provider),
        options,
    );
    if !interactive && !ctx.robot_mode && !ctx.quiet {
        engine = engine.with_progress(spinner());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(engine.run(target))?;

    if ctx.robot_mode {
        emit_robot(&robot_partial(
            &report,
            report.synced,
            report.failed,
            report.warnings.clone(),
        ))
    } else {
        emit_human(&render(&report));
        Ok(())
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} syncing {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn render(report: &SyncReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Sync Report")
        .kv("Synced", &report.synced.to_string())
        .kv("Created", &report.created.to_string())
        .kv("Updated", &report.updated.to_string())
        .kv("Skipped", &report.skipped.to_string())
        .kv("Conflicts", &report.conflicts.to_string())
        .kv("Failed", &report.failed.to_string());

    if !report.resolution.renames.is_empty() {
        layout.section("Renamed");
        for rename in &report.resolution.renames {
            layout.bullet(&format!("{} -> {}", rename.from, rename.to.cyan()));
        }
    }
    if !report.failures.is_empty() {
        layout.section("Failures");
        for failure in &report.failures {
            layout.bullet(&format!("{}: {}", failure.name.bold(), failure.error.red()));
        }
    }
    if !report.warnings.is_empty() {
        layout.section("Warnings");
        for warning in &report.warnings {
            layout.bullet(&warning.yellow().to_string());
        }
    }
    layout
}
