//! skillsync index - Rebuild index.json from stored skill metadata

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::storage::SkillStore;

#[derive(Args, Debug, Default)]
pub struct IndexArgs {}

#[derive(Serialize)]
struct IndexSummary {
    path: String,
    total: usize,
}

pub fn run(ctx: &AppContext, _args: &IndexArgs) -> Result<()> {
    let store = SkillStore::open(&ctx.root)?;
    let index = store.rebuild_index()?;
    let summary = IndexSummary {
        path: store.index_path().display().to_string(),
        total: index.meta.total,
    };
    debug!(total = summary.total, path = %summary.path, "index written");

    if ctx.robot_mode {
        return emit_robot(&robot_ok(summary));
    }
    let mut layout = HumanLayout::new();
    layout
        .title("Index rebuilt")
        .kv("Skills", &summary.total.to_string())
        .kv("Path", &summary.path);
    emit_human(&layout);
    Ok(())
}
