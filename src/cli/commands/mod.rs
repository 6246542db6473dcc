//! CLI command implementations
//!
//! Each subcommand has its own module with an Args struct and a `run()`.

use clap::Subcommand;

pub mod index;
pub mod list;
pub mod sync;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Sync(args) => sync::run(ctx, args),
        Commands::Index(args) => index::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync skills from the catalog into the local store
    Sync(sync::SyncArgs),

    /// Rebuild index.json from stored skills
    Index(index::IndexArgs),

    /// List locally stored skills
    List(list::ListArgs),
}
