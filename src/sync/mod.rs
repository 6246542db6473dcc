//! Skill synchronisation: update detection, conflicts and the sync driver.

pub mod conflict;
pub mod decision;
pub mod detector;
pub mod engine;
pub mod partial;
pub mod report;

pub use conflict::{
    ConflictChoice, ConflictContext, ConflictResolver, ResolutionResult, ResolutionSummary,
    is_conflict,
};
pub use decision::{DecisionProvider, InteractivePrompt, NonInteractive};
pub use detector::{UpdateCheck, check_needs_update, compare_records};
pub use engine::{SyncEngine, SyncOptions, SyncTarget};
pub use report::SyncReport;
