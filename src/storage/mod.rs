//! Local persistence for synced skills.

pub mod store;

pub use store::{IndexMeta, SkillIndex, SkillStore, safe_relative_path};
