//! E2E test suite entry point.

#[path = "../common/mod.rs"]
mod common;
mod conflict_workflow;
mod sync_workflow;
