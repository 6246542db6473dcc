//! skillsync: sync agent skills from a public catalog into a local store.
//!
//! Skills are discovered through a catalog API, their content is fetched
//! from GitHub, and the result is persisted as JSON metadata plus content
//! files. Same-name skills from different owners are resolved through a
//! conflict queue; unchanged skills are detected and skipped.

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod storage;
pub mod sync;
pub mod test_utils;

pub use error::{Result, SyncError};
