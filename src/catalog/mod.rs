//! Remote skill catalog.

pub mod client;

pub use client::{CatalogClient, CatalogSkill, SkillCatalog, SortBy};
