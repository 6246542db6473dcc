//! Core skill types and logic

pub mod features;
pub mod origin;
pub mod registry;
pub mod skill;
pub mod tags;

pub use features::{FrontMatter, apply_document_features, infer_tags, parse_front_matter};
pub use origin::{Origin, parse_origin};
pub use registry::Registry;
pub use skill::{PRIMARY_DOCUMENT, SkillRecord};
pub use tags::{DEFAULT_MAX_TAGS, normalize_tags};
