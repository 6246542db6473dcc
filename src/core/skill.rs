//! Skill record: metadata plus content for one synced skill.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::origin::{Origin, parse_origin};

/// Conventional file name of a skill's primary document.
pub const PRIMARY_DOCUMENT: &str = "SKILL.md";

/// One skill's metadata and content.
///
/// `name` is the store key. `content` and `files` travel with the record in
/// memory but are persisted separately from the JSON metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Name the skill was published under before a keep-both rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip)]
    pub content: String,
    #[serde(skip)]
    pub files: BTreeMap<String, String>,
}

impl SkillRecord {
    /// Create a record whose owner/repo are derived from `source_url`.
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let Origin { owner, repo } = parse_origin(&source_url);
        Self {
            name: name.into(),
            owner,
            repo,
            source_url,
            ..Self::default()
        }
    }

    /// Owner of the record's origin, derived from `source_url` when unset.
    #[must_use]
    pub fn origin_owner(&self) -> String {
        if self.owner.is_empty() {
            parse_origin(&self.source_url).owner
        } else {
            self.owner.clone()
        }
    }

    /// Repository of the record's origin, derived from `source_url` when unset.
    #[must_use]
    pub fn origin_repo(&self) -> String {
        if self.repo.is_empty() {
            parse_origin(&self.source_url).repo
        } else {
            self.repo.clone()
        }
    }

    /// `owner/repo` label used in diagnostics.
    #[must_use]
    pub fn origin_label(&self) -> String {
        let origin = Origin {
            owner: self.origin_owner(),
            repo: self.origin_repo(),
        };
        if origin.is_empty() {
            "unknown origin".to_string()
        } else {
            format!("{}/{}", origin.owner, origin.repo)
        }
    }

    /// Copy of this record stored under `new_name`, remembering the old name.
    #[must_use]
    pub fn renamed(&self, new_name: &str) -> Self {
        let mut record = self.clone();
        record.original_name = Some(self.name.clone());
        record.name = new_name.to_string();
        record
    }
}
