//! Incremental update detection.
//!
//! Only tracked metadata decides whether a stored skill is rewritten. Stars,
//! timestamps and content are deliberately ignored here.

use serde::Serialize;

use crate::core::SkillRecord;
use crate::error::Result;
use crate::storage::SkillStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub needs_update: bool,
    pub reason: String,
}

impl UpdateCheck {
    fn new_skill() -> Self {
        Self {
            needs_update: true,
            reason: "new".to_string(),
        }
    }

    fn unchanged() -> Self {
        Self {
            needs_update: false,
            reason: "unchanged".to_string(),
        }
    }

    fn changed(field: &str, old: &str, new: &str) -> Self {
        Self {
            needs_update: true,
            reason: format!("{field} changed: {old:?} -> {new:?}"),
        }
    }
}

/// Compare `incoming` with the persisted record under `incoming.name`.
pub fn check_needs_update(store: &SkillStore, incoming: &SkillRecord) -> Result<UpdateCheck> {
    let existing = store.load(&incoming.name)?;
    Ok(compare_records(existing.as_ref(), incoming))
}

/// Field-wise comparison; the first differing field names the reason.
#[must_use]
pub fn compare_records(existing: Option<&SkillRecord>, incoming: &SkillRecord) -> UpdateCheck {
    let Some(existing) = existing else {
        return UpdateCheck::new_skill();
    };

    let fields = [
        ("description", existing.description.as_str(), incoming.description.as_str()),
        ("version", existing.version.as_str(), incoming.version.as_str()),
        ("author", existing.author.as_str(), incoming.author.as_str()),
        ("sourceUrl", existing.source_url.as_str(), incoming.source_url.as_str()),
    ];
    for (field, old, new) in fields {
        if old != new {
            return UpdateCheck::changed(field, old, new);
        }
    }

    let old_tags = tag_signature(&existing.tags);
    let new_tags = tag_signature(&incoming.tags);
    if old_tags != new_tags {
        return UpdateCheck::changed("tags", &old_tags, &new_tags);
    }

    UpdateCheck::unchanged()
}

/// Order-insensitive tag fingerprint.
fn tag_signature(tags: &[String]) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(",")
}
