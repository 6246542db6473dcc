//! Tag normalisation.

use std::collections::HashSet;

/// Default cap on the number of tags kept per skill.
pub const DEFAULT_MAX_TAGS: usize = 10;

/// Normalise a tag list for storage.
///
/// Tags are trimmed and deduplicated case-insensitively (first spelling
/// wins). A non-empty `owner` is moved to the front, replacing any existing
/// copy of it. The result is capped at `max` entries. Applying the function
/// to its own output with the same owner is a no-op.
#[must_use]
pub fn normalize_tags(tags: &[String], owner: &str, max: usize) -> Vec<String> {
    let owner = owner.trim();
    let owner_key = owner.to_lowercase();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(tags.len() + 1);

    if !owner.is_empty() {
        seen.insert(owner_key);
        out.push(owner.to_string());
    }

    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            out.push(tag.to_string());
        }
    }

    out.truncate(max);
    out
}
