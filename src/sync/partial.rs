//! Detection of skills whose auxiliary files did not come through.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static MARKDOWN_LINK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+[^)]*)?\)").ok()
});

/// Subfolders skills conventionally ship alongside `SKILL.md`.
const CONVENTIONAL_DIRS: &[&str] = &["references", "scripts", "assets", "templates", "resources"];

/// Local link targets in `content` that suggest auxiliary files, returned
/// only when `files` is empty.
#[must_use]
pub fn missing_references(content: &str, files: &BTreeMap<String, String>) -> Vec<String> {
    let Some(link) = MARKDOWN_LINK.as_ref() else {
        return Vec::new();
    };
    if !files.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<String> = Vec::new();
    for capture in link.captures_iter(content) {
        let target = &capture[1];
        if let Some(path) = local_reference(target)
            && !found.iter().any(|existing| existing == path)
        {
            found.push(path.to_string());
        }
    }
    found
}

fn local_reference(target: &str) -> Option<&str> {
    if target.starts_with('#') || target.contains("://") || target.starts_with("mailto:") {
        return None;
    }
    let path = target.split(['#', '?']).next().unwrap_or(target);
    let path = path.trim_start_matches("./");
    if path.is_empty() {
        return None;
    }

    let in_conventional_dir = CONVENTIONAL_DIRS
        .iter()
        .any(|dir| path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/')));
    let is_markdown = path.to_ascii_lowercase().ends_with(".md");
    (in_conventional_dir || is_markdown).then_some(path)
}
