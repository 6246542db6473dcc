//! Feature extraction from skill documents.
//!
//! Reads YAML front matter from a primary document and infers tags by
//! keyword matching over the skill's name and description.

use serde::Deserialize;
use tracing::warn;

use super::skill::SkillRecord;

/// Keyword → tag table used for tag inference.
const KEYWORD_TAGS: &[(&str, &str)] = &[
    ("git", "git"),
    ("github", "github"),
    ("pull request", "git"),
    ("commit", "git"),
    ("test", "testing"),
    ("pytest", "testing"),
    ("docker", "docker"),
    ("kubernetes", "kubernetes"),
    ("k8s", "kubernetes"),
    ("react", "frontend"),
    ("css", "frontend"),
    ("api", "api"),
    ("sql", "database"),
    ("postgres", "database"),
    ("database", "database"),
    ("docs", "documentation"),
    ("documentation", "documentation"),
    ("readme", "documentation"),
    ("security", "security"),
    ("pdf", "documents"),
    ("excel", "documents"),
    ("python", "python"),
    ("rust", "rust"),
    ("typescript", "typescript"),
    ("deploy", "devops"),
    ("ci", "devops"),
];

/// Fields a primary document may declare in its front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Split `content` into parsed front matter (if any) and the remaining body.
///
/// Malformed front matter is logged and treated as absent.
#[must_use]
pub fn parse_front_matter(content: &str) -> (Option<FrontMatter>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let Some(end) = rest.find("\n---") else {
        return (None, content);
    };
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);

    match serde_yaml::from_str::<FrontMatter>(yaml) {
        Ok(front) => (Some(front), body),
        Err(err) => {
            warn!("ignoring malformed front matter: {err}");
            (None, body)
        }
    }
}

/// Infer tags from free text by keyword matching. Output is deduplicated
/// and ordered by first match in the keyword table.
#[must_use]
pub fn infer_tags(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != ' ')
        .map(str::to_string)
        .collect();
    let haystack = format!(" {} ", words.join(" ").replace('-', " "));

    let mut tags: Vec<String> = Vec::new();
    for (keyword, tag) in KEYWORD_TAGS {
        let needle_word = format!(" {keyword} ");
        let needle_prefix = format!(" {keyword}");
        let hit = if keyword.len() <= 3 {
            haystack.contains(&needle_word)
        } else {
            haystack.contains(&needle_prefix)
        };
        if hit && !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
    tags
}

/// Fill gaps in `record` from the front matter of its primary document and
/// append inferred tags. Catalog-supplied values always win.
pub fn apply_document_features(record: &mut SkillRecord) {
    let (front, _) = parse_front_matter(&record.content);
    if let Some(front) = front {
        if record.description.is_empty()
            && let Some(description) = front.description
        {
            record.description = description;
        }
        if record.version.is_empty()
            && let Some(version) = front.version
        {
            record.version = version;
        }
        if record.author.is_empty()
            && let Some(author) = front.author
        {
            record.author = author;
        }
        record.tags.extend(front.tags);
    }

    let text = format!("{} {}", record.name, record.description);
    record.tags.extend(infer_tags(&text));
}
