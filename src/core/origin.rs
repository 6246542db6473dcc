//! Origin identification: repository URL → owner/repo.
//!
//! Parsing never fails. Unrecognised input yields empty fields so callers
//! (tag normalisation, rename computation) keep working.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Canonical `host/owner/repo` shape, with optional scheme or ssh user.
static HOST_OWNER_REPO: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z][A-Za-z0-9+.-]*://)?(?:[^@/\s]+@)?[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+[/:]([^/\s:]+)/([^/\s?#]+)",
    )
    .ok()
});

/// The (owner, repository) pair a skill was sourced from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub owner: String,
    pub repo: String,
}

impl Origin {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty() && self.repo.is_empty()
    }
}

/// Parse a repository URL into its owner and repository names.
#[must_use]
pub fn parse_origin(url: &str) -> Origin {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Origin::default();
    }

    if let Ok(parsed) = Url::parse(trimmed)
        && parsed.has_host()
    {
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() >= 2 {
            return Origin {
                owner: segments[0].to_string(),
                repo: strip_git_suffix(segments[1]),
            };
        }
    }

    HOST_OWNER_REPO
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .map(|caps| Origin {
            owner: caps[1].to_string(),
            repo: strip_git_suffix(&caps[2]),
        })
        .unwrap_or_default()
}

fn strip_git_suffix(repo: &str) -> String {
    repo.strip_suffix(".git").unwrap_or(repo).to_string()
}
