//! GitHub source locations for skill content.

use url::Url;

use crate::core::PRIMARY_DOCUMENT;

/// Branches tried when a location names none, in order.
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

/// A resolved location of a skill inside a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    /// Directory holding the primary document, relative to the repo root.
    pub subpath: String,
}

impl SourceLocation {
    /// Parse `https://github.com/<owner>/<repo>[/tree|blob/<branch>/<path>]`.
    ///
    /// The scheme may be omitted. A trailing primary document name is
    /// stripped so the location always names a directory.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return None;
        }
        let parsed = Url::parse(url)
            .ok()
            .filter(Url::has_host)
            .or_else(|| Url::parse(&format!("https://{url}")).ok())?;

        let segments: Vec<&str> = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .collect();
        if segments.len() < 2 {
            return None;
        }

        let owner = segments[0].to_string();
        let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]).to_string();

        let (branch, rest) = match segments.get(2) {
            Some(&("tree" | "blob")) if segments.len() >= 4 => {
                (Some(segments[3].to_string()), &segments[4..])
            }
            Some(&("tree" | "blob")) => (None, &segments[3..]),
            _ => (None, &segments[2..]),
        };

        let mut path: Vec<&str> = rest.to_vec();
        if path
            .last()
            .is_some_and(|last| last.eq_ignore_ascii_case(PRIMARY_DOCUMENT))
        {
            path.pop();
        }

        Some(Self {
            owner,
            repo,
            branch,
            subpath: path.join("/"),
        })
    }

    /// Branches to try: an explicit non-default branch first, then the
    /// conventional defaults.
    #[must_use]
    pub fn branch_candidates(&self) -> Vec<String> {
        let mut branches = Vec::with_capacity(3);
        if let Some(branch) = &self.branch
            && !DEFAULT_BRANCHES.contains(&branch.as_str())
        {
            branches.push(branch.clone());
        }
        branches.extend(DEFAULT_BRANCHES.iter().map(|b| (*b).to_string()));
        branches
    }

    /// Repo-relative path of the primary document.
    #[must_use]
    pub fn primary_path(&self) -> String {
        super::symlink::join_path(&self.subpath, PRIMARY_DOCUMENT)
    }
}

/// Percent-encode each segment of a `/`-separated path.
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
