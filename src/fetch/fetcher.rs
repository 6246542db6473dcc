//! Remote content fetcher for skills hosted on GitHub.
//!
//! Finds a skill's primary document across candidate branches, then walks
//! its directory through the contents API, following subdirectories and
//! symbolic links. Failures of individual auxiliary files are isolated:
//! they are logged and left out of the result.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::github::{SourceLocation, encode_path};
use super::retry::{RetryPolicy, send_with_retry};
use super::symlink::{contains_path, join_path, resolve_link_target};
use crate::config::GithubConfig;
use crate::core::PRIMARY_DOCUMENT;
use crate::error::{Result, SyncError};

/// Limit on nested directory/symlink traversal.
const MAX_DEPTH: usize = 8;

/// Primary document plus auxiliary files retrieved for one skill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub primary: String,
    /// Auxiliary files keyed by path relative to the skill directory.
    pub files: BTreeMap<String, String>,
    /// Branch the primary document was found on.
    pub branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    File,
    Dir,
    Symlink,
    #[serde(other)]
    Other,
}

/// One entry of a contents API directory listing.
#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    download_url: Option<String>,
}

/// Coordinates of one directory walk.
///
/// `requests` is shared by every level of the walk, so at most
/// `max_fanout` contents or file requests are in flight per skill however
/// deep the tree goes.
#[derive(Clone, Copy)]
struct Walk<'a> {
    loc: &'a SourceLocation,
    branch: &'a str,
    requests: &'a Semaphore,
}

pub struct ContentFetcher {
    client: Client,
    api_base: String,
    raw_base: String,
    token: Option<String>,
    metadata_retry: RetryPolicy,
    file_retry: RetryPolicy,
    max_fanout: usize,
}

impl ContentFetcher {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("skillsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SyncError::Config(format!("github http client: {err}")))?;
        let base_delay = Duration::from_millis(config.retry_base_delay_ms);
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            metadata_retry: RetryPolicy::metadata(base_delay),
            file_retry: RetryPolicy::file(base_delay),
            max_fanout: config.max_fanout.max(1),
        })
    }

    /// Fetch a skill's primary document and auxiliary files.
    ///
    /// Returns `Ok(None)` when the location cannot be parsed or no candidate
    /// branch has a primary document. Exhausted retries on the primary
    /// document surface as [`SyncError::RateLimited`].
    pub async fn fetch(&self, source_url: &str) -> Result<Option<FetchedContent>> {
        let Some(loc) = SourceLocation::parse(source_url) else {
            warn!(source_url, "unrecognised source location");
            return Ok(None);
        };

        let primary_path = loc.primary_path();
        let mut found = None;
        for branch in loc.branch_candidates() {
            let url = self.raw_url(&loc, &branch, &primary_path);
            let response = send_with_retry(&self.metadata_retry, &url, || self.get(&url)).await?;
            if response.status().is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|err| SyncError::Http(format!("read {url}: {err}")))?;
                found = Some((branch, text));
                break;
            }
            debug!(url = %url, status = response.status().as_u16(), "primary document not on branch");
        }

        let Some((branch, primary)) = found else {
            return Ok(None);
        };

        let requests = Semaphore::new(self.max_fanout);
        let walk = Walk {
            loc: &loc,
            branch: &branch,
            requests: &requests,
        };
        let files = self.collect_directory(walk, loc.subpath.clone(), String::new(), 0).await;

        Ok(Some(FetchedContent {
            primary,
            files,
            branch,
        }))
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn raw_url(&self, loc: &SourceLocation, branch: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base,
            loc.owner,
            loc.repo,
            urlencoding::encode(branch),
            encode_path(path)
        )
    }

    fn contents_url(&self, walk: Walk<'_>, path: &str) -> String {
        let path = encode_path(path);
        let (owner, repo) = (&walk.loc.owner, &walk.loc.repo);
        let branch = urlencoding::encode(walk.branch);
        if path.is_empty() {
            format!("{}/repos/{owner}/{repo}/contents?ref={branch}", self.api_base)
        } else {
            format!("{}/repos/{owner}/{repo}/contents/{path}?ref={branch}", self.api_base)
        }
    }

    async fn list_directory(&self, walk: Walk<'_>, dir: &str) -> Result<Vec<ContentEntry>> {
        let url = self.contents_url(walk, dir);
        let _permit = acquire(walk.requests).await?;
        let response = send_with_retry(&self.metadata_retry, &url, || {
            self.get(&url)
                .header("Accept", "application/vnd.github.v3+json")
        })
        .await?;

        if !response.status().is_success() {
            return Err(SyncError::Http(format!(
                "list {url}: HTTP {}",
                response.status()
            )));
        }

        // A path naming a file yields an object instead of an array.
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|err| SyncError::Http(format!("list {url}: {err}")))?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn fetch_text(&self, walk: Walk<'_>, url: &str) -> Result<String> {
        let _permit = acquire(walk.requests).await?;
        let response = send_with_retry(&self.file_retry, url, || self.get(url)).await?;
        if !response.status().is_success() {
            return Err(SyncError::Http(format!("{url}: HTTP {}", response.status())));
        }
        response
            .text()
            .await
            .map_err(|err| SyncError::Http(format!("read {url}: {err}")))
    }

    fn entry_url(&self, walk: Walk<'_>, entry: &ContentEntry) -> String {
        entry
            .download_url
            .clone()
            .unwrap_or_else(|| self.raw_url(walk.loc, walk.branch, &entry.path))
    }

    /// Collect every auxiliary file under `dir`, keyed by `prefix`-relative path.
    fn collect_directory<'a>(
        &'a self,
        walk: Walk<'a>,
        dir: String,
        prefix: String,
        depth: usize,
    ) -> BoxFuture<'a, BTreeMap<String, String>> {
        Box::pin(async move {
            if depth > MAX_DEPTH {
                warn!(dir = %dir, "directory nesting too deep; skipping");
                return BTreeMap::new();
            }

            let entries = match self.list_directory(walk, &dir).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(dir = %dir, "could not list directory: {err}");
                    return BTreeMap::new();
                }
            };

            let tasks: Vec<BoxFuture<'a, BTreeMap<String, String>>> = entries
                .into_iter()
                .filter_map(|entry| self.entry_task(walk, &dir, &prefix, entry, depth))
                .collect();

            // Tasks never fail; a failed sibling only contributes nothing.
            let results: Vec<BTreeMap<String, String>> = stream::iter(tasks)
                .buffer_unordered(self.max_fanout)
                .collect()
                .await;

            results.into_iter().flatten().collect()
        })
    }

    fn entry_task<'a>(
        &'a self,
        walk: Walk<'a>,
        dir: &str,
        prefix: &str,
        entry: ContentEntry,
        depth: usize,
    ) -> Option<BoxFuture<'a, BTreeMap<String, String>>> {
        let relative = join_path(prefix, &entry.name);
        match entry.kind {
            EntryKind::File => {
                if entry.name.eq_ignore_ascii_case(PRIMARY_DOCUMENT) {
                    return None;
                }
                let url = self.entry_url(walk, &entry);
                Some(Box::pin(async move {
                    self.fetch_file(walk, &url, relative).await
                }))
            }
            EntryKind::Dir => Some(self.collect_directory(walk, entry.path, relative, depth + 1)),
            EntryKind::Symlink => {
                let url = self.entry_url(walk, &entry);
                let dir = dir.to_string();
                Some(Box::pin(async move {
                    self.follow_symlink(walk, &url, &dir, relative, depth).await
                }))
            }
            EntryKind::Other => {
                debug!(path = %entry.path, "skipping unsupported entry");
                None
            }
        }
    }

    async fn fetch_file(
        &self,
        walk: Walk<'_>,
        url: &str,
        relative: String,
    ) -> BTreeMap<String, String> {
        match self.fetch_text(walk, url).await {
            Ok(content) => BTreeMap::from([(relative, content)]),
            Err(err) => {
                warn!(path = %relative, "skipping file: {err}");
                BTreeMap::new()
            }
        }
    }

    /// Resolve a link and collect its target, first as a directory and,
    /// failing that, as a single file stored under the link's own path.
    async fn follow_symlink(
        &self,
        walk: Walk<'_>,
        link_url: &str,
        dir: &str,
        relative: String,
        depth: usize,
    ) -> BTreeMap<String, String> {
        let target = match self.fetch_text(walk, link_url).await {
            Ok(target) => target,
            Err(err) => {
                warn!(path = %relative, "could not read symlink: {err}");
                return BTreeMap::new();
            }
        };
        let resolved = resolve_link_target(dir, &target);
        debug!(link = %relative, target = target.trim(), resolved = %resolved, "following symlink");
        if contains_path(&resolved, dir) {
            warn!(link = %relative, resolved = %resolved, "symlink points at an enclosing directory; skipping");
            return BTreeMap::new();
        }

        let as_dir = self
            .collect_directory(walk, resolved.clone(), relative.clone(), depth + 1)
            .await;
        if !as_dir.is_empty() {
            return as_dir;
        }

        let url = self.raw_url(walk.loc, walk.branch, &resolved);
        self.fetch_file(walk, &url, relative).await
    }
}

async fn acquire(requests: &Semaphore) -> Result<tokio::sync::SemaphorePermit<'_>> {
    requests
        .acquire()
        .await
        .map_err(|err| SyncError::Http(format!("request limiter closed: {err}")))
}
