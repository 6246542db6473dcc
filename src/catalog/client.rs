//! Skill catalog REST client.
//!
//! Thin wrapper over the catalog's keyword and semantic search endpoints,
//! authenticated with a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::{Result, SyncError};
use crate::fetch::retry::{RetryPolicy, send_with_retry};

/// Sort key for catalog search results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Stars,
    Recent,
}

impl SortBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Recent => "recent",
        }
    }
}

/// One skill as listed by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "keywords", alias = "topics")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub stars: u64,
    /// Unix seconds.
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(
        default,
        alias = "githubUrl",
        alias = "repositoryUrl",
        alias = "repository_url",
        alias = "sourceUrl"
    )]
    pub repository: String,
}

impl CatalogSkill {
    #[must_use]
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped {
        #[serde(alias = "data")]
        skills: SkillList,
    },
    Bare(Vec<CatalogSkill>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillList {
    List(Vec<CatalogSkill>),
    Nested { skills: Vec<CatalogSkill> },
}

impl SearchResponse {
    fn into_skills(self) -> Vec<CatalogSkill> {
        match self {
            Self::Wrapped {
                skills: SkillList::List(skills) | SkillList::Nested { skills },
            }
            | Self::Bare(skills) => skills,
        }
    }
}

/// Source of catalog search results.
#[async_trait]
pub trait SkillCatalog: Send + Sync {
    async fn search(
        &self,
        query: &str,
        page: usize,
        limit: usize,
        sort_by: SortBy,
    ) -> Result<Vec<CatalogSkill>>;

    async fn semantic_search(&self, query: &str) -> Result<Vec<CatalogSkill>>;
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("skillsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SyncError::Config(format!("catalog http client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::metadata(Duration::from_millis(500)),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_skills(&self, url: String) -> Result<Vec<CatalogSkill>> {
        debug!(url = %url, "catalog request");
        let response = send_with_retry(&self.retry, &url, || {
            self.client.get(&url).bearer_auth(&self.api_key)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(SyncError::Catalog(format!("HTTP {status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Catalog(format!("parse response: {err}")))?;
        Ok(parsed.into_skills())
    }
}

#[async_trait]
impl SkillCatalog for CatalogClient {
    async fn search(
        &self,
        query: &str,
        page: usize,
        limit: usize,
        sort_by: SortBy,
    ) -> Result<Vec<CatalogSkill>> {
        let url = format!(
            "{}/api/v1/skills/search?q={}&page={page}&limit={limit}&sortBy={}",
            self.base_url,
            urlencoding::encode(query),
            sort_by.as_str()
        );
        self.get_skills(url).await
    }

    async fn semantic_search(&self, query: &str) -> Result<Vec<CatalogSkill>> {
        let url = format!(
            "{}/api/v1/skills/ai-search?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        self.get_skills(url).await
    }
}
