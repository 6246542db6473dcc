use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::SortBy;
use crate::core::DEFAULT_MAX_TAGS;
use crate::error::{Result, SyncError};
use crate::sync::ConflictChoice;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLSYNC_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Catalog API key, required before any catalog traffic.
    pub fn require_api_key(&self) -> Result<&str> {
        self.catalog
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SyncError::MissingConfig(
                    "catalog.api_key (set SKILLSYNC_API_KEY or [catalog] api_key)".to_string(),
                )
            })
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("skillsync/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        let path = root.join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SyncError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SyncError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.catalog {
            self.catalog.merge(patch);
        }
        if let Some(patch) = patch.github {
            self.github.merge(patch);
        }
        if let Some(patch) = patch.sync {
            self.sync.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("SKILLSYNC_CATALOG_URL") {
            self.catalog.base_url = value;
        }
        if let Some(value) = lookup("SKILLSYNC_API_KEY") {
            self.catalog.api_key = Some(value);
        }

        if let Some(value) = lookup("GITHUB_TOKEN") {
            self.github.token = Some(value);
        }
        if let Some(value) = lookup("SKILLSYNC_GITHUB_API") {
            self.github.api_base = value;
        }
        if let Some(value) = lookup("SKILLSYNC_GITHUB_RAW") {
            self.github.raw_base = value;
        }
        if let Some(value) = parse_env::<u64>(&lookup, "SKILLSYNC_RETRY_BASE_DELAY_MS")? {
            self.github.retry_base_delay_ms = value;
        }

        if let Some(value) = lookup("SKILLSYNC_STRATEGY") {
            self.sync.default_strategy = value.parse()?;
        }
        if let Some(value) = lookup("SKILLSYNC_NON_INTERACTIVE") {
            self.sync.non_interactive = parse_bool(&value);
        }
        if let Some(value) = parse_env::<usize>(&lookup, "SKILLSYNC_MAX_TAGS")? {
            self.sync.max_tags = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    fn merge(&mut self, patch: CatalogPatch) {
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.api_key {
            self.api_key = Some(value);
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api")]
    pub api_base: String,
    #[serde(default = "default_github_raw")]
    pub raw_base: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_fanout")]
    pub max_fanout: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            raw_base: default_github_raw(),
            token: None,
            timeout_secs: default_timeout_secs(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_fanout: default_max_fanout(),
        }
    }
}

impl GithubConfig {
    fn merge(&mut self, patch: GithubPatch) {
        if let Some(value) = patch.api_base {
            self.api_base = value;
        }
        if let Some(value) = patch.raw_base {
            self.raw_base = value;
        }
        if let Some(value) = patch.token {
            self.token = Some(value);
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
        if let Some(value) = patch.retry_base_delay_ms {
            self.retry_base_delay_ms = value;
        }
        if let Some(value) = patch.max_fanout {
            self.max_fanout = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub default_strategy: ConflictChoice,
    #[serde(default)]
    pub non_interactive: bool,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_strategy: ConflictChoice::default(),
            non_interactive: false,
            max_tags: default_max_tags(),
            limit: default_limit(),
            sort_by: SortBy::default(),
        }
    }
}

impl SyncConfig {
    fn merge(&mut self, patch: SyncPatch) {
        if let Some(value) = patch.default_strategy {
            self.default_strategy = value;
        }
        if let Some(value) = patch.non_interactive {
            self.non_interactive = value;
        }
        if let Some(value) = patch.max_tags {
            self.max_tags = value;
        }
        if let Some(value) = patch.limit {
            self.limit = value;
        }
        if let Some(value) = patch.sort_by {
            self.sort_by = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub catalog: Option<CatalogPatch>,
    pub github: Option<GithubPatch>,
    pub sync: Option<SyncPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogPatch {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GithubPatch {
    pub api_base: Option<String>,
    pub raw_base: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_base_delay_ms: Option<u64>,
    pub max_fanout: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SyncPatch {
    pub default_strategy: Option<ConflictChoice>,
    pub non_interactive: Option<bool>,
    pub max_tags: Option<usize>,
    pub limit: Option<usize>,
    pub sort_by: Option<SortBy>,
}

fn default_catalog_url() -> String {
    "https://skillsmp.com".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_github_raw() -> String {
    "https://raw.githubusercontent.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

const fn default_max_fanout() -> usize {
    4
}

const fn default_max_tags() -> usize {
    DEFAULT_MAX_TAGS
}

const fn default_limit() -> usize {
    20
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| SyncError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
