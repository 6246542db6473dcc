//! Error types for skillsync.

use thiserror::Error;

/// Errors produced while syncing, fetching, or persisting skills.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Retry budget exhausted against a rate-limited host.
    #[error("rate limit exceeded for {0}; set GITHUB_TOKEN (or github.token) to raise the limit")]
    RateLimited(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("invalid skill: {0}")]
    InvalidSkill(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
