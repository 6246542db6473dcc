//! Retry wrapper for requests against rate-limited hosts.
//!
//! HTTP 403/429 responses back off exponentially (or by the server's
//! `Retry-After` hint); transport failures back off linearly. Any other
//! status is handed back to the caller untouched.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::error::{Result, SyncError};

/// Attempts for directory listings and primary documents.
pub const METADATA_ATTEMPTS: u32 = 3;
/// Attempts for individual auxiliary files.
pub const FILE_ATTEMPTS: u32 = 2;

const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: MAX_DELAY,
        }
    }

    #[must_use]
    pub const fn metadata(base_delay: Duration) -> Self {
        Self::new(METADATA_ATTEMPTS, base_delay)
    }

    #[must_use]
    pub const fn file(base_delay: Duration) -> Self {
        Self::new(FILE_ATTEMPTS, base_delay)
    }

    /// Delay after a rate-limited response on zero-based `attempt`.
    #[must_use]
    pub fn rate_limit_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or_else(|| self.base_delay.saturating_mul(2u32.saturating_pow(attempt)))
            .min(self.max_delay)
    }

    /// Delay after a transport failure on zero-based `attempt`.
    #[must_use]
    pub fn network_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.saturating_add(1))
            .min(self.max_delay)
    }
}

/// Parse a `Retry-After` header expressed in whole seconds.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[must_use]
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}

/// Send the request built by `build` until it yields a response that is not
/// rate limited, or the policy's attempts run out.
///
/// `build` is called once per attempt since request builders are consumed
/// on send.
pub async fn send_with_retry<F>(policy: &RetryPolicy, url: &str, mut build: F) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 0..attempts {
        let last = attempt + 1 == attempts;
        match build().send().await {
            Ok(response) if is_rate_limited(response.status()) => {
                let delay = policy.rate_limit_delay(attempt, parse_retry_after(response.headers()));
                debug!(
                    url,
                    status = response.status().as_u16(),
                    attempt,
                    "rate limited"
                );
                if last {
                    break;
                }
                tokio::time::sleep(delay).await;
            }
            Ok(response) => return Ok(response),
            Err(err) => {
                debug!(url, attempt, "request failed: {err}");
                if last {
                    break;
                }
                tokio::time::sleep(policy.network_delay(attempt)).await;
            }
        }
    }

    Err(SyncError::RateLimited(url.to_string()))
}
