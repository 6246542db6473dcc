//! Remote content retrieval from GitHub.

pub mod fetcher;
pub mod github;
pub mod retry;
pub mod symlink;

pub use fetcher::{ContentFetcher, FetchedContent};
pub use github::{DEFAULT_BRANCHES, SourceLocation};
pub use retry::{RetryPolicy, send_with_retry};
pub use symlink::resolve_link_target;
