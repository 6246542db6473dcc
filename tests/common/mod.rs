//! Helpers shared by the integration and e2e suites.
//!
//! One `httpmock` server stands in for the catalog, the GitHub contents API
//! and raw content hosting, distinguished by path prefix.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use httpmock::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

pub struct TestEnv {
    pub root: TempDir,
    pub server: MockServer,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("temp root"),
            server: MockServer::start(),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// `skillsync` with every endpoint pointed at the mock server.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("skillsync").expect("binary");
        cmd.env("SKILLSYNC_ROOT", self.root())
            .env("SKILLSYNC_CONFIG", self.root().join("no-config.toml"))
            .env("SKILLSYNC_API_KEY", "test-key")
            .env("SKILLSYNC_CATALOG_URL", self.server.base_url())
            .env("SKILLSYNC_GITHUB_API", self.server.base_url())
            .env("SKILLSYNC_GITHUB_RAW", format!("{}/raw", self.server.base_url()))
            .env("SKILLSYNC_RETRY_BASE_DELAY_MS", "0")
            .env_remove("GITHUB_TOKEN")
            .env_remove("SKILLSYNC_STRATEGY")
            .env_remove("SKILLSYNC_NON_INTERACTIVE")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Catalog search answering `query` with `skills`.
    pub fn catalog(&self, query: &str, skills: Value) {
        let query = query.to_string();
        self.server.mock(move |when, then| {
            when.method(GET)
                .path("/api/v1/skills/search")
                .query_param("q", query.as_str());
            then.status(200).json_body(json!({ "skills": skills }));
        });
    }

    /// Serve `<owner>/skills/main/<name>/SKILL.md` and an empty listing.
    pub fn skill(&self, owner: &str, name: &str, body: &str) {
        let raw = format!("/raw/{owner}/skills/main/{name}/SKILL.md");
        let list = format!("/repos/{owner}/skills/contents/{name}");
        let body = body.to_string();
        self.server.mock(move |when, then| {
            when.method(GET).path(raw.as_str());
            then.status(200).body(body.as_str());
        });
        self.server.mock(move |when, then| {
            when.method(GET).path(list.as_str());
            then.status(200).json_body(json!([]));
        });
    }

    pub fn read_json(&self, relative: &str) -> Value {
        let raw = std::fs::read_to_string(self.root().join(relative)).expect("read json");
        serde_json::from_str(&raw).expect("parse json")
    }
}

pub fn catalog_entry(name: &str, owner: &str, stars: u64) -> Value {
    json!({
        "name": name,
        "description": format!("{name} skill"),
        "stars": stars,
        "githubUrl": format!("https://github.com/{owner}/skills/tree/main/{name}"),
    })
}
