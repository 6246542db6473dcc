use httpmock::prelude::*;
use serde_json::{Value, json};

use crate::common::{TestEnv, catalog_entry};

fn robot_sync(env: &TestEnv, args: &[&str]) -> Value {
    let output = env
        .command()
        .args(["--robot", "sync", "--non-interactive"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_sync_named_skill_end_to_end() {
    let env = TestEnv::new();
    env.catalog("pdf", json!([catalog_entry("pdf", "acme", 10)]));
    env.skill(
        "acme",
        "pdf",
        "---\nversion: 2.0.0\ntags: [pdf, forms]\n---\n# PDF\nFill forms.",
    );

    let json = robot_sync(&env, &["pdf"]);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["created"], 1);

    let meta = env.read_json("skills/pdf.json");
    assert_eq!(meta["owner"], "acme");
    assert_eq!(meta["version"], "2.0.0");
    assert_eq!(meta["tags"][0], "acme");
    assert!(env.root().join("content/pdf/SKILL.md").exists());

    let index = env.read_json("index.json");
    assert_eq!(index["meta"]["total"], 1);
    assert_eq!(index["skills"][0]["name"], "pdf");
}

#[test]
fn test_second_sync_is_unchanged() {
    let env = TestEnv::new();
    env.catalog("pdf", json!([catalog_entry("pdf", "acme", 10)]));
    env.skill("acme", "pdf", "# PDF");

    robot_sync(&env, &["pdf"]);
    let json = robot_sync(&env, &["pdf"]);
    assert_eq!(json["data"]["created"], 0);
    assert_eq!(json["data"]["skipped"], 1);

    let json = robot_sync(&env, &["pdf", "--force"]);
    assert_eq!(json["data"]["updated"], 1);
}

#[test]
fn test_top_n_sync() {
    let env = TestEnv::new();
    env.catalog(
        "",
        json!([
            catalog_entry("alpha", "acme", 30),
            catalog_entry("beta", "octo", 20),
            catalog_entry("gamma", "acme", 10),
        ]),
    );
    env.skill("acme", "alpha", "# Alpha");
    env.skill("octo", "beta", "# Beta");

    let json = robot_sync(&env, &["--top", "2"]);
    assert_eq!(json["data"]["created"], 2);
    assert!(env.root().join("skills/alpha.json").exists());
    assert!(env.root().join("skills/beta.json").exists());
    assert!(!env.root().join("skills/gamma.json").exists());
}

#[test]
fn test_rate_limited_item_is_partial_failure() {
    let env = TestEnv::new();
    env.catalog(
        "",
        json!([catalog_entry("ok", "acme", 2), catalog_entry("busy", "acme", 1)]),
    );
    env.skill("acme", "ok", "# Ok");
    env.server.mock(|when, then| {
        when.method(GET).path("/raw/acme/skills/main/busy/SKILL.md");
        then.status(429).header("Retry-After", "0");
    });

    let json = robot_sync(&env, &["--top", "2"]);
    assert_eq!(json["status"]["partial"]["failed"], 1);
    assert_eq!(json["data"]["failures"][0]["name"], "busy");
    assert!(
        json["data"]["failures"][0]["error"]
            .as_str()
            .unwrap()
            .contains("GITHUB_TOKEN")
    );
    assert!(env.root().join("skills/ok.json").exists());
}

#[test]
fn test_nested_files_are_stored() {
    let env = TestEnv::new();
    env.catalog("pdf", json!([catalog_entry("pdf", "acme", 10)]));
    env.server.mock(|when, then| {
        when.method(GET).path("/raw/acme/skills/main/pdf/SKILL.md");
        then.status(200).body("See [api](references/api.md)");
    });
    let base = env.server.base_url();
    env.server.mock(|when, then| {
        when.method(GET).path("/repos/acme/skills/contents/pdf");
        then.status(200).json_body(json!([
            {"name": "SKILL.md", "path": "pdf/SKILL.md", "type": "file"},
            {"name": "references", "path": "pdf/references", "type": "dir"},
        ]));
    });
    env.server.mock(|when, then| {
        when.method(GET).path("/repos/acme/skills/contents/pdf/references");
        then.status(200).json_body(json!([
            {
                "name": "api.md",
                "path": "pdf/references/api.md",
                "type": "file",
                "download_url": format!("{base}/files/api.md"),
            },
        ]));
    });
    env.server.mock(|when, then| {
        when.method(GET).path("/files/api.md");
        then.status(200).body("# API");
    });

    let json = robot_sync(&env, &["pdf"]);
    assert!(json.get("warnings").is_none());
    let stored = std::fs::read_to_string(env.root().join("content/pdf/references/api.md")).unwrap();
    assert_eq!(stored, "# API");
}
