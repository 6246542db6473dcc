use serde_json::{Value, json};

use crate::common::{TestEnv, catalog_entry};

fn seed_local(env: &TestEnv, name: &str, owner: &str) {
    let store = skillsync::storage::SkillStore::open(env.root()).unwrap();
    let mut record = skillsync::core::SkillRecord::new(
        name,
        format!("https://github.com/{owner}/skills/tree/main/{name}"),
    );
    record.content = "# local".into();
    store.write(&record).unwrap();
}

fn sync_with(env: &TestEnv, name: &str, strategy: &str) -> Value {
    let output = env
        .command()
        .args(["--robot", "sync", "--non-interactive", "--strategy", strategy, name])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_conflict_skip_keeps_local() {
    let env = TestEnv::new();
    seed_local(&env, "pr-creator", "old");
    env.catalog("pr-creator", json!([catalog_entry("pr-creator", "acme", 5)]));
    env.skill("acme", "pr-creator", "# incoming");

    let json = sync_with(&env, "pr-creator", "skip");
    assert_eq!(json["data"]["conflicts"], 1);
    assert_eq!(json["data"]["resolution"]["skipped"], 1);
    assert_eq!(env.read_json("skills/pr-creator.json")["owner"], "old");
}

#[test]
fn test_conflict_replace_overwrites() {
    let env = TestEnv::new();
    seed_local(&env, "pr-creator", "old");
    env.catalog("pr-creator", json!([catalog_entry("pr-creator", "acme", 5)]));
    env.skill("acme", "pr-creator", "# incoming");

    let json = sync_with(&env, "pr-creator", "replace");
    assert_eq!(json["data"]["resolution"]["replaced"], 1);
    assert_eq!(env.read_json("skills/pr-creator.json")["owner"], "acme");
    let content =
        std::fs::read_to_string(env.root().join("content/pr-creator/SKILL.md")).unwrap();
    assert_eq!(content, "# incoming");
}

#[test]
fn test_conflict_keep_both_renames_then_replaces() {
    let env = TestEnv::new();
    seed_local(&env, "docs-writer", "old");
    env.catalog("docs-writer", json!([catalog_entry("docs-writer", "acme", 5)]));
    env.skill("acme", "docs-writer", "# incoming");

    let json = sync_with(&env, "docs-writer", "keep-both");
    assert_eq!(json["data"]["resolution"]["renamed"], 1);
    assert_eq!(json["data"]["resolution"]["renames"][0]["to"], "acme-docs-writer");
    let renamed = env.read_json("skills/acme-docs-writer.json");
    assert_eq!(renamed["originalName"], "docs-writer");
    assert_eq!(env.read_json("skills/docs-writer.json")["owner"], "old");
    assert_eq!(env.read_json("index.json")["meta"]["total"], 2);

    // The renamed slot is now occupied, so a repeat replaces it with a warning.
    let json = sync_with(&env, "docs-writer", "keep-both");
    assert_eq!(json["data"]["resolution"]["replaced"], 1);
    assert!(
        json["warnings"][0]
            .as_str()
            .unwrap()
            .contains("acme-docs-writer")
    );
    assert_eq!(env.read_json("index.json")["meta"]["total"], 2);
}
