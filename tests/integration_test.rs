//! Integration tests for the sceneqa CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn get_cmd() -> Command {
    Command::cargo_bin("sceneqa").unwrap()
}

const CLEAN_SCENE: &str = r#"{
  "nodes": [
    { "name": "hero_grp", "type": "transform" },
    { "name": "hero_geo", "type": "transform", "parent": "|hero_grp" },
    { "name": "hero_geo_shape", "type": "mesh", "parent": "|hero_grp|hero_geo" }
  ]
}"#;

const DEFAULT_NAME_SCENE: &str = r#"{
  "nodes": [
    { "name": "pCube1", "type": "transform" },
    { "name": "cube_shape", "type": "mesh", "parent": "|pCube1" }
  ]
}"#;

const CLASHING_SCENE: &str = r#"{
  "nodes": [
    { "name": "left_grp", "type": "transform" },
    { "name": "geo", "type": "transform", "parent": "|left_grp" },
    { "name": "left_shape", "type": "mesh", "parent": "|left_grp|geo" },
    { "name": "right_grp", "type": "transform" },
    { "name": "geo", "type": "transform", "parent": "|right_grp" },
    { "name": "right_shape", "type": "mesh", "parent": "|right_grp|geo" }
  ]
}"#;

fn write_scene(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_init_command_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(".sceneqa.toml");

    get_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--collection", "rigging", "--non-interactive"])
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(
        content.contains("collection = \"rigging\""),
        "Config should name the collection"
    );
}

#[tokio::test]
async fn test_init_command_refuses_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".sceneqa.toml"), "collection = \"animation\"\n").unwrap();

    get_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--non-interactive"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));
}

#[tokio::test]
async fn test_init_command_rejects_unknown_collection() {
    let temp_dir = TempDir::new().unwrap();

    get_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--collection", "compositing", "--non-interactive"])
        .assert()
        .code(4);
}

#[tokio::test]
async fn test_audit_clean_scene() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clean.json", CLEAN_SCENE);

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "animation"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Scene is clean."));
}

#[tokio::test]
async fn test_audit_reports_warnings() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "cube.json", DEFAULT_NAME_SCENE);

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "animation"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("scene/default-names"))
        .stdout(predicate::str::contains("|pCube1"));
}

#[tokio::test]
async fn test_audit_select_stores_selection() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "cube.json", DEFAULT_NAME_SCENE);

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "animation", "--select", "scene/default-names"])
        .assert()
        .code(2);

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&scene).unwrap()).unwrap();
    assert_eq!(saved["selection"], serde_json::json!(["|pCube1"]));
}

#[tokio::test]
async fn test_audit_reports_critical_issues_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clash.json", CLASHING_SCENE);
    let report = temp_dir.path().join("report.json");

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "animation", "--format", "json", "-o"])
        .arg(&report)
        .assert()
        .code(1);

    let content = fs::read_to_string(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["collection"], "animation");
    assert_eq!(json["summary"]["critical_count"], 1);
}

#[tokio::test]
async fn test_audit_skip_category() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clash.json", CLASHING_SCENE);

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "animation", "--skip", "scene"])
        .assert()
        .code(0);
}

#[tokio::test]
async fn test_audit_unknown_collection_runs_every_category() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clash.json", CLASHING_SCENE);
    let report = temp_dir.path().join("report.json");

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("audit")
        .arg(&scene)
        .args(["--collection", "compositing", "--format", "json", "-o"])
        .arg(&report)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown collection"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["collection"], "compositing");
    let categories: Vec<&str> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(categories.contains(&"Render Stats"));
    assert!(categories.contains(&"Skinning"));
}

#[tokio::test]
async fn test_audit_missing_scene() {
    let temp_dir = TempDir::new().unwrap();

    get_cmd()
        .current_dir(temp_dir.path())
        .args(["audit", "missing.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to load scene"));
}

#[tokio::test]
async fn test_fix_renames_clashing_nodes() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clash.json", CLASHING_SCENE);
    let fixed = temp_dir.path().join("fixed.json");

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("fix")
        .arg(&scene)
        .args(["--collection", "animation", "--yes", "--output"])
        .arg(&fixed)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Fixed 2 subject(s)"));

    let content = fs::read_to_string(&fixed).unwrap();
    assert!(content.contains("geo_001"));
    assert!(content.contains("geo_002"));
    // The input scene is untouched when --output is given
    assert_eq!(fs::read_to_string(&scene).unwrap(), CLASHING_SCENE);
}

#[tokio::test]
async fn test_fix_dry_run_leaves_scene_alone() {
    let temp_dir = TempDir::new().unwrap();
    let scene = write_scene(&temp_dir, "clash.json", CLASHING_SCENE);

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("fix")
        .arg(&scene)
        .args(["--collection", "animation", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scene/unique-names"));

    assert_eq!(fs::read_to_string(&scene).unwrap(), CLASHING_SCENE);
}

#[tokio::test]
async fn test_list_json() {
    let output = get_cmd().args(["list", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert_eq!(rules[0]["id"], "scene/default-names");
    assert!(rules.iter().any(|r| r["id"] == "render-stats/primary-visibility"));
}

#[tokio::test]
async fn test_collections_command() {
    let temp_dir = TempDir::new().unwrap();

    get_cmd()
        .current_dir(temp_dir.path())
        .arg("collections")
        .assert()
        .success()
        .stdout(predicate::str::contains("look-dev"))
        .stdout(predicate::str::contains("(default)"));
}

#[tokio::test]
async fn test_explain_rule() {
    get_cmd()
        .args(["explain", "scene/unique-names"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unique Names"));

    get_cmd()
        .args(["explain", "scene/nope"])
        .assert()
        .code(4);
}

#[tokio::test]
async fn test_help_command() {
    get_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("fix"));
}
