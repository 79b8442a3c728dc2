use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Runs `zest` with HOME pointed at the scratch dir so no user config leaks in.
fn zest(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("zest").unwrap();
    cmd.env("HOME", dir.path()).env_remove("RUST_LOG").current_dir(dir.path());
    cmd
}

fn new_script(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("script.zst");
    zest(dir)
        .args(["new", path.to_str().unwrap(), "--title", "cli test"])
        .assert()
        .success();
    path
}

fn add(dir: &TempDir, path: &Path, descriptor: &str) -> String {
    let assert = zest(dir)
        .args(["add", path.to_str().unwrap(), descriptor])
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone())
        .unwrap()
        .trim()
        .to_string()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_help_exits_zero() {
    Command::cargo_bin("zest")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("zest"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    Command::cargo_bin("zest")
        .unwrap()
        .arg("totally-fake-command")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_new_appends_extension_and_writes_defaults() {
    let dir = TempDir::new().unwrap();
    zest(&dir)
        .args(["new", "fresh", "--type", "passive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fresh.zst"));

    let doc = read_json(&dir.path().join("fresh.zst"));
    assert_eq!(doc["elementType"], "ZestScript");
    assert_eq!(doc["type"], "Passive");
    assert_eq!(doc["author"], "anon");
    assert_eq!(doc["statements"], serde_json::json!([]));
}

#[test]
fn test_new_uses_user_config() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".zest")).unwrap();
    std::fs::write(dir.path().join(".zest/config.json"), r#"{"author": "mocha"}"#).unwrap();

    zest(&dir).args(["new", "configured"]).assert().success();
    let doc = read_json(&dir.path().join("configured.zst"));
    assert_eq!(doc["author"], "mocha");
    assert_eq!(doc["title"], "Unnamed Zest script");
}

#[test]
fn test_add_prints_indices_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);

    assert_eq!(add(&dir, &path, r#"{"elementType":"ZestComment","comment":"A"}"#), "1");
    assert_eq!(add(&dir, &path, r#"{"elementType":"ZestConditional"}"#), "2");
    assert_eq!(
        add(&dir, &path, r#"{"elementType":"ZestActionPrint","message":"ok","parentIndex":2,"subStatementOf":"ifStatements"}"#),
        "3"
    );

    let doc = read_json(&path);
    assert_eq!(doc["statements"][1]["ifStatements"][0]["index"], 3);

    zest(&dir)
        .args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_add_response_reports_attachment() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    add(&dir, &path, r#"{"elementType":"ZestRequest","url":"http://foo.com"}"#);

    let out = add(
        &dir,
        &path,
        r#"{"elementType":"ZestResponse","url":"http://bar.com","parentIndex":1,"subStatementOf":"response"}"#,
    );
    assert_eq!(out, "1 response");
    assert_eq!(read_json(&path)["statements"][0]["response"]["url"], "http://bar.com");
}

#[test]
fn test_unrecognized_type_warns_and_leaves_file() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    let before = std::fs::read_to_string(&path).unwrap();

    zest(&dir)
        .args(["add", path.to_str().unwrap(), r#"{"elementType":"ZestBogus"}"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("Unrecognized statement type: ZestBogus"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_invalid_descriptor_json_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    zest(&dir)
        .args(["add", path.to_str().unwrap(), "{not json"])
        .assert()
        .code(3);
}

#[test]
fn test_role_mismatch_is_operation_error() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    add(&dir, &path, r#"{"elementType":"ZestComment"}"#);

    zest(&dir)
        .args([
            "add",
            path.to_str().unwrap(),
            r#"{"elementType":"ZestActionPrint","parentIndex":1,"subStatementOf":"ifStatements"}"#,
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not accept children"));
}

#[test]
fn test_move_and_delete() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    for text in ["a", "b", "c"] {
        add(&dir, &path, &format!(r#"{{"elementType":"ZestComment","comment":"{}"}}"#, text));
    }

    zest(&dir)
        .args(["move", path.to_str().unwrap(), "3", "1"])
        .assert()
        .success();
    let doc = read_json(&path);
    assert_eq!(doc["statements"][0]["comment"], "c");
    assert_eq!(doc["statements"][0]["index"], 1);

    zest(&dir)
        .args(["delete", path.to_str().unwrap(), "--index", "2"])
        .assert()
        .success()
        .stdout("1\n");
    let doc = read_json(&path);
    let comments: Vec<&str> = doc["statements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["comment"].as_str().unwrap())
        .collect();
    assert_eq!(comments, vec!["c", "b"]);
}

#[test]
fn test_delete_by_role() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    add(&dir, &path, r#"{"elementType":"ZestRequest"}"#);
    add(
        &dir,
        &path,
        r#"{"elementType":"ZestExpressionStatusCode","code":200,"parentIndex":1,"subStatementOf":"assertions"}"#,
    );

    zest(&dir)
        .args(["delete", path.to_str().unwrap(), "--parent", "1", "--role", "assertions", "--sub-index", "0"])
        .assert()
        .success()
        .stdout("0\n");
    assert_eq!(read_json(&path)["statements"][0]["assertions"], serde_json::json!([]));
}

#[test]
fn test_delete_requires_a_target() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    zest(&dir)
        .args(["delete", path.to_str().unwrap()])
        .assert()
        .code(3);
    zest(&dir)
        .args(["delete", path.to_str().unwrap(), "--parent", "1", "--role", "kids"])
        .assert()
        .code(3);
}

#[test]
fn test_move_into_subtree_fails() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    add(&dir, &path, r#"{"elementType":"ZestLoopInteger"}"#);
    add(&dir, &path, r#"{"elementType":"ZestComment","parentIndex":1,"subStatementOf":"statements"}"#);

    zest(&dir)
        .args(["move", path.to_str().unwrap(), "1", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("inside the moved subtree"));
}

#[test]
fn test_show_outline_and_single_statement() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    add(&dir, &path, r#"{"elementType":"ZestConditional"}"#);
    add(&dir, &path, r#"{"elementType":"ZestActionFail","message":"boom","parentIndex":1,"subStatementOf":"elseStatements"}"#);

    zest(&dir)
        .args(["show", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("cli test (Standalone, 2 statements)"))
        .stdout(predicate::str::contains("  [elseStatements] 2 ZestActionFail: boom"));

    zest(&dir)
        .args(["show", path.to_str().unwrap(), "--index", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"priority\": \"HIGH\""));

    zest(&dir)
        .args(["show", path.to_str().unwrap(), "--index", "7"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    zest(&dir)
        .args(["check", "nope.zst"])
        .assert()
        .code(2);
}

#[test]
fn test_bad_script_type_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.zst");
    std::fs::write(&path, r#"{"type":"ive","statements":[],"elementType":"ZestScript"}"#).unwrap();
    zest(&dir)
        .args(["check", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unrecognized script type ive"));
}

#[test]
fn test_log_file_receives_warnings() {
    let dir = TempDir::new().unwrap();
    let path = new_script(&dir);
    let log = dir.path().join("zest.log");

    zest(&dir)
        .args(["--log-file", log.to_str().unwrap(), "add", path.to_str().unwrap(), r#"{"elementType":"ZestBogus"}"#])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("skipping statement"));
}
