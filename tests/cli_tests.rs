//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn testscout() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("testscout"))
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn fixture() -> TempDir {
    let tmp = TempDir::new().expect("tmp");
    let root = tmp.path();
    write(root, "src/math.ts", "import { log } from './logger';\nexport const add = (a: number, b: number) => a + b;\n");
    write(root, "src/logger.ts", "export const log = console.log;\n");
    write(root, "src/calc.ts", "import { add } from './math';\nexport const twice = (a: number) => add(a, a);\n");
    write(root, "src/math.test.ts", "import { add } from './math';\ntest('add', () => expect(add(1, 2)).toBe(3));\n");
    write(root, "node_modules/left-pad/index.js", "module.exports = {};\n");
    tmp
}

#[test]
fn test_cli_version() {
    let mut cmd = testscout();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("testscout"));
}

#[test]
fn test_cli_help() {
    let mut cmd = testscout();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Find the tests a pull request should touch"))
        .stdout(predicate::str::contains("github"))
        .stdout(predicate::str::contains("local"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_github_requires_repo_and_pr() {
    let mut cmd = testscout();
    cmd.arg("github");
    cmd.assert().failure().stderr(predicate::str::contains("--repo"));
}

#[test]
fn test_local_json_report() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts,src/calc.ts",
        "--format",
        "json",
        "--no-timestamp",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output).expect("json report");

    assert!(report.get("generated_at").is_none());
    assert_eq!(report["index_complete"], true);
    assert_eq!(report["tests_to_modify"], serde_json::json!(["src/math.test.ts"]));
    assert_eq!(report["untested_files"], serde_json::json!(["src/calc.ts"]));

    let files = report["files"].as_array().expect("files");
    let math = files.iter().find(|f| f["path"] == "src/math.ts").expect("math record");
    assert_eq!(math["dependencies"][0]["path"], "src/logger.ts");
    assert_eq!(math["dependencies"][0]["type"], "import");
    assert!(math["dependents"].as_array().expect("dependents").iter().any(|d| d["path"] == "src/calc.ts"));
}

#[test]
fn test_local_text_report_and_output_file() {
    let tmp = fixture();
    let out = tmp.path().join("reports/out.json");
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts",
        "--output",
        out.to_str().expect("utf8 path"),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1 changed files"))
        .stdout(predicate::str::contains("Tests to modify:\n  - src/math.test.ts"));

    let written = fs::read_to_string(out).expect("report file");
    assert!(written.contains("\"tests_to_modify\""));
}

#[test]
fn test_local_command_scopes_report() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts,src/calc.ts",
        "--command",
        "generate tests calc.ts",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("src/calc.ts [modified]"))
        .stdout(predicate::str::contains("src/math.ts [modified]").not());
}

#[test]
fn test_local_command_unknown_file_fails() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts",
        "--command",
        "explain tests src/nope.ts",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File \"src/nope.ts\" was not found in the analysis"));
}

#[test]
fn test_local_rejects_unknown_command() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts",
        "--command",
        "please review",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("Unrecognized command"));
}

#[test]
fn test_local_respects_filter_flag() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args([
        "local",
        "--path",
        tmp.path().to_str().expect("utf8 path"),
        "--files",
        "src/math.ts,src/calc.ts",
        "--filter",
        "!src/calc.ts",
        "--format",
        "json",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report: Value = serde_json::from_slice(&output).expect("json report");
    let paths: Vec<&str> =
        report["files"].as_array().expect("files").iter().filter_map(|f| f["path"].as_str()).collect();
    assert_eq!(paths, vec!["src/math.ts"]);
}

#[test]
fn test_tree_skips_denied_dirs() {
    let tmp = fixture();
    let mut cmd = testscout();
    cmd.args(["tree", "--path", tmp.path().to_str().expect("utf8 path")]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("math.test.ts"))
        .stdout(predicate::str::contains("node_modules").not());
}

#[test]
fn test_completions_bash() {
    let mut cmd = testscout();
    cmd.args(["completions", "bash"]);
    cmd.assert().success().stdout(predicate::str::contains("testscout"));
}
