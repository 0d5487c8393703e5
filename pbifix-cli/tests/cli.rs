//! End-to-end tests of the `pbifix` binary over a workspace directory tree.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REPORT: &str = "Finance/Sales.Report";
const MODEL: &str = "Finance/Sales Model.SemanticModel/model.bim";
const PAGE_P1: &str = "Finance/Sales.Report/definition/pages/p1/page.json";

fn pbifix() -> Command {
    Command::cargo_bin("pbifix").expect("pbifix binary")
}

fn write_json(root: &Path, rel: &str, value: Value) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn read_json(root: &Path, rel: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(root.join(rel)).unwrap()).unwrap()
}

fn create_temp_root() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();

    write_json(
        root,
        &format!("{REPORT}/definition.pbir"),
        json!({"version": "4.0", "datasetReference": {"byPath": {"path": "../Sales Model.SemanticModel"}}}),
    );
    write_json(root, &format!("{REPORT}/definition/report.json"), json!({}));
    write_json(
        root,
        PAGE_P1,
        json!({"name": "p1", "displayName": "Overview", "width": 1280, "height": 720}),
    );
    write_json(
        root,
        &format!("{REPORT}/definition/pages/p1/visuals/v1/visual.json"),
        json!({"name": "v1", "visual": {"visualType": "donutChart"}}),
    );
    write_json(
        root,
        MODEL,
        json!({
            "name": "Sales Model",
            "compatibilityLevel": 1567,
            "model": {
                "culture": "en-US",
                "tables": [{
                    "name": "Sales",
                    "columns": [{"name": "Amount", "dataType": "decimal", "sourceColumn": "Amount"}],
                    "partitions": [{"name": "Sales", "mode": "import",
                                    "source": {"type": "m", "expression": "let x = 1 in x"}}]
                }]
            }
        }),
    );
    td
}

fn run_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["run", "--workspace", "Finance", "--report", "Sales"];
    args.extend_from_slice(extra);
    args
}

#[test]
fn test_list_fixers_text() {
    pbifix()
        .arg("list-fixers")
        .assert()
        .success()
        .stdout(predicate::str::contains("page-size"))
        .stdout(predicate::str::contains("calc-group-time-intelligence"))
        .stdout(predicate::str::contains("Use 'pbifix explain <key>'"));
}

#[test]
fn test_list_fixers_json() {
    let output = pbifix()
        .args(["list-fixers", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let fixers: Value = serde_json::from_slice(&output.stdout).unwrap();
    let fixers = fixers.as_array().unwrap();
    assert_eq!(fixers.len(), 12);
    assert_eq!(fixers[0]["key"], "upgrade-to-pbir");
    assert_eq!(fixers[11]["layer"], "model");
}

#[test]
fn test_explain_known_fixer() {
    pbifix()
        .args(["explain", "pie-charts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FIXER: Fix Pie Charts"))
        .stdout(predicate::str::contains("Layer:  report"));
}

#[test]
fn test_explain_upgrade_names_service_conversion() {
    pbifix()
        .args(["explain", "upgrade-to-pbir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("the service performs the conversion"));
}

#[test]
fn test_legacy_report_upgrade_fails_on_filesystem_root() {
    let temp = tempfile::tempdir().unwrap();
    write_json(temp.path(), "Finance/Old.Report/report.json", json!({"sections": []}));

    pbifix()
        .current_dir(temp.path())
        .args(["run", "--workspace", "Finance", "--report", "Old"])
        .args(["--fixer", "upgrade-to-pbir", "--mode", "fix"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[failed] Upgrade to PBIR (report)"))
        .stdout(predicate::str::contains("enhanced report format"));
}

#[test]
fn test_explain_unknown_fixer_fails() {
    pbifix()
        .args(["explain", "gauges"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown fixer key: 'gauges'"));
}

#[test]
fn test_scan_writes_nothing() {
    let temp = create_temp_root();
    let before = fs::read_to_string(temp.path().join(PAGE_P1)).unwrap();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "page-size", "--fixer", "pie-charts", "--mode", "scan"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("[would change] Fix Page Size (report)"))
        .stdout(predicate::str::contains("[would change] Fix Pie Charts (report)"))
        .stdout(predicate::str::contains("2 fixers:"));

    assert_eq!(fs::read_to_string(temp.path().join(PAGE_P1)).unwrap(), before);
}

#[test]
fn test_fix_report_layer_needs_no_confirmation() {
    let temp = create_temp_root();

    pbifix()
        .args(["run", "--root"])
        .arg(temp.path())
        .args(["--workspace", "Finance", "--report", "Sales"])
        .args(["--fixer", "page-size", "--mode", "fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[applied] Fix Page Size"));

    let page = read_json(temp.path(), PAGE_P1);
    assert_eq!(page["width"], 1920);
    assert_eq!(page["height"], 1080);
}

#[test]
fn test_model_fix_without_yes_is_blocked() {
    let temp = create_temp_root();
    let before = fs::read_to_string(temp.path().join(MODEL)).unwrap();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "page-size", "--fixer", "calendar-table", "--mode", "fix"]))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("were not confirmed"))
        .stderr(predicate::str::contains("--yes"));

    assert_eq!(fs::read_to_string(temp.path().join(MODEL)).unwrap(), before);
    assert_eq!(read_json(temp.path(), PAGE_P1)["width"], 1280);
}

#[test]
fn test_model_fix_with_yes_saves_model() {
    let temp = create_temp_root();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "calendar-table", "--fixer", "explicit-measures"]))
        .args(["--mode", "fix", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[applied] Add Calendar Table (model)"));

    let model = read_json(temp.path(), MODEL);
    let tables = model["model"]["tables"].as_array().unwrap();
    assert!(tables.iter().any(|t| t["name"] == "Calendar"));
    assert_eq!(model["model"]["culture"], "en-US");
}

#[test]
fn test_no_fixers_is_a_precondition_violation() {
    let temp = create_temp_root();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--mode", "scan"]))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no fixers selected"));
}

#[test]
fn test_unknown_report_fails() {
    let temp = create_temp_root();

    pbifix()
        .current_dir(temp.path())
        .args(["run", "--workspace", "Finance", "--report", "Budget", "--fixer", "page-size"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("report 'Budget' not found"));
}

#[test]
fn test_config_file_supplies_defaults() {
    let temp = create_temp_root();
    fs::write(
        temp.path().join("pbifix.toml"),
        r#"
[defaults]
workspace = "Finance"
report = "Sales"
fixers = ["page-size"]
mode = "fix"

[fixers]
page_width = 1600
page_height = 900
"#,
    )
    .unwrap();

    pbifix()
        .current_dir(temp.path())
        .arg("run")
        .assert()
        .success();

    let page = read_json(temp.path(), PAGE_P1);
    assert_eq!(page["width"], 1600);
    assert_eq!(page["height"], 900);
}

#[test]
fn test_json_log_and_out_file() {
    let temp = create_temp_root();

    let output = pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "pie-charts", "--format", "json", "--out", "log.json"]))
        .output()
        .unwrap();
    assert!(output.status.success());

    let log: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(log["schema"], "pbifix.change_log.v1");
    assert_eq!(log["mode"], "scan");
    assert_eq!(log["entries"][0]["fixer"], "pie-charts");
    assert_eq!(log["entries"][0]["status"], "would_change");

    let written = read_json(temp.path(), "log.json");
    assert_eq!(written["run_id"], log["run_id"]);
}

#[test]
fn test_markdown_log_with_diff() {
    let temp = create_temp_root();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "page-size", "--format", "markdown", "--show-diff"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("# pbifix change log"))
        .stdout(predicate::str::contains("```diff"))
        .stdout(predicate::str::contains("+  \"width\": 1920"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = create_temp_root();
    fs::write(temp.path().join("pbifix.toml"), "[defaults\n").unwrap();

    pbifix()
        .current_dir(temp.path())
        .args(run_args(&["--fixer", "page-size"]))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pbifix.toml"));
}
