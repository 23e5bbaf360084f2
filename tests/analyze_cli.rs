use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const FILE_EXT: &str = "http://hl7.org/fhir/StructureDefinition/operationoutcome-file";

fn outcome(file: &str, issues: &str) -> String {
    format!(
        r#"{{
            "resourceType": "OperationOutcome",
            "extension": [{{"url": "{}", "valueString": "{}"}}],
            "issue": [{}]
        }}"#,
        FILE_EXT, file, issues
    )
}

fn issue(severity: &str, message: &str) -> String {
    format!(
        r#"{{"severity":"{}","code":"invalid","details":{{"text":"{}"}},"expression":["Patient.name[0]"]}}"#,
        severity, message
    )
}

fn run_valigate(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_valigate"))
        .args(args)
        .arg("--base-dir")
        .arg(dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("run valigate")
}

#[test]
fn warning_below_error_threshold_passes() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("warning", "Check this"))).unwrap();

    let out = run_valigate(dir.path(), &[report.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {} stderr: {}", stdout, String::from_utf8_lossy(&out.stderr));
    assert!(stdout.contains("warning"));
    assert!(stdout.contains("Check this"));
    assert!(stdout.contains("All well"));
}

#[test]
fn error_issue_fails_with_exit_one_and_annotations() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("error", "Missing id"))).unwrap();

    let out = run_valigate(dir.path(), &[report.to_str().unwrap(), "--annotations"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("== patient.json"));
    assert!(stdout.contains("error: patient.json: Missing id"), "stdout: {}", stdout);
    assert!(stdout.contains("fail threshold"));
}

#[test]
fn suppressed_error_passes_and_stats_show_both_views() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("error", "Missing id"))).unwrap();
    let rules = dir.path().join("ignored.yml");
    fs::write(
        &rules,
        r#"
patient.json:
  ignored issues:
    "Patient.name[0]":
      - message: "Missing id"
        reason: "Fixture intentionally omits the id"
"#,
    )
    .unwrap();
    let stats = dir.path().join("stats.json");

    let out = run_valigate(
        dir.path(),
        &[
            report.to_str().unwrap(),
            "--ignored-issues",
            rules.to_str().unwrap(),
            "--stats-file",
            stats.to_str().unwrap(),
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&stats).unwrap()).unwrap();
    assert_eq!(stats["pass"], true);
    assert_eq!(stats["suppressed"], 1);
    assert_eq!(stats["issues"]["total"]["error"], 1);
    assert_eq!(stats["issues"]["surfaced"]["error"], 0);
}

#[test]
fn stale_required_rule_fails_a_clean_run() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    let ok = r#"{"severity":"information","code":"informational","details":{"text":"All OK"}}"#;
    fs::write(&report, outcome("patient.json", ok)).unwrap();
    let rules = dir.path().join("ignored.yml");
    fs::write(
        &rules,
        r#"
patient.json:
  ignored issues:
    "Patient.name[0]":
      - message: "Missing id"
        reason: "No longer reported?"
"#,
    )
    .unwrap();

    let out = run_valigate(
        dir.path(),
        &[report.to_str().unwrap(), "--ignored-issues", rules.to_str().unwrap()],
    );
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("stale suppression rule"), "stdout: {}", stdout);
}

#[test]
fn missing_report_exits_with_config_error_code() {
    let dir = tempdir().unwrap();
    let out = run_valigate(dir.path(), &[dir.path().join("absent.json").to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn invalid_rule_document_aborts_before_analysis() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("error", "Missing id"))).unwrap();
    let rules = dir.path().join("ignored.yml");
    fs::write(
        &rules,
        "patient.json:\n  ignored issues:\n    loc:\n      - message: Missing id\n",
    )
    .unwrap();

    let out = run_valigate(
        dir.path(),
        &[report.to_str().unwrap(), "--ignored-issues", rules.to_str().unwrap()],
    );
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("reason"), "stderr: {}", stderr);
}

#[test]
fn malformed_config_file_aborts_instead_of_defaulting() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("valigate.toml"), "fail_at = \"warnign\"\n").unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("warning", "Check this"))).unwrap();

    let out = run_valigate(dir.path(), &[report.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("malformed"), "stderr: {}", stderr);
}

#[test]
fn json_output_carries_verdict_and_issues() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("error", "Missing id"))).unwrap();

    let out = run_valigate(dir.path(), &[report.to_str().unwrap(), "--output", "json"]);
    assert_eq!(out.status.code(), Some(1));
    let parsed: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is valid JSON");
    assert_eq!(parsed["stats"]["pass"], false);
    assert_eq!(parsed["issues"][0]["message"], "Missing id");
}

#[test]
fn repeated_runs_produce_identical_statistics() {
    let dir = tempdir().unwrap();
    let report = dir.path().join("report.json");
    fs::write(&report, outcome("patient.json", &issue("error", "Missing id"))).unwrap();

    let first = run_valigate(dir.path(), &[report.to_str().unwrap(), "--output", "json"]);
    let second = run_valigate(dir.path(), &[report.to_str().unwrap(), "--output", "json"]);
    assert_eq!(first.status.code(), second.status.code());
    assert_eq!(first.stdout, second.stdout);
}
