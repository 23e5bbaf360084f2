//! Parser for the external validator's issue report.
//!
//! The validator writes one FHIR `OperationOutcome` per checked file, either
//! as a single resource or wrapped in a `Bundle`. The analyzer treats that
//! schema as an externally-owned contract: fields it cannot interpret fail
//! the parse with `ReportFormat` instead of being dropped.
//!
//! Besides the issue list, the parser exposes the *validated set*: every
//! (resource id, file path) pair the validator looked at, including clean
//! files. Stale-rule detection needs that set to tell "rule never matched"
//! apart from "resource wasn't part of this run".

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::AnalyzeError;
use crate::severity::Severity;

const FILE_EXTENSION_URL: &str = "http://hl7.org/fhir/StructureDefinition/operationoutcome-file";
const LINE_EXTENSION_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/operationoutcome-issue-line";
const COL_EXTENSION_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/operationoutcome-issue-col";

/// Message the validator emits as the sole issue of a clean file.
const ALL_OK: &str = "All OK";
const NO_DESCRIPTION: &str = "(no description provided)";

/// One reported problem, immutable once parsed.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Explicit resource id when available, otherwise the file path.
    pub resource_id: String,
    /// File path as shown to the user (relative to the base dir when possible).
    pub file: String,
    /// FHIRPath expression or element identifier; empty when not reported.
    pub location: String,
    pub severity: Severity,
    pub message: String,
    pub line: Option<i64>,
    pub column: Option<i64>,
}

/// A resource the validator checked in this run, clean or not.
#[derive(Debug, Clone)]
pub struct ValidatedResource {
    pub resource_id: Option<String>,
    pub file: String,
}

#[derive(Debug)]
pub struct Report {
    /// Issues in discovery order.
    pub issues: Vec<Issue>,
    pub validated: Vec<ValidatedResource>,
}

#[derive(Deserialize)]
struct RawOutcome {
    #[serde(default)]
    extension: Vec<RawExtension>,
    #[serde(default)]
    issue: Vec<RawIssue>,
}

#[derive(Deserialize)]
struct RawExtension {
    url: String,
    #[serde(rename = "valueString")]
    value_string: Option<String>,
    #[serde(rename = "valueInteger")]
    value_integer: Option<i64>,
}

#[derive(Deserialize)]
struct RawIssue {
    severity: Option<String>,
    #[serde(default)]
    diagnostics: Option<String>,
    #[serde(default)]
    details: Option<RawDetails>,
    #[serde(default)]
    expression: Vec<String>,
    #[serde(default)]
    extension: Vec<RawExtension>,
}

#[derive(Deserialize)]
struct RawDetails {
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawBundleEntry {
    resource: Json,
}

/// Parse the validator report at `path`. Resource file paths in the report
/// are resolved and relativized against `base_dir`.
pub fn parse_report(path: &Path, base_dir: &Path) -> Result<Report, AnalyzeError> {
    if !path.exists() {
        return Err(AnalyzeError::ReportMissing {
            path: path.to_path_buf(),
        });
    }
    let data = fs::read_to_string(path).map_err(|e| AnalyzeError::io(path, e))?;
    let json: Json = serde_json::from_str(&data).map_err(|e| AnalyzeError::ReportFormat {
        path: path.to_path_buf(),
        detail: format!("not valid JSON: {}", e),
    })?;

    let outcomes = collect_outcomes(path, json)?;
    let mut issues: Vec<Issue> = Vec::new();
    let mut validated: Vec<ValidatedResource> = Vec::new();

    for outcome in outcomes {
        let file = outcome
            .extension
            .iter()
            .find(|e| e.url == FILE_EXTENSION_URL)
            .and_then(|e| e.value_string.clone())
            .ok_or_else(|| AnalyzeError::ReportFormat {
                path: path.to_path_buf(),
                detail: "OperationOutcome carries no file extension".into(),
            })?;

        let display = display_path(&file, base_dir);
        let resource_id = read_resource_id(&file, base_dir);
        validated.push(ValidatedResource {
            resource_id: resource_id.clone(),
            file: display.clone(),
        });

        // A clean file still yields one informational "All OK" issue, which
        // is not a finding.
        if is_all_ok(&outcome.issue) {
            continue;
        }

        let id_for_issues = resource_id.unwrap_or_else(|| display.clone());
        for raw in outcome.issue {
            issues.push(convert_issue(path, raw, &id_for_issues, &display)?);
        }
    }

    Ok(Report { issues, validated })
}

fn collect_outcomes(path: &Path, json: Json) -> Result<Vec<RawOutcome>, AnalyzeError> {
    let kind = json
        .get("resourceType")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    match kind.as_str() {
        "OperationOutcome" => Ok(vec![decode_outcome(path, json)?]),
        "Bundle" => {
            let entries: Vec<RawBundleEntry> =
                serde_json::from_value(json.get("entry").cloned().unwrap_or(Json::Array(vec![])))
                    .map_err(|e| AnalyzeError::ReportFormat {
                        path: path.to_path_buf(),
                        detail: format!("malformed Bundle entries: {}", e),
                    })?;
            entries
                .into_iter()
                .map(|entry| decode_outcome(path, entry.resource))
                .collect()
        }
        other => Err(AnalyzeError::ReportFormat {
            path: path.to_path_buf(),
            detail: format!(
                "expected OperationOutcome or Bundle, found '{}'",
                if other.is_empty() { "(none)" } else { other }
            ),
        }),
    }
}

fn decode_outcome(path: &Path, json: Json) -> Result<RawOutcome, AnalyzeError> {
    let kind = json.get("resourceType").and_then(Json::as_str);
    if kind != Some("OperationOutcome") {
        return Err(AnalyzeError::ReportFormat {
            path: path.to_path_buf(),
            detail: format!(
                "expected OperationOutcome, found '{}'",
                kind.unwrap_or("(none)")
            ),
        });
    }
    serde_json::from_value(json).map_err(|e| AnalyzeError::ReportFormat {
        path: path.to_path_buf(),
        detail: format!("malformed OperationOutcome: {}", e),
    })
}

fn convert_issue(
    path: &Path,
    raw: RawIssue,
    resource_id: &str,
    file: &str,
) -> Result<Issue, AnalyzeError> {
    let severity_str = raw.severity.as_deref().ok_or_else(|| AnalyzeError::ReportFormat {
        path: path.to_path_buf(),
        detail: format!("issue without severity in {}", file),
    })?;
    let severity: Severity = severity_str.parse().map_err(|e| AnalyzeError::ReportFormat {
        path: path.to_path_buf(),
        detail: format!("{} in {}", e, file),
    })?;

    Ok(Issue {
        resource_id: resource_id.to_string(),
        file: file.to_string(),
        location: raw.expression.first().cloned().unwrap_or_default(),
        severity,
        message: issue_message(&raw),
        line: find_integer(&raw.extension, LINE_EXTENSION_URL),
        column: find_integer(&raw.extension, COL_EXTENSION_URL),
    })
}

fn issue_message(raw: &RawIssue) -> String {
    raw.details
        .as_ref()
        .and_then(|d| d.text.clone())
        .or_else(|| raw.diagnostics.clone())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

fn is_all_ok(issues: &[RawIssue]) -> bool {
    issues.len() == 1
        && issues[0].severity.as_deref() == Some("information")
        && issue_message(&issues[0]) == ALL_OK
}

fn find_integer(extensions: &[RawExtension], url: &str) -> Option<i64> {
    extensions
        .iter()
        .find(|e| e.url == url)
        .and_then(|e| e.value_integer)
}

/// Best-effort lookup of the resource's explicit id: read the validated file
/// (JSON) and take its top-level `id`. Falls back to `None` when the file is
/// missing, unreadable, or id-less; the file path then identifies the
/// resource.
fn read_resource_id(file: &str, base_dir: &Path) -> Option<String> {
    let candidate = PathBuf::from(file);
    let resolved = if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    };
    let data = fs::read_to_string(resolved).ok()?;
    let json: Json = serde_json::from_str(&data).ok()?;
    json.get("id").and_then(Json::as_str).map(str::to_string)
}

/// Render the reported file path relative to `base_dir` when possible.
fn display_path(file: &str, base_dir: &Path) -> String {
    let p = Path::new(file);
    if p.is_absolute() {
        if let Some(rel) = pathdiff::diff_paths(p, base_dir) {
            return rel.to_string_lossy().to_string();
        }
    }
    file.to_string()
}
