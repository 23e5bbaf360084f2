//! Rendering of classified issues and the verdict.
//!
//! Supports `human` (default, optionally colorized) and `json` outputs, plus
//! CI annotation lines and a machine-readable stats artifact. Rendering has
//! no decision authority: everything shown here was computed upstream.
//!
//! The verbosity filter applies to the human rendering only. The machine
//! channels (JSON output and annotation lines) always carry every surfaced
//! issue; their consumers filter for themselves.

use std::fs;
use std::io;
use std::path::Path;

use owo_colors::OwoColorize;
use serde_json::{json, Value as JsonVal};

use crate::classify::Classification;
use crate::report::Issue;
use crate::severity::Severity;
use crate::verdict::Verdict;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// `human` or `json`.
    pub output: String,
    /// Least severe level still rendered; more severe is always shown.
    pub verbosity: Severity,
    /// Also emit `severity: file: message` lines for CI annotation parsers.
    pub annotations: bool,
}

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print the run's results in the requested format.
pub fn print_results(classification: &Classification, verdict: &Verdict, opts: &RenderOptions) {
    match opts.output.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_json(classification, verdict)).unwrap()
        ),
        _ => {
            let color = use_colors(&opts.output);
            print_human(classification, verdict, opts.verbosity, color);
            if opts.annotations {
                for issue in &classification.surfaced {
                    println!("{}", annotation_line(issue));
                }
            }
        }
    }
}

fn print_human(
    classification: &Classification,
    verdict: &Verdict,
    verbosity: Severity,
    color: bool,
) {
    // One block per resource, blocks in discovery order; inside a block the
    // most severe issues come first, discovery order breaking ties.
    for (header, issues) in group_by_resource(&classification.surfaced) {
        let shown: Vec<&Issue> = sorted_for_display(&issues, verbosity);
        if shown.is_empty() {
            continue;
        }
        if color {
            println!("{}", header.bold());
        } else {
            println!("{}", header);
        }
        for issue in shown {
            println!("{}", render_issue(issue, color));
        }
        println!();
    }

    for stale in &verdict.stale_rules {
        let msg = format!(
            "✖ stale suppression rule: '{}' / '{}' / '{}' matched no issue in this run",
            stale.resource_pattern, stale.location_pattern, stale.message_pattern
        );
        if color {
            println!("{}", msg.red().bold());
        } else {
            println!("{}", msg);
        }
    }

    print_statistics(verdict, color);

    if verdict.pass {
        let line = "All well";
        if color {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    } else {
        let line = if verdict.stale_rules.is_empty() {
            "There were issues at or above your fail threshold!"
        } else {
            "Suppression rules are stale or issues exceeded your fail threshold!"
        };
        if color {
            println!("{}", line.red().bold());
        } else {
            println!("{}", line);
        }
    }
}

fn print_statistics(verdict: &Verdict, color: bool) {
    if verdict.total_counts.total() == 0 && verdict.stale_rules.is_empty() {
        return;
    }
    let header = "+++ Statistics +++";
    if color {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }
    for sev in Severity::ALL.iter().rev() {
        let total = verdict.total_counts.get(*sev);
        if total > 0 {
            println!(
                "- {} {} messages ({} surfaced)",
                total,
                sev,
                verdict.surfaced_counts.get(*sev)
            );
        }
    }
    if verdict.suppressed_count > 0 {
        println!("- {} suppressed", verdict.suppressed_count);
    }
    if verdict.display_suppressed > 0 {
        println!(
            "- {} display mismatches filtered",
            verdict.display_suppressed
        );
    }
    if !verdict.stale_rules.is_empty() {
        println!("- {} stale suppression rules", verdict.stale_rules.len());
    }
}

/// `== file (id)` blocks in discovery order, mirroring the validator's
/// per-file layout.
fn group_by_resource(issues: &[Issue]) -> Vec<(String, Vec<Issue>)> {
    let mut groups: Vec<(String, Vec<Issue>)> = Vec::new();
    for issue in issues {
        let header = if issue.resource_id != issue.file {
            format!("== {} ({})", issue.file, issue.resource_id)
        } else {
            format!("== {}", issue.file)
        };
        match groups.last_mut() {
            Some((h, list)) if *h == header => list.push(issue.clone()),
            _ => groups.push((header, vec![issue.clone()])),
        }
    }
    groups
}

/// Filter to `severity >= verbosity` and order by descending severity,
/// keeping discovery order within a severity (stable sort).
fn sorted_for_display<'a>(issues: &'a [Issue], verbosity: Severity) -> Vec<&'a Issue> {
    let mut shown: Vec<&Issue> = issues.iter().filter(|i| i.severity >= verbosity).collect();
    shown.sort_by(|a, b| b.severity.cmp(&a.severity));
    shown
}

fn render_issue(issue: &Issue, color: bool) -> String {
    let sev = if color {
        match issue.severity {
            Severity::Fatal | Severity::Error => issue.severity.to_string().red().bold().to_string(),
            Severity::Warning => issue.severity.to_string().yellow().bold().to_string(),
            Severity::Information => issue.severity.to_string().blue().bold().to_string(),
        }
    } else {
        issue.severity.to_string()
    };
    let position = match (issue.line, issue.column) {
        (Some(line), Some(col)) => format!(" ({}, {})", line, col),
        (Some(line), None) => format!(" ({}, ?)", line),
        _ => String::new(),
    };
    let at = if issue.location.is_empty() {
        String::new()
    } else {
        format!(" at {}", issue.location)
    };
    format!("  -  {}{}{}:\n     {}", sev, at, position, issue.message)
}

/// One line per surfaced issue in the `severity: file: message` form CI
/// annotation parsers consume. Deliberately not verbosity-filtered, like
/// the JSON output.
fn annotation_line(issue: &Issue) -> String {
    format!("{}: {}: {}", issue.severity, issue.file, issue.message)
}

/// Stats artifact: per-severity totals and surfaced counts, suppression
/// tallies, stale-rule count, and the final verdict.
pub fn compose_stats_json(verdict: &Verdict) -> JsonVal {
    let mut total = serde_json::Map::new();
    let mut surfaced = serde_json::Map::new();
    for sev in Severity::ALL {
        total.insert(sev.to_string(), json!(verdict.total_counts.get(sev)));
        surfaced.insert(sev.to_string(), json!(verdict.surfaced_counts.get(sev)));
    }
    json!({
        "pass": verdict.pass,
        "highest_unsuppressed_severity": verdict.highest_unsuppressed_severity,
        "issues": { "total": total, "surfaced": surfaced },
        "suppressed": verdict.suppressed_count,
        "display_suppressed": verdict.display_suppressed,
        "stale_rules": verdict.stale_rules.len(),
    })
}

/// Full JSON output: surfaced issues plus the stats object.
pub fn compose_json(classification: &Classification, verdict: &Verdict) -> JsonVal {
    let issues: Vec<JsonVal> = classification
        .surfaced
        .iter()
        .map(|i| {
            json!({
                "resource": i.resource_id,
                "file": i.file,
                "location": i.location,
                "severity": i.severity,
                "message": i.message,
                "line": i.line,
                "column": i.column,
            })
        })
        .collect();
    let stale: Vec<JsonVal> = verdict
        .stale_rules
        .iter()
        .map(|s| {
            json!({
                "resource": s.resource_pattern,
                "location": s.location_pattern,
                "message": s.message_pattern,
            })
        })
        .collect();
    json!({
        "issues": issues,
        "stale_rules": stale,
        "stats": compose_stats_json(verdict),
    })
}

pub fn write_stats_file(path: &Path, verdict: &Verdict) -> io::Result<()> {
    fs::write(
        path,
        serde_json::to_string_pretty(&compose_stats_json(verdict)).unwrap(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::StaleRule;
    use crate::verdict::{SeverityCounts, Verdict};

    fn issue(severity: Severity, message: &str) -> Issue {
        Issue {
            resource_id: "Patient/123".into(),
            file: "patient.json".into(),
            location: "Patient.name".into(),
            severity,
            message: message.into(),
            line: Some(3),
            column: Some(9),
        }
    }

    fn verdict_for(surfaced: &[Issue], suppressed: usize, stale: usize, pass: bool) -> Verdict {
        let mut total = SeverityCounts::default();
        let mut surf = SeverityCounts::default();
        for i in surfaced {
            total.add(i.severity);
            surf.add(i.severity);
        }
        Verdict {
            highest_unsuppressed_severity: surfaced.iter().map(|i| i.severity).max(),
            pass,
            total_counts: total,
            surfaced_counts: surf,
            suppressed_count: suppressed,
            display_suppressed: 0,
            stale_rules: (0..stale)
                .map(|_| StaleRule {
                    resource_pattern: "Patient/123".into(),
                    location_pattern: "*".into(),
                    message_pattern: "m".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_verbosity_filter_and_ordering() {
        // Scenario E: information hidden at warning verbosity; more severe
        // issues come first.
        let issues = vec![
            issue(Severity::Information, "fyi"),
            issue(Severity::Warning, "first warning"),
            issue(Severity::Error, "boom"),
            issue(Severity::Warning, "second warning"),
        ];
        let shown = sorted_for_display(&issues, Severity::Warning);
        let messages: Vec<&str> = shown.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["boom", "first warning", "second warning"]);
    }

    #[test]
    fn test_annotation_line_form() {
        let line = annotation_line(&issue(Severity::Error, "Missing id"));
        assert_eq!(line, "error: patient.json: Missing id");
    }

    #[test]
    fn test_compose_stats_json_shape() {
        let surfaced = vec![issue(Severity::Warning, "w")];
        let v = verdict_for(&surfaced, 2, 1, false);
        let out = compose_stats_json(&v);
        assert_eq!(out["pass"], false);
        assert_eq!(out["highest_unsuppressed_severity"], "warning");
        assert_eq!(out["issues"]["total"]["warning"], 1);
        assert_eq!(out["issues"]["surfaced"]["warning"], 1);
        assert_eq!(out["issues"]["surfaced"]["error"], 0);
        assert_eq!(out["suppressed"], 2);
        assert_eq!(out["stale_rules"], 1);
    }

    #[test]
    fn test_compose_json_includes_issues_and_stale_rules() {
        let surfaced = vec![issue(Severity::Error, "Missing id")];
        let v = verdict_for(&surfaced, 0, 1, false);
        let c = Classification {
            surfaced,
            suppressed: vec![],
            display_suppressed: 0,
            stale_rules: v.stale_rules.clone(),
        };
        let out = compose_json(&c, &v);
        assert_eq!(out["issues"][0]["severity"], "error");
        assert_eq!(out["issues"][0]["line"], 3);
        assert_eq!(out["stale_rules"][0]["resource"], "Patient/123");
        assert_eq!(out["stats"]["pass"], false);
    }

    #[test]
    fn test_stats_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let v = verdict_for(&[issue(Severity::Error, "x")], 0, 0, false);
        write_stats_file(&path, &v).unwrap();
        let back: JsonVal = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["issues"]["total"]["error"], 1);
    }

    #[test]
    fn test_group_headers_show_resource_id_when_distinct() {
        let groups = group_by_resource(&[issue(Severity::Error, "x")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "== patient.json (Patient/123)");

        let mut no_id = issue(Severity::Error, "x");
        no_id.resource_id = no_id.file.clone();
        let groups = group_by_resource(&[no_id]);
        assert_eq!(groups[0].0, "== patient.json");
    }
}
