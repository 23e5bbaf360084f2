//! Issue classification against the suppression policy.
//!
//! Matching is issue-first: every rule matching an issue is marked used, but
//! the issue is suppressed once regardless of how many rules matched. After
//! the pass, required rules that stayed unused are checked for staleness
//! against the validated set — a rule for a resource that was never part of
//! this run is simply inapplicable, not stale.

use crate::report::{Issue, Report};
use crate::rules::{IgnoreRule, SuppressionPolicy};

/// A required suppression rule that matched nothing it applied to. Policy
/// drift: either the rule is obsolete or the validator stopped reporting the
/// issue it was written to hide.
#[derive(Debug, Clone)]
pub struct StaleRule {
    pub resource_pattern: String,
    pub location_pattern: String,
    pub message_pattern: String,
}

#[derive(Debug, Default)]
pub struct Classification {
    /// Issues that passed through unsuppressed, in discovery order.
    pub surfaced: Vec<Issue>,
    /// Issues suppressed by user rules or the built-in display filter.
    pub suppressed: Vec<Issue>,
    /// How many of `suppressed` came from the built-in display filter.
    pub display_suppressed: usize,
    pub stale_rules: Vec<StaleRule>,
}

/// Run the single classification pass. `used` flags on `policy` are mutated
/// here and nowhere else.
pub fn classify(
    report: &Report,
    policy: &mut SuppressionPolicy,
    suppress_display_mismatches: bool,
) -> Classification {
    let mut out = Classification::default();

    for issue in &report.issues {
        // User rules are matched even for issues the built-in display
        // filter consumes, so a required rule written for such an issue
        // still counts as used and cannot go stale.
        let mut matched = false;
        for rule in policy.rules_mut() {
            if rule_matches(rule, issue) {
                rule.used = true;
                matched = true;
            }
        }

        if suppress_display_mismatches && is_display_mismatch(&issue.message) {
            out.display_suppressed += 1;
            out.suppressed.push(issue.clone());
            continue;
        }
        if matched {
            out.suppressed.push(issue.clone());
        } else {
            out.surfaced.push(issue.clone());
        }
    }

    for rule in policy.rules() {
        if rule.used || !rule.require_occurrence {
            continue;
        }
        if applies_to_run(rule, report) {
            out.stale_rules.push(StaleRule {
                resource_pattern: rule.resource_pattern.source().to_string(),
                location_pattern: rule.location_pattern.source().to_string(),
                message_pattern: rule.message_pattern.clone(),
            });
        }
    }

    out
}

fn rule_matches(rule: &IgnoreRule, issue: &Issue) -> bool {
    (rule.resource_pattern.matches(&issue.resource_id) || rule.resource_pattern.matches(&issue.file))
        && rule.location_pattern.matches(&issue.location)
        && issue.message.starts_with(&rule.message_pattern)
}

fn applies_to_run(rule: &IgnoreRule, report: &Report) -> bool {
    report.validated.iter().any(|v| {
        v.resource_id
            .as_deref()
            .is_some_and(|id| rule.resource_pattern.matches(id))
            || rule.resource_pattern.matches(&v.file)
    })
}

/// The validator flags terminology display mismatches with these
/// diagnostics. They are noise for most pipelines and can be suppressed as
/// a category, independent of user rules.
fn is_display_mismatch(message: &str) -> bool {
    message.starts_with("Wrong Display Name")
        || message.contains("is not a valid display for the code")
}
