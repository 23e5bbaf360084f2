//! Verdict derivation from classified issues.
//!
//! Fail when the most severe unsuppressed issue reaches the `fail_at`
//! threshold (inclusive), or when any required suppression rule went stale.
//! Stale rules bypass the threshold entirely: they signal policy drift, not
//! an ordinary finding.

use crate::classify::{Classification, StaleRule};
use crate::severity::Severity;

/// Per-severity tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    counts: [usize; 4],
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        self.counts[severity as usize] += 1;
    }

    pub fn get(&self, severity: Severity) -> usize {
        self.counts[severity as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug)]
pub struct Verdict {
    /// Most severe unsuppressed issue; `None` when everything was clean or
    /// suppressed.
    pub highest_unsuppressed_severity: Option<Severity>,
    pub pass: bool,
    /// Counts over the full original issue set, before suppression.
    pub total_counts: SeverityCounts,
    /// Counts over the unsuppressed subset.
    pub surfaced_counts: SeverityCounts,
    pub suppressed_count: usize,
    /// Subset of `suppressed_count` handled by the built-in display filter.
    pub display_suppressed: usize,
    pub stale_rules: Vec<StaleRule>,
}

pub fn decide(classification: &Classification, fail_at: Severity) -> Verdict {
    let mut total_counts = SeverityCounts::default();
    let mut surfaced_counts = SeverityCounts::default();
    for issue in &classification.surfaced {
        total_counts.add(issue.severity);
        surfaced_counts.add(issue.severity);
    }
    for issue in &classification.suppressed {
        total_counts.add(issue.severity);
    }

    let highest = classification
        .surfaced
        .iter()
        .map(|i| i.severity)
        .max();

    let threshold_hit = highest.is_some_and(|sev| sev >= fail_at);
    let pass = !threshold_hit && classification.stale_rules.is_empty();

    Verdict {
        highest_unsuppressed_severity: highest,
        pass,
        total_counts,
        surfaced_counts,
        suppressed_count: classification.suppressed.len(),
        display_suppressed: classification.display_suppressed,
        stale_rules: classification.stale_rules.clone(),
    }
}
