//! Error taxonomy for report loading and rule loading.
//!
//! All variants here are load-time failures that abort the run before any
//! issue is analyzed. Analysis-time findings (threshold exceeded, stale
//! suppression rules) are not errors; they accumulate into the `Verdict`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The report file does not exist, typically because the external
    /// validator crashed before producing output.
    #[error("report file not found: {}", path.display())]
    ReportMissing { path: PathBuf },

    /// The report exists but cannot be interpreted as validator output.
    #[error("malformed validator report {}: {detail}", path.display())]
    ReportFormat { path: PathBuf, detail: String },

    /// A suppression rule document is malformed or violates a policy
    /// invariant (missing reason, illegal wildcard usage).
    #[error("invalid suppression rule in {}: {detail}", path.display())]
    InvalidRule { path: PathBuf, detail: String },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalyzeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalyzeError::Io {
            path: path.into(),
            source,
        }
    }
}
