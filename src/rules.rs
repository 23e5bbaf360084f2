//! Suppression policy loaded from YAML rule documents.
//!
//! A rule file holds one or more YAML documents. Each document is a mapping
//! of resource pattern to an `ignored issues` block, keyed by location
//! pattern, each carrying a list of `{message, reason}` entries. An optional
//! document-level `issues should occur` boolean (default true) applies to
//! every rule in that document:
//!
//! ```yaml
//! Patient/example:
//!   ignored issues:
//!     Patient.name[0]:
//!       - message: "Missing display name"
//!         reason: "Upstream terminology server lags behind the IG"
//! ```
//!
//! Invariants are enforced at load time, before any issue is analyzed: a
//! rule without a reason, or a wildcard resource pattern on a rule that is
//! required to occur, rejects the whole document with `InvalidRule`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value as Yaml;

use crate::error::AnalyzeError;
use crate::pattern::WildcardPattern;

const OCCURRENCE_KEY: &str = "issues should occur";
const IGNORED_ISSUES_KEY: &str = "ignored issues";

/// One suppression directive. Read-only after loading except for the `used`
/// flag, which the classifier sets during its single pass.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub resource_pattern: WildcardPattern,
    pub location_pattern: WildcardPattern,
    /// Literal prefix expected at the start of the issue message. Never a
    /// wildcard.
    pub message_pattern: String,
    /// Mandatory human explanation; documentary only.
    pub reason: String,
    /// When true, the rule must match at least one issue among the resources
    /// validated in the current run.
    pub require_occurrence: bool,
    pub used: bool,
}

/// Ordered collection of ignore rules from all loaded documents.
///
/// Rules are kept as a flat list scanned per issue; both rule and issue
/// counts are bounded by validator output size, so the O(issues x rules)
/// scan is deliberate.
#[derive(Debug, Default)]
pub struct SuppressionPolicy {
    rules: Vec<IgnoreRule>,
}

#[derive(Deserialize)]
struct RawEntry {
    message: Option<String>,
    reason: Option<String>,
}

impl SuppressionPolicy {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and merge every rule document in `paths`, in order.
    pub fn load(paths: &[PathBuf]) -> Result<Self, AnalyzeError> {
        let mut policy = Self::default();
        for path in paths {
            policy.load_file(path)?;
        }
        Ok(policy)
    }

    fn load_file(&mut self, path: &Path) -> Result<(), AnalyzeError> {
        let data = fs::read_to_string(path).map_err(|e| AnalyzeError::io(path, e))?;
        for doc in serde_yaml::Deserializer::from_str(&data) {
            let value = Yaml::deserialize(doc).map_err(|e| invalid(path, format!("not valid YAML: {}", e)))?;
            if value.is_null() {
                continue;
            }
            self.load_document(path, &value)?;
        }
        Ok(())
    }

    fn load_document(&mut self, path: &Path, doc: &Yaml) -> Result<(), AnalyzeError> {
        let mapping = doc
            .as_mapping()
            .ok_or_else(|| invalid(path, "document is not a mapping".into()))?;

        let require_occurrence = match doc.get(OCCURRENCE_KEY) {
            None => true,
            Some(Yaml::Bool(b)) => *b,
            Some(_) => {
                return Err(invalid(
                    path,
                    format!("'{}' must be a boolean", OCCURRENCE_KEY),
                ))
            }
        };

        for (key, value) in mapping {
            let resource = key
                .as_str()
                .ok_or_else(|| invalid(path, "resource pattern keys must be strings".into()))?;
            if resource == OCCURRENCE_KEY {
                continue;
            }
            if value.as_mapping().is_none() {
                return Err(invalid(path, format!("entry for '{}' is not a mapping", resource)));
            }
            let Some(ignored) = value.get(IGNORED_ISSUES_KEY) else {
                // A resource block without ignored issues carries no rules.
                continue;
            };
            let locations = ignored.as_mapping().ok_or_else(|| {
                invalid(
                    path,
                    format!("'{}' for '{}' is not a mapping", IGNORED_ISSUES_KEY, resource),
                )
            })?;

            for (loc_key, entries) in locations {
                let location = loc_key.as_str().ok_or_else(|| {
                    invalid(path, format!("location keys for '{}' must be strings", resource))
                })?;
                let entries: Vec<RawEntry> = serde_yaml::from_value(entries.clone())
                    .map_err(|e| {
                        invalid(
                            path,
                            format!("entries under '{}' / '{}': {}", resource, location, e),
                        )
                    })?;
                for entry in entries {
                    self.rules.push(build_rule(
                        path,
                        resource,
                        location,
                        entry,
                        require_occurrence,
                    )?);
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut [IgnoreRule] {
        &mut self.rules
    }
}

fn build_rule(
    path: &Path,
    resource: &str,
    location: &str,
    entry: RawEntry,
    require_occurrence: bool,
) -> Result<IgnoreRule, AnalyzeError> {
    let message = match entry.message {
        Some(m) if !m.trim().is_empty() => m,
        _ => {
            return Err(invalid(
                path,
                format!("rule for '{}' / '{}' has no message", resource, location),
            ))
        }
    };
    let reason = match entry.reason {
        Some(r) if !r.trim().is_empty() => r,
        _ => {
            return Err(invalid(
                path,
                format!(
                    "rule for '{}' / '{}' suppresses an issue without giving a reason",
                    resource, location
                ),
            ))
        }
    };
    let resource_pattern = WildcardPattern::compile(resource);
    if require_occurrence && resource_pattern.has_wildcard() {
        return Err(invalid(
            path,
            format!(
                "wildcard resource pattern '{}' is only allowed when issues are not required to occur",
                resource
            ),
        ));
    }
    Ok(IgnoreRule {
        resource_pattern,
        location_pattern: WildcardPattern::compile(location),
        message_pattern: message,
        reason,
        require_occurrence,
        used: false,
    })
}

fn invalid(path: &Path, detail: String) -> AnalyzeError {
    AnalyzeError::InvalidRule {
        path: path.to_path_buf(),
        detail,
    }
}
