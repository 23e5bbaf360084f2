//! Wildcard pattern matching for resource and location patterns.
//!
//! This is deliberately not filesystem globbing. The only metacharacter is
//! `*`, which matches any run of characters *including* path separators
//! (segment-spanning); everything else is compared literally and
//! case-sensitively, anchored at both ends. `Patient/*` therefore matches
//! `Patient/nested/123`, and `*` alone matches every candidate.

use regex::Regex;

/// A compiled wildcard pattern. Compilation happens once at rule load time.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    pub fn compile(pattern: &str) -> Self {
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        for (i, literal) in pattern.split('*').enumerate() {
            if i > 0 {
                re.push_str(".*");
            }
            re.push_str(&regex::escape(literal));
        }
        re.push('$');
        WildcardPattern {
            source: pattern.to_string(),
            // The expression is built from escaped literals and ".*" only,
            // so compilation cannot fail.
            regex: Regex::new(&re).unwrap(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The original pattern text, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_wildcard(&self) -> bool {
        self.source.contains('*')
    }
}
