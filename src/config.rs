//! Configuration discovery and effective settings resolution.
//!
//! Valigate reads `valigate.toml|yaml|yml` from the base directory (or
//! closest ancestor) and merges it with CLI flags into an `Effective`
//! config, constructed once at startup. Defaults:
//! - `fail_at`: `error`
//! - `verbosity_level`: `information`
//! - `output`: `human`
//! - `annotations`, `suppress_display_mismatches`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::severity::Severity;

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `valigate.toml|yaml`.
pub struct FileConfig {
    pub fail_at: Option<Severity>,
    pub verbosity_level: Option<Severity>,
    pub output: Option<String>,
    pub annotations: Option<bool>,
    pub stats_file: Option<String>,
    #[serde(default)]
    pub ignored_issues: Vec<String>,
    pub suppress_display_mismatches: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the analyzer after applying
/// precedence.
pub struct Effective {
    pub base_dir: PathBuf,
    pub fail_at: Severity,
    pub verbosity_level: Severity,
    pub output: String,
    pub annotations: bool,
    pub stats_file: Option<PathBuf>,
    pub ignored_issues: Vec<PathBuf>,
    pub suppress_display_mismatches: bool,
}

/// CLI-side overrides handed to `resolve_effective`. `None` means the flag
/// was not given.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub base_dir: Option<String>,
    pub fail_at: Option<Severity>,
    pub verbosity_level: Option<Severity>,
    pub output: Option<String>,
    pub annotations: bool,
    pub stats_file: Option<String>,
    pub ignored_issues: Vec<String>,
    pub suppress_display_mismatches: bool,
}

/// Walk upward from `start` to detect the base directory.
///
/// Stops when a `valigate.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_base_dir(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("valigate.toml").exists()
            || cur.join("valigate.yaml").exists()
            || cur.join("valigate.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `FileConfig` from `valigate.toml` or `valigate.yaml|yml` if present.
///
/// A present-but-malformed config file is an error, not a fallback to
/// defaults: a typo'd `fail_at` silently weakening the gate is exactly the
/// kind of drift this tool exists to catch.
pub fn load_config(root: &Path) -> Result<Option<FileConfig>, String> {
    let toml_path = root.join("valigate.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path)
            .map_err(|e| format!("cannot read {}: {}", toml_path.display(), e))?;
        let cfg: FileConfig = toml::from_str(&s)
            .map_err(|e| format!("malformed {}: {}", toml_path.display(), e))?;
        return Ok(Some(cfg));
    }
    for yml in ["valigate.yaml", "valigate.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p)
                .map_err(|e| format!("cannot read {}: {}", p.display(), e))?;
            let cfg: FileConfig = serde_yaml::from_str(&s)
                .map_err(|e| format!("malformed {}: {}", p.display(), e))?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and
/// defaults. Rejects a verbosity level that would hide issues at or above
/// the fail threshold.
pub fn resolve_effective(cli: CliOverrides) -> Result<Effective, String> {
    let start = PathBuf::from(cli.base_dir.as_deref().unwrap_or("."));
    let base_dir = detect_base_dir(&start);
    let cfg = load_config(&base_dir)?.unwrap_or_default();

    let fail_at = cli.fail_at.or(cfg.fail_at).unwrap_or(Severity::Error);
    let verbosity_level = cli
        .verbosity_level
        .or(cfg.verbosity_level)
        .unwrap_or(Severity::Information);
    if verbosity_level > fail_at {
        return Err(format!(
            "verbosity level '{}' would hide issues at the fail threshold '{}'",
            verbosity_level, fail_at
        ));
    }

    let output = cli
        .output
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(format!("unknown output mode '{}' (human|json)", output));
    }

    let annotations = cli.annotations || cfg.annotations.unwrap_or(false);
    let suppress_display_mismatches =
        cli.suppress_display_mismatches || cfg.suppress_display_mismatches.unwrap_or(false);

    let stats_file = cli
        .stats_file
        .or(cfg.stats_file)
        .map(|p| resolve_path(&base_dir, &p));

    // CLI rule files replace (not extend) configured ones when given.
    let ignored_issues = if cli.ignored_issues.is_empty() {
        cfg.ignored_issues
    } else {
        cli.ignored_issues
    }
    .iter()
    .map(|p| resolve_path(&base_dir, p))
    .collect();

    Ok(Effective {
        base_dir,
        fail_at,
        verbosity_level,
        output,
        annotations,
        stats_file,
        ignored_issues,
        suppress_display_mismatches,
    })
}

fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        p
    } else {
        base_dir.join(p)
    }
}
