//! CLI argument parsing via `clap`.

use clap::Parser;

use crate::severity::Severity;

#[derive(Parser)]
#[command(
    name = "valigate",
    version,
    about = "Gate CI on clinical-data validator output",
    long_about = "Valigate — analyze an external validator's issue report, apply suppression rules, and decide pass/fail.\n\nConfiguration precedence: CLI > valigate.toml > defaults.",
    after_help = "Examples:\n  valigate validator-output.json\n  valigate validator-output.json --fail-at warning --ignored-issues known-issues.yml\n  valigate validator-output.json --output json --stats-file stats.json",
    arg_required_else_help = true
)]
/// Top-level CLI options.
pub struct Cli {
    /// Path to the validator's issue report (OperationOutcome or Bundle JSON)
    pub report: String,

    #[arg(long, value_enum, help = "Severity at or above which the run fails (default: error)")]
    pub fail_at: Option<Severity>,

    #[arg(long, value_enum, help = "Least severe level still rendered (default: information)")]
    pub verbosity_level: Option<Severity>,

    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Emit 'severity: file: message' lines for CI annotation parsers")]
    pub annotations: bool,

    #[arg(long, help = "Write the statistics artifact to this JSON file")]
    pub stats_file: Option<String>,

    #[arg(long, help = "YAML file with issues to ignore (repeatable)")]
    pub ignored_issues: Vec<String>,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Suppress terminology display-mismatch issues as a category")]
    pub suppress_display_mismatches: bool,

    #[arg(long, help = "Base directory for resolving resource paths (default: current dir)")]
    pub base_dir: Option<String>,
}
