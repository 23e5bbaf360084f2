//! Valigate CLI binary entry point.
//! Parses the report, applies suppression rules, decides, and renders.

mod classify;
mod cli;
mod config;
mod error;
mod output;
mod pattern;
mod report;
mod rules;
mod severity;
mod utils;
mod verdict;

use std::path::Path;

use clap::Parser;

use cli::Cli;
use config::CliOverrides;
use output::RenderOptions;

fn main() {
    let cli = Cli::parse();

    let eff = match config::resolve_effective(CliOverrides {
        base_dir: cli.base_dir,
        fail_at: cli.fail_at,
        verbosity_level: cli.verbosity_level,
        output: cli.output,
        annotations: cli.annotations,
        stats_file: cli.stats_file,
        ignored_issues: cli.ignored_issues,
        suppress_display_mismatches: cli.suppress_display_mismatches,
    }) {
        Ok(eff) => eff,
        Err(msg) => {
            eprintln!("{} {}", utils::error_prefix(), msg);
            std::process::exit(2);
        }
    };

    if matches!(config::load_config(&eff.base_dir), Ok(None)) && eff.output != "json" {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No valigate.toml found; using defaults."
        );
    }

    // Load-time failures abort before any issue is analyzed; a partially
    // loaded policy would silently under- or over-suppress.
    let report = match report::parse_report(Path::new(&cli.report), &eff.base_dir) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };
    let mut policy = match rules::SuppressionPolicy::load(&eff.ignored_issues) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };

    let classification = classify::classify(&report, &mut policy, eff.suppress_display_mismatches);
    let verdict = verdict::decide(&classification, eff.fail_at);

    output::print_results(
        &classification,
        &verdict,
        &RenderOptions {
            output: eff.output.clone(),
            verbosity: eff.verbosity_level,
            annotations: eff.annotations,
        },
    );

    if let Some(stats_path) = &eff.stats_file {
        if let Err(e) = output::write_stats_file(stats_path, &verdict) {
            eprintln!(
                "{} {}",
                utils::error_prefix(),
                format!("cannot write stats file {}: {}", stats_path.display(), e)
            );
            std::process::exit(2);
        }
    }

    if !verdict.pass {
        std::process::exit(1);
    }
}
