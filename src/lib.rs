//! Valigate core library.
//!
//! This crate exposes programmatic APIs for analyzing an external clinical
//! data validator's issue report, applying YAML suppression rules, and
//! deriving a pass/fail verdict with statistics.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `report`: Parser for the validator's OperationOutcome/Bundle output.
//! - `rules`: Suppression policy loaded from YAML rule documents.
//! - `pattern`: Wildcard matching for resource and location patterns.
//! - `classify`: Issue filtering, rule usage tracking, stale-rule detection.
//! - `verdict`: Threshold decision and per-severity statistics.
//! - `output`: Human/JSON printers, CI annotations, stats artifact.
//! - `severity`: The shared severity ordering.
//! - `error`: Load-time error taxonomy.
//! - `utils`: Supporting helpers.
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pattern;
pub mod report;
pub mod rules;
pub mod severity;
pub mod utils;
pub mod verdict;
