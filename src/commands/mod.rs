//! CLI command implementations for proctail.
//!
//! This module provides implementations for all CLI subcommands:
//! - `parse`: Parse a capture and print per-process aggregates
//! - `check`: Configuration validation and capture dry-run
//! - `config`: Default configuration generation and `--show-config` rendering

pub mod check;
pub mod config;
pub mod parse;

// Re-export command functions
pub use check::command_check;
pub use config::{command_config, show_config};
pub use parse::command_parse;
