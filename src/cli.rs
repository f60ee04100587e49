//! CLI arguments and subcommands for proctail.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use proctail::MalformedRegionPolicy;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format of the per-process report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "proctail",
    about = "Rebuild per-process smaps data from tailed /proc output",
    long_about = "Rebuild per-process smaps data from tailed /proc output.\n\n\
                  Reads the merged output of a tool tailing many /proc/<pid>/smaps and \
                  /proc/<pid>/cmdline files (separated by '==> path <==' marker lines) \
                  and reconstructs memory regions, command lines and PSS aggregates \
                  per process.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides the config file)
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long, global = true)]
    pub no_config: bool,

    /// What to do with undecodable memory regions: skip or abort
    #[arg(long, global = true)]
    pub on_malformed_region: Option<MalformedRegionPolicy>,

    /// Drop the raw text of sections other than smaps/cmdline
    #[arg(long, global = true)]
    pub drop_raw_sections: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a captured stream and print per-process aggregates
    Parse {
        /// Capture file (default: stdin, "-" also means stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Only report this pid
        #[arg(short = 'p', long)]
        pid: Option<u32>,

        /// Include every region of each process, in address order
        #[arg(long)]
        regions: bool,
    },

    /// Validate configuration and optionally dry-run a capture
    Check {
        /// Capture file to dry-run
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,
    },

    /// Generate a default configuration file
    Config {
        /// Output file path ("-" or none for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments describing each option (YAML only)
        #[arg(long)]
        commented: bool,
    },
}
