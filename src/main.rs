//! proctail - version 0.1.0
//!
//! Command line front end for the tailed /proc stream parser.
//! This is the main entry point that sets up logging, resolves the
//! configuration and dispatches subcommands.

mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use tracing::{debug, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_parse, show_config};
use proctail::{load_config, validate_config, ParserConfig};

/// Maps a configured log level name to a CLI log level.
fn log_level_from_name(name: &str) -> LogLevel {
    match name.to_ascii_lowercase().as_str() {
        "off" => LogLevel::Off,
        "error" => LogLevel::Error,
        "warn" => LogLevel::Warn,
        "debug" => LogLevel::Debug,
        "trace" => LogLevel::Trace,
        _ => LogLevel::Info,
    }
}

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(level: LogLevel) -> anyhow::Result<()> {
    let max_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(max_level) = max_level else {
        return Ok(());
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
fn resolve_config(args: &Args) -> anyhow::Result<ParserConfig> {
    let mut config = if args.no_config {
        ParserConfig::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(policy) = args.on_malformed_region {
        config.on_malformed_region = policy;
    }
    if args.drop_raw_sections {
        config.retain_raw_sections = false;
    }
    if let Some(level) = args.log_level {
        config.log_level = format!("{:?}", level).to_ascii_lowercase();
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = resolve_config(&args)?;

    // Show/check modes run before logging and subcommands
    if args.check_config {
        if let Err(e) = validate_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if args.show_config {
        return show_config(&config, args.config_format);
    }

    setup_logging(log_level_from_name(&config.log_level))?;

    match &args.command {
        Some(Commands::Parse {
            input,
            format,
            pid,
            regions,
        }) => command_parse(input.as_deref(), *format, *pid, *regions, &config),

        Some(Commands::Check { input }) => command_check(input.as_deref(), &config),

        Some(Commands::Config {
            output,
            format,
            commented,
        }) => command_config(output.as_deref(), *format, *commented),

        None => {
            Args::command().print_help()?;
            Ok(())
        }
    }
}
