//! Config command implementation.
//!
//! Generates default configuration files and renders the effective
//! configuration for `--show-config`.

use anyhow::Context;
use std::fs;
use std::path::Path;

use crate::cli::ConfigFormat;
use proctail::ParserConfig;

/// Serializes a configuration in the requested format.
fn render_config(config: &ParserConfig, format: ConfigFormat) -> anyhow::Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows the effective configuration (CLI > config file > defaults).
pub fn show_config(config: &ParserConfig, format: ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

/// Generates a configuration file holding the defaults.
pub fn command_config(
    output: Option<&Path>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let mut content = render_config(&ParserConfig::default(), format)?;
    if commented {
        if let ConfigFormat::Yaml = format {
            content = add_config_comments(content);
        }
    }

    match output {
        Some(path) if path.as_os_str() != "-" => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Configuration written to: {}", path.display());
        }
        _ => print!("{content}"),
    }
    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# proctail configuration
# =======================
#
# on_malformed_region: skip    # skip = drop the bad region, abort = drop the rest of the section
# retain_raw_sections: true    # keep raw text of sections other than smaps/cmdline
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
