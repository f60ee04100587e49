//! Configuration management for proctail.
//!
//! This module handles loading and validating the parser configuration from
//! files. It supports YAML, JSON, and TOML formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in configuration files.
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Default configuration file locations, tried in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 5] = [
    "/etc/proctail/proctail.yaml",
    "./proctail.yaml",
    "./proctail.yml",
    "./proctail.json",
    "./proctail.toml",
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid log_level '{0}', expected one of off/error/warn/info/debug/trace")]
    InvalidLogLevel(String),

    #[error("Invalid malformed region policy '{0}', expected 'skip' or 'abort'")]
    InvalidPolicy(String),
}

/// What to do when a memory region record cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRegionPolicy {
    /// Drop the single region, report it and keep going.
    #[default]
    Skip,
    /// Abandon the rest of the section and hand the error to the caller.
    Abort,
}

impl FromStr for MalformedRegionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedRegionPolicy::Skip),
            "abort" => Ok(MalformedRegionPolicy::Abort),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MalformedRegionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRegionPolicy::Skip => write!(f, "skip"),
            MalformedRegionPolicy::Abort => write!(f, "abort"),
        }
    }
}

fn default_retain_raw_sections() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Policy for undecodable memory region records (default: skip)
    #[serde(default, alias = "on-malformed-region")]
    pub on_malformed_region: MalformedRegionPolicy,

    /// Keep raw text of sections other than smaps/cmdline (default: true)
    #[serde(default = "default_retain_raw_sections", alias = "retain-raw-sections")]
    pub retain_raw_sections: bool,

    /// Log level for the command line tool (default: info)
    #[serde(default = "default_log_level", alias = "log-level")]
    pub log_level: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            on_malformed_region: MalformedRegionPolicy::default(),
            retain_raw_sections: default_retain_raw_sections(),
            log_level: default_log_level(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_config(cfg: &ParserConfig) -> Result<(), ConfigError> {
    let level = cfg.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::InvalidLogLevel(cfg.log_level.clone()));
    }
    Ok(())
}

/// Parses configuration text; the extension of `path` selects the format.
pub fn parse_config(content: &str, path: &Path) -> Result<ParserConfig, ConfigError> {
    let config: ParserConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        // Default to YAML
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Configuration loading with multiple format support.
///
/// Without an explicit path the default locations are tried; if no file
/// exists the built-in defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<ParserConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(ParserConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(ParserConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ParserConfig::default();
        assert_eq!(cfg.on_malformed_region, MalformedRegionPolicy::Skip);
        assert!(cfg.retain_raw_sections);
        assert_eq!(cfg.log_level, "info");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_parse_yaml_with_missing_fields() {
        let cfg = parse_config("on_malformed_region: abort\n", Path::new("x.yaml")).unwrap();
        assert_eq!(cfg.on_malformed_region, MalformedRegionPolicy::Abort);
        assert!(cfg.retain_raw_sections);
    }

    #[test]
    fn test_parse_kebab_case_aliases() {
        let cfg = parse_config(
            "on-malformed-region: abort\nretain-raw-sections: false\n",
            Path::new("x.yml"),
        )
        .unwrap();
        assert_eq!(cfg.on_malformed_region, MalformedRegionPolicy::Abort);
        assert!(!cfg.retain_raw_sections);
    }

    #[test]
    fn test_parse_json_and_toml() {
        let cfg = parse_config(r#"{"log_level": "debug"}"#, Path::new("c.json")).unwrap();
        assert_eq!(cfg.log_level, "debug");

        let cfg = parse_config("retain_raw_sections = false\n", Path::new("c.toml")).unwrap();
        assert!(!cfg.retain_raw_sections);
    }

    #[test]
    fn test_invalid_policy_value() {
        let result = parse_config("on_malformed_region: explode\n", Path::new("x.yaml"));
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let cfg = ParserConfig {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<MalformedRegionPolicy>().unwrap(), MalformedRegionPolicy::Skip);
        assert_eq!("ABORT".parse::<MalformedRegionPolicy>().unwrap(), MalformedRegionPolicy::Abort);
        assert!("maybe".parse::<MalformedRegionPolicy>().is_err());
        assert_eq!(MalformedRegionPolicy::Abort.to_string(), "abort");
    }

    #[test]
    fn test_load_missing_explicit_path_gives_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/proctail.yaml"))).unwrap();
        assert_eq!(cfg, ParserConfig::default());
    }
}
