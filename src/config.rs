//! Configuration management for the document handler CLI.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML configuration file
//! - Merging both into handler options

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::automation::DocumentKind;
use crate::handler::HandlerOptions;
use crate::units::LengthUnit;

/// Project-local configuration file name
pub const PROJECT_CONFIG_FILE: &str = ".cad-doc.toml";

/// Command-line arguments for the document handler
#[derive(Debug, Parser)]
#[command(name = "cad-doc")]
#[command(about = "Scoped CAD document sessions and length unit conversion")]
#[command(version)]
pub struct Args {
    /// Configuration file to load instead of the default locations
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a length between units
    Convert {
        value: f64,
        /// Unit of VALUE (mm, cm, m, km, in, mile); defaults to the configured unit
        unit: Option<LengthUnit>,
        /// Target unit
        #[arg(long, default_value = "mm")]
        to: LengthUnit,
        #[arg(long)]
        json: bool,
    },
    /// Open or create a document in a scoped session and report what happened
    Session {
        /// Existing document to open
        #[arg(long, conflicts_with = "new")]
        file: Option<PathBuf>,
        /// Kind of document to create (Part, Product, Drawing)
        #[arg(long)]
        new: Option<DocumentKind>,
        #[arg(long)]
        json: bool,
    },
}

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub default_unit: Option<LengthUnit>,
    pub session: SessionSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    pub reconnect_on_enter: bool,
    pub default_kind: Option<DocumentKind>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            reconnect_on_enter: HandlerOptions::default().reconnect_on_enter,
            default_kind: None,
        }
    }
}

impl FileConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Load a configuration file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no configuration at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
    /// Log level
    pub log_level: String,
    /// Unit assumed when `convert` is given no unit
    pub default_unit: LengthUnit,
    /// Kind created by `session` when neither a file nor a kind is given
    pub default_kind: Option<DocumentKind>,
    pub handler: HandlerOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: "info".to_string(),
            default_unit: LengthUnit::Mm,
            default_kind: None,
            handler: HandlerOptions::default(),
        }
    }
}

impl Config {
    /// Create configuration from explicit arguments, reading the config
    /// file they point at (or the default locations)
    pub fn from_args(args: &Args) -> Result<Self> {
        let config_path = match &args.config {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("configuration file {} does not exist", path.display());
                }
                Some(path.clone())
            }
            None => Self::default_config_paths()
                .into_iter()
                .find(|path| path.is_file()),
        };

        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Ok(Self::merge(config_path, file, args.log_level.clone()))
    }

    /// Combine a parsed file with command-line overrides
    pub fn merge(
        config_path: Option<PathBuf>,
        file: FileConfig,
        cli_log_level: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            config_path,
            log_level: cli_log_level
                .or(file.log_level)
                .unwrap_or(defaults.log_level),
            default_unit: file.default_unit.unwrap_or(defaults.default_unit),
            default_kind: file.session.default_kind,
            handler: HandlerOptions {
                reconnect_on_enter: file.session.reconnect_on_enter,
            },
        }
    }

    /// Candidate configuration files, highest priority first
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project directory: ./.cad-doc.toml
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(PROJECT_CONFIG_FILE));
        }

        // User config directory: ~/.config/cad-doc/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cad-doc").join("config.toml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = FileConfig::from_toml("").unwrap();
        assert_eq!(file, FileConfig::default());
        assert!(file.session.reconnect_on_enter);
    }

    #[test]
    fn test_parse_full_file() {
        let file = FileConfig::from_toml(
            r#"
log_level = "debug"
default_unit = "in"

[session]
reconnect_on_enter = false
default_kind = "Drawing"
"#,
        )
        .unwrap();

        assert_eq!(file.log_level.as_deref(), Some("debug"));
        assert_eq!(file.default_unit, Some(LengthUnit::In));
        assert!(!file.session.reconnect_on_enter);
        assert_eq!(file.session.default_kind, Some(DocumentKind::Drawing));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(FileConfig::from_toml("default_unit = \"furlong\"").is_err());
        assert!(FileConfig::from_toml("[session\n").is_err());
    }

    #[test]
    fn test_cli_log_level_wins() {
        let file = FileConfig {
            log_level: Some("warn".to_string()),
            ..FileConfig::default()
        };

        let config = Config::merge(None, file.clone(), Some("trace".to_string()));
        assert_eq!(config.log_level, "trace");

        let config = Config::merge(None, file, None);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.default_unit, LengthUnit::Mm);
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["cad-doc", "session", "--new", "part", "--json"]).unwrap();
        match args.command {
            Command::Session { file, new, json } => {
                assert!(file.is_none());
                assert_eq!(new, Some(DocumentKind::Part));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args = Args::try_parse_from(["cad-doc", "convert", "5", "mile", "--to", "km"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Convert {
                unit: Some(LengthUnit::Mile),
                to: LengthUnit::Km,
                ..
            }
        ));
    }

    #[test]
    fn test_file_and_new_conflict() {
        let result = Args::try_parse_from([
            "cad-doc", "session", "--file", "a.CATPart", "--new", "Part",
        ]);
        assert!(result.is_err());
    }
}
