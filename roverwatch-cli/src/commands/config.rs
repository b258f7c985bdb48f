//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, `config path`, and
//! `config init` for viewing and modifying settings from the command line.

use std::path::Path;

use clap::Subcommand;
use roverwatch::config::{ConfigKey, DashboardConfig};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., transport.url)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., transport.url)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with defaults if none exists
    Init,
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            println!("{}", display_value(&get_value(path, &key)?));
        }
        ConfigCommands::Set { key, value } => {
            let config_key = set_value(path, &key, &value)?;
            println!("Set {} = {}", config_key.name(), value);
        }
        ConfigCommands::List => print!("{}", list(path)?),
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init => {
            if DashboardConfig::ensure_exists_at(path)? {
                println!("Created {}", path.display());
            } else {
                println!("Configuration already exists at {}", path.display());
            }
        }
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'roverwatch config list' to see available keys.",
            key
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Current value of `key`, or an empty string when unset.
fn get_value(path: &Path, key: &str) -> Result<String, CliError> {
    let config_key = parse_key(key)?;
    let config = DashboardConfig::load_from(path)?;
    Ok(config_key.get(&config))
}

/// Validate and store `value` under `key`.
fn set_value(path: &Path, key: &str, value: &str) -> Result<ConfigKey, CliError> {
    let config_key = parse_key(key)?;
    let mut config = DashboardConfig::load_from(path)?;
    config_key
        .set(&mut config, value)
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save_to(path)?;
    Ok(config_key)
}

/// Every setting grouped by section.
fn list(path: &Path) -> Result<String, CliError> {
    let config = DashboardConfig::load_from(path)?;

    let mut out = String::from("Configuration Settings\n======================\n");
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            out.push_str(&format!("\n[{}]\n", section));
            current_section = section;
        }
        let value = key.get(&config);
        out.push_str(&format!("  {} = {}\n", key.key_name(), display_value(&value)));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get_round_trips_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        set_value(&path, "map.zoom", "14").unwrap();

        assert!(path.exists());
        assert_eq!(get_value(&path, "map.zoom").unwrap(), "14");
    }

    #[test]
    fn test_set_rejects_invalid_value_without_writing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let result = set_value(&path, "transport.url", "http://robot:9090");

        assert!(matches!(result, Err(CliError::Config(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        assert!(matches!(
            get_value(&path, "map.bogus"),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_list_groups_sections_and_marks_unset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");

        let out = list(&path).unwrap();

        assert!(out.contains("[transport]"));
        assert!(out.contains("[map]"));
        assert!(out.contains("  url = ws://localhost:9090"));
        assert!(out.contains("(not set)"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(""), "(not set)");
        assert_eq!(display_value("dark"), "dark");
    }
}
