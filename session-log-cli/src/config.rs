//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use session_log_decoder::{ImportConfig, PairingConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated text with a header line
    #[default]
    Txt,
    /// JSON array of row objects
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse a `START=END` pair given on the command line
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((start, end)) if !start.is_empty() && !end.is_empty() => {
            Ok((start.to_string(), end.to_string()))
        }
        _ => Err(format!("expected START=END, got {:?}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [import]
            integer_subject_ids = false
            data_extension = "log"

            [pairing]
            pair_end_suffix = "_out"

            [pairing.paired_events]
            lever_press = "lever_release"

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert!(!config.import.integer_subject_ids);
        assert_eq!(config.import.data_extension, "log");
        assert_eq!(config.import.cache_file_name, "sessions.cache");
        assert_eq!(config.pairing.pair_end_suffix.as_deref(), Some("_out"));
        assert_eq!(config.pairing.paired_events["lever_press"], "lever_release");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.import.integer_subject_ids);
        assert!(config.pairing.paired_events.is_empty());
        assert_eq!(config.output.format, OutputFormat::Txt);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("poke_in=poke_out").unwrap(),
            ("poke_in".to_string(), "poke_out".to_string())
        );
        assert!(parse_pair("poke_in").is_err());
        assert!(parse_pair("=poke_out").is_err());
    }
}
