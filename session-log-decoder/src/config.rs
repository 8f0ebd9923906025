//! Import configuration types
//!
//! This module defines the options that control how session files are read
//! and how an experiment folder is scanned. Options for the tabular
//! projection live with the projector in [`crate::table`].

use serde::{Deserialize, Serialize};

/// Configuration for importing sessions and experiments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Convert subject IDs to integers (e.g. `m012` becomes `12`)
    #[serde(default = "default_true")]
    pub integer_subject_ids: bool,

    /// Extension of session data files in an experiment folder (without dot)
    #[serde(default = "default_data_extension")]
    pub data_extension: String,

    /// Name of the session cache file written into the experiment folder
    #[serde(default = "default_cache_file_name")]
    pub cache_file_name: String,

    /// Parse new session files in parallel
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

fn default_data_extension() -> String {
    "txt".to_string()
}

fn default_cache_file_name() -> String {
    "sessions.cache".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            integer_subject_ids: true,
            data_extension: default_data_extension(),
            cache_file_name: default_cache_file_name(),
            parallel: true,
        }
    }
}

impl ImportConfig {
    /// Create a new import configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: store subject IDs as integers or raw strings
    pub fn with_integer_subject_ids(mut self, enabled: bool) -> Self {
        self.integer_subject_ids = enabled;
        self
    }

    /// Builder method: set the data file extension
    pub fn with_data_extension(mut self, extension: impl Into<String>) -> Self {
        self.data_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Builder method: set the cache file name
    pub fn with_cache_file_name(mut self, name: impl Into<String>) -> Self {
        self.cache_file_name = name.into();
        self
    }

    /// Builder method: enable or disable parallel parsing
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Check if a file name has the configured data extension
    pub fn is_data_file(&self, file_name: &str) -> bool {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == self.data_extension)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_config_builder() {
        let config = ImportConfig::new()
            .with_integer_subject_ids(false)
            .with_data_extension(".log")
            .with_cache_file_name("cache.bin")
            .with_parallel(false);

        assert!(!config.integer_subject_ids);
        assert_eq!(config.data_extension, "log");
        assert_eq!(config.cache_file_name, "cache.bin");
        assert!(!config.parallel);
    }

    #[test]
    fn test_data_file_filter() {
        let config = ImportConfig::new();

        assert!(config.is_data_file("m1-2020-01-01.txt"));
        assert!(!config.is_data_file("sessions.cache"));
        assert!(!config.is_data_file("analog.pca"));
        assert!(!config.is_data_file("txt"));
    }
}
