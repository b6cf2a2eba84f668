// src/config.rs

//! Shim configuration.
//!
//! This module provides the options recognized by [`crate::ReaderShim::new`]:
//! parsing from TOML strings or files, environment variable overrides, and
//! validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ShimError};

/// Options recognized by the reader shim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// Whether reads run on a background thread. When disabled, each read is
    /// deferred and executes inline at the moment its result is awaited.
    pub prefetch_enabled: bool,
    /// Parallel-sequence counts per epoch. The first entry seeds the count
    /// reported before any minibatch has been consumed.
    pub parallel_sequences_per_epoch: Vec<usize>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            prefetch_enabled: true,
            parallel_sequences_per_epoch: vec![1],
        }
    }
}

impl FromStr for ShimConfig {
    type Err = ShimError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| ShimError::config_with_source("failed to parse TOML config", e))
    }
}

impl ShimConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShimError::config_with_source(
                format!("failed to read config file '{}'", path.display()),
                e,
            )
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // - `RSHIM_PREFETCH_ENABLED` overrides `prefetch_enabled`
    // - `RSHIM_PARALLEL_SEQUENCES` overrides `parallel_sequences_per_epoch`
    //   (comma-separated counts)
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RSHIM_PREFETCH_ENABLED") {
            if let Ok(v) = val.parse() {
                self.prefetch_enabled = v;
            }
        }
        if let Ok(val) = std::env::var("RSHIM_PARALLEL_SEQUENCES") {
            let parsed: std::result::Result<Vec<usize>, _> =
                val.split(',').map(|s| s.trim().parse()).collect();
            if let Ok(v) = parsed {
                if !v.is_empty() {
                    self.parallel_sequences_per_epoch = v;
                }
            }
        }
        self
    }

    // Validate all configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_sequences_per_epoch.is_empty() {
            return Err(ShimError::config(
                "parallel_sequences_per_epoch must not be empty",
            ));
        }
        if self.parallel_sequences_per_epoch.contains(&0) {
            return Err(ShimError::config(
                "parallel_sequences_per_epoch entries must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Parallel-sequence count in effect before the first minibatch.
    pub fn initial_parallel_sequences(&self) -> usize {
        self.parallel_sequences_per_epoch.first().copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ShimConfig::default();

        assert!(config.prefetch_enabled);
        assert_eq!(config.parallel_sequences_per_epoch, vec![1]);
        assert_eq!(config.initial_parallel_sequences(), 1);
    }

    #[test]
    fn test_default_validates() {
        let config = ShimConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_str_empty() {
        let config: ShimConfig = "".parse().unwrap();
        assert!(config.validate().is_ok());
        assert!(config.prefetch_enabled);
    }

    #[test]
    fn test_from_str_partial() {
        let toml = r#"
            prefetch_enabled = false
        "#;
        let config: ShimConfig = toml.parse().unwrap();

        assert!(!config.prefetch_enabled);
        // Other fields should be defaults
        assert_eq!(config.parallel_sequences_per_epoch, vec![1]);
    }

    #[test]
    fn test_from_str_full() {
        let toml = r#"
            prefetch_enabled = false
            parallel_sequences_per_epoch = [4, 8, 8]
        "#;
        let config: ShimConfig = toml.parse().unwrap();

        assert!(!config.prefetch_enabled);
        assert_eq!(config.parallel_sequences_per_epoch, vec![4, 8, 8]);
        assert_eq!(config.initial_parallel_sequences(), 4);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result: std::result::Result<ShimConfig, _> = "invalid = [".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_sequence_list() {
        let config = ShimConfig {
            parallel_sequences_per_epoch: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
        // The initial count still degrades gracefully
        assert_eq!(config.initial_parallel_sequences(), 1);
    }

    #[test]
    fn test_validate_zero_sequence_count() {
        let config = ShimConfig {
            parallel_sequences_per_epoch: vec![2, 0, 2],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "parallel_sequences_per_epoch = [2]").unwrap();

        let config = ShimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.parallel_sequences_per_epoch, vec![2]);
    }

    #[test]
    fn test_from_file_not_found() {
        let result = ShimConfig::from_file("/nonexistent/config.toml");
        assert!(result.is_err());
    }

    // Helper to clear all RSHIM_ environment variables for test isolation
    fn clear_rshim_env_vars() {
        for (key, _) in std::env::vars() {
            if key.starts_with("RSHIM_") {
                std::env::remove_var(&key);
            }
        }
    }

    // Environment variable tests are combined into a single test to avoid
    // race conditions when tests run in parallel, since env vars are global state.
    #[test]
    fn test_env_overrides() {
        clear_rshim_env_vars();

        std::env::set_var("RSHIM_PREFETCH_ENABLED", "false");
        std::env::set_var("RSHIM_PARALLEL_SEQUENCES", "4, 2");

        let config = ShimConfig::default().with_env_overrides();
        assert!(!config.prefetch_enabled);
        assert_eq!(config.parallel_sequences_per_epoch, vec![4, 2]);

        clear_rshim_env_vars();

        // Invalid values should be ignored (keep defaults)
        std::env::set_var("RSHIM_PREFETCH_ENABLED", "not_a_bool");
        std::env::set_var("RSHIM_PARALLEL_SEQUENCES", "4,x");

        let config = ShimConfig::default().with_env_overrides();
        assert!(config.prefetch_enabled);
        assert_eq!(config.parallel_sequences_per_epoch, vec![1]);

        clear_rshim_env_vars();
    }

    #[test]
    fn test_serialize_roundtrip() {
        let original = ShimConfig {
            prefetch_enabled: false,
            parallel_sequences_per_epoch: vec![3, 1],
        };
        let toml_str = toml::to_string(&original).unwrap();
        let parsed: ShimConfig = toml_str.parse().unwrap();

        assert_eq!(original.prefetch_enabled, parsed.prefetch_enabled);
        assert_eq!(
            original.parallel_sequences_per_epoch,
            parsed.parallel_sequences_per_epoch
        );
    }
}
