//! Configuration management for the generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typegen.toml)
//! - Environment variables (TYPEGEN_*)
//!
//! ## Example config file (typegen.toml):
//! ```toml
//! [sampler]
//! seed = 42
//! max_attempts = 5
//! depth_limit = 100
//! field_retries = 3
//!
//! [output]
//! directory = "./generated"
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration for the generator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneratorConfig {
    /// Sample synthesis settings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Sample synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// RNG seed; the same seed over the same document reproduces every sample
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Attempts per schema before validation gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Recursion ceiling during synthesis
    #[serde(default = "default_depth_limit")]
    pub depth_limit: u32,

    /// Re-rolls per required field during backfill
    #[serde(default = "default_field_retries")]
    pub field_retries: u32,

    /// Extra hand-tuned sample values for recursion fallbacks, keyed by
    /// schema name; merged over the built-in table
    #[serde(default)]
    pub fallbacks: HashMap<String, serde_json::Value>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives generated files
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Output format (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_seed() -> u64 {
    0
}

fn default_max_attempts() -> u32 {
    5
}

fn default_depth_limit() -> u32 {
    100
}

fn default_field_retries() -> u32 {
    3
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./generated")
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_attempts: default_max_attempts(),
            depth_limit: default_depth_limit(),
            field_retries: default_field_retries(),
            fallbacks: HashMap::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: OutputFormat::Pretty,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["typegen.toml", ".typegen.toml", "config/typegen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (TYPEGEN_*)
        builder = builder.add_source(
            Environment::with_prefix("TYPEGEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the output directory (resolves relative paths)
    pub fn output_directory(&self) -> PathBuf {
        if self.output.directory.is_absolute() {
            self.output.directory.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.directory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.sampler.max_attempts, 5);
        assert_eq!(config.sampler.depth_limit, 100);
        assert_eq!(config.sampler.field_retries, 3);
    }

    #[test]
    fn test_serialize_config() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[sampler]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typegen.toml");
        std::fs::write(&path, "[sampler]\nseed = 99\nmax_attempts = 2\n").unwrap();
        let config = GeneratorConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.sampler.seed, 99);
        assert_eq!(config.sampler.max_attempts, 2);
        // Untouched keys keep their defaults
        assert_eq!(config.sampler.depth_limit, 100);
    }
}
