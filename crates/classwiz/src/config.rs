//! Configuration (classwiz.toml)
//!
//! Cache capacities, display limits and template file settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Error classification
    pub fn kind(&self) -> crate::ErrorKind {
        match self {
            ConfigError::Io(_) => crate::ErrorKind::Io,
            ConfigError::Parse(_) => crate::ErrorKind::Malformed,
            ConfigError::Invalid(_) => crate::ErrorKind::Usage,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClasswizConfig {
    /// Converter memoization
    #[serde(default)]
    pub cache: CacheConfig,

    /// Object info rendering
    #[serde(default)]
    pub display: DisplayConfig,

    /// Template files
    #[serde(default)]
    pub template: TemplateConfig,
}

/// Cache capacities; `None` means unbounded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Live object to object info (default: 16384)
    #[serde(default = "default_decompose_capacity")]
    pub decompose_capacity: Option<usize>,

    /// Object info to script (default: 1024)
    #[serde(default = "default_script_capacity")]
    pub script_capacity: Option<usize>,

    /// Object info to JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_capacity: Option<usize>,

    /// JSON to object info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_dict_capacity: Option<usize>,

    /// Cached materialization used for validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materialize_capacity: Option<usize>,
}

fn default_decompose_capacity() -> Option<usize> {
    Some(16_384)
}

fn default_script_capacity() -> Option<usize> {
    Some(1_024)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            decompose_capacity: default_decompose_capacity(),
            script_capacity: default_script_capacity(),
            dict_capacity: None,
            from_dict_capacity: None,
            materialize_capacity: None,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Maximum length of an object info description (default: 150)
    #[serde(default = "default_character_limit")]
    pub character_limit: usize,
}

fn default_character_limit() -> usize {
    150
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            character_limit: default_character_limit(),
        }
    }
}

/// Template file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateConfig {
    /// Extension appended on save when missing (default: "json")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// JSON indentation width (default: 2)
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_indent() -> usize {
    2
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            indent: default_indent(),
        }
    }
}

impl ClasswizConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClasswizConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacities = [
            ("decompose_capacity", self.cache.decompose_capacity),
            ("script_capacity", self.cache.script_capacity),
            ("dict_capacity", self.cache.dict_capacity),
            ("from_dict_capacity", self.cache.from_dict_capacity),
            ("materialize_capacity", self.cache.materialize_capacity),
        ];
        for (name, capacity) in capacities {
            if capacity == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "cache.{name} must be greater than zero; omit it for an unbounded cache"
                )));
            }
        }

        if self.display.character_limit == 0 {
            return Err(ConfigError::Invalid(
                "display.character_limit must be greater than zero".to_string(),
            ));
        }

        let extension = self.template.extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "Invalid template extension: {}",
                self.template.extension
            )));
        }

        Ok(())
    }

    /// Template extension without a leading dot
    pub fn template_extension(&self) -> &str {
        self.template.extension.trim_start_matches('.')
    }
}
