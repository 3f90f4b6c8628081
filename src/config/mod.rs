//! # Configuration
//!
//! TOML configuration for the `mushcode` binary and for embedders that want
//! the same knobs.
//!
//! - [`EngineConfig`] - evaluator limits
//! - [`LoggingConfig`] - log level and optional log file
//! - [`MetadataConfig`] - replacement catalog files
//!
//! Every section and field has a default, so an empty file is valid.
//!
//! ```rust,no_run
//! use mushcode::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("mushcode.toml").await?;
//!     let config = Config::load("mushcode.toml").await?;
//!     println!("max depth: {}", config.engine.max_depth);
//!     Ok(())
//! }
//! ```
//!
//! ```toml
//! [engine]
//! max_depth = 50
//!
//! [logging]
//! level = "info"
//! file = "mushcode.log"
//!
//! [metadata]
//! functions = "data/functions.json"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::engine::DEFAULT_MAX_DEPTH;

/// Upper bound accepted for `engine.max_depth`. Evaluation at this depth
/// must fit a 2 MB thread stack.
pub const MAX_DEPTH_CEILING: usize = 500;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deepest bracket/function nesting before evaluation aborts.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("mushcode.log".to_string()),
        }
    }
}

/// Paths of catalog files that replace the embedded defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetadataConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<String>,
}

impl Config {
    /// Load and validate configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config
            .validate()
            .map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.max_depth == 0 {
            return Err(anyhow!("engine.max_depth must be at least 1"));
        }
        if self.engine.max_depth > MAX_DEPTH_CEILING {
            return Err(anyhow!(
                "engine.max_depth {} exceeds {}",
                self.engine.max_depth,
                MAX_DEPTH_CEILING
            ));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }
}
