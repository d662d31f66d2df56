use crate::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for EvalGraph
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EvalGraphConfig {
    /// Update flush behaviour
    #[serde(default)]
    pub flush: FlushConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings read by the update flush and tag clear passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlushConfig {
    /// Invalidate the copy-on-write component of every entity whose
    /// proxy-dependent components get touched.
    #[serde(default = "default_use_copy_on_write")]
    pub use_copy_on_write: bool,

    /// Node tables longer than this are reset on the rayon pool.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Operation kinds skipped when a visited component re-tags its operations.
    #[serde(default = "default_retag_exclusions")]
    pub retag_exclusions: Vec<OperationKind>,

    /// Keep the visit order of every flush in its stats (debugging aid).
    #[serde(default)]
    pub record_visits: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            use_copy_on_write: default_use_copy_on_write(),
            parallel_threshold: default_parallel_threshold(),
            retag_exclusions: default_retag_exclusions(),
            record_visits: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_use_copy_on_write() -> bool {
    true
}
fn default_parallel_threshold() -> usize {
    256
}
fn default_retag_exclusions() -> Vec<OperationKind> {
    vec![OperationKind::ParticleSettingsEval]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EvalGraphConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables
    /// 2. Config file (.evalgraph.toml, then ~/.evalgraph/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load a specific file; environment overrides still apply.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(config: EvalGraphConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config)?;
        Self::validate_config(&config)?;

        let source = config_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "NONE (using defaults)".to_string());
        info!(
            config_file = %source,
            use_copy_on_write = config.flush.use_copy_on_write,
            parallel_threshold = config.flush.parallel_threshold,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    fn load_config_file() -> Result<(EvalGraphConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".evalgraph.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".evalgraph").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        debug!("No config file found, using defaults");
        Ok((EvalGraphConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<EvalGraphConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: EvalGraphConfig) -> Result<EvalGraphConfig, ConfigError> {
        if let Ok(value) = std::env::var("EVALGRAPH_USE_COPY_ON_WRITE") {
            config.flush.use_copy_on_write = parse_bool(&value).ok_or_else(|| {
                ConfigError::ParseError(format!("EVALGRAPH_USE_COPY_ON_WRITE={}", value))
            })?;
        }
        if let Ok(value) = std::env::var("EVALGRAPH_PARALLEL_THRESHOLD") {
            config.flush.parallel_threshold = value.parse().map_err(|_| {
                ConfigError::ParseError(format!("EVALGRAPH_PARALLEL_THRESHOLD={}", value))
            })?;
        }
        if let Ok(level) = std::env::var("EVALGRAPH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("EVALGRAPH_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate_config(config: &EvalGraphConfig) -> Result<(), ConfigError> {
        if config.flush.parallel_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "flush.parallel_threshold must be at least 1".to_string(),
            ));
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &EvalGraphConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = EvalGraphConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
