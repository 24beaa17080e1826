//! Typed, serialisable logger configuration
//!
//! # Examples
//!
//! ```
//! use logface::core::{LogConfig, LogLevel};
//!
//! let mut config = LogConfig::new()
//!     .with_provider("tracing")
//!     .with_name("api")
//!     .with_level(LogLevel::Debug)
//!     .with_format("json");
//! config.validate();
//!
//! let options = config.to_options();
//! assert!(!options.is_empty());
//! ```

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::options::{self, ConfigMap, LoggerOption, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PROVIDER: &str = "console";
pub const DEFAULT_LOGGER_NAME: &str = "app";

/// User-facing logger configuration.
///
/// Missing keys in a loaded document take their [`LogConfig::default`] value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    pub provider: String,
    pub name: String,
    pub level: LogLevel,
    pub format: String,
    pub output_path: String,
    /// MB
    pub max_log_size: u64,
    /// Persisted as whole seconds
    #[serde(with = "duration_secs")]
    pub max_log_age: Duration,
    pub max_log_files: usize,
    pub compress_logs: bool,
    /// KB, 0 for unlimited
    pub max_message_size: usize,
    pub extra_config: ConfigMap,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            name: DEFAULT_LOGGER_NAME.to_string(),
            level: LogLevel::Info,
            format: OutputFormat::Text.as_str().to_string(),
            output_path: options::STDOUT.to_string(),
            max_log_size: options::DEFAULT_MAX_LOG_SIZE_MB,
            max_log_age: options::DEFAULT_MAX_LOG_AGE,
            max_log_files: options::DEFAULT_MAX_LOG_FILES,
            compress_logs: false,
            max_message_size: 0,
            extra_config: ConfigMap::new(),
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_log_size(mut self, size_mb: u64) -> Self {
        self.max_log_size = size_mb;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_log_age(mut self, age: Duration) -> Self {
        self.max_log_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_log_files(mut self, files: usize) -> Self {
        self.max_log_files = files;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compress_logs(mut self, compress: bool) -> Self {
        self.compress_logs = compress;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_message_size(mut self, size_kb: usize) -> Self {
        self.max_message_size = size_kb;
        self
    }

    /// Set one provider specific key
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_extra_config(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra_config.insert(key.into(), value.into());
        self
    }

    /// Merge a whole map of provider specific keys
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_extra_configs(mut self, extra: ConfigMap) -> Self {
        self.extra_config.extend(extra);
        self
    }

    /// Repair empty or out-of-range values back to their defaults.
    ///
    /// Never fails and is idempotent.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        if self.provider.trim().is_empty() {
            self.provider = defaults.provider;
        }
        if self.name.trim().is_empty() {
            self.name = defaults.name;
        }
        if self.output_path.trim().is_empty() {
            self.output_path = defaults.output_path;
        }
        match self.format.parse::<OutputFormat>() {
            Ok(format) => self.format = format.as_str().to_string(),
            Err(_) => self.format = defaults.format,
        }
        if self.max_log_size == 0 {
            self.max_log_size = defaults.max_log_size;
        }
        if self.max_log_age.is_zero() {
            self.max_log_age = defaults.max_log_age;
        }
        if self.max_log_files == 0 {
            self.max_log_files = defaults.max_log_files;
        }
    }

    /// Convert into the option sequence a provider consumes.
    ///
    /// The provider and name are not options; they select the backend and
    /// label the logger.
    #[must_use]
    pub fn to_options(&self) -> Vec<LoggerOption> {
        vec![
            options::with_level(self.level),
            options::with_format(OutputFormat::parse_lenient(&self.format)),
            options::with_output_path(self.output_path.clone()),
            options::with_max_log_size(self.max_log_size),
            options::with_max_log_age(self.max_log_age),
            options::with_max_log_files(self.max_log_files),
            options::with_compress_logs(self.compress_logs),
            options::with_max_message_size(self.max_message_size),
            options::with_config(self.extra_config.clone()),
        ]
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| LoggerError::config_parse("JSON", e.to_string()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| LoggerError::config_parse("TOML", e.to_string()))
    }

    /// Load from a `.json` or `.toml` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&content),
            other => Err(LoggerError::config_parse(
                other.unwrap_or("unknown"),
                format!("Unsupported configuration file '{}'", path.display()),
            )),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
