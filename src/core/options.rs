//! Logger construction options
//!
//! Every construction path ends in a [`LoggerOptions`] value produced by
//! applying an ordered list of [`LoggerOption`]s over a provider's defaults.
//! Later options override earlier ones for the same setting.

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Provider specific key/value configuration
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Output target meaning "write to standard output"
pub const STDOUT: &str = "stdout";
/// Output target meaning "write to standard error"
pub const STDERR: &str = "stderr";

pub const DEFAULT_MAX_LOG_SIZE_MB: u64 = 100;
pub const DEFAULT_MAX_LOG_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_MAX_LOG_FILES: usize = 10;

/// Rendering format of a log entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable single line
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a format name, treating anything unrecognised as text
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: '{}'", s)),
        }
    }
}

/// Normalized settings a backend is constructed from
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerOptions {
    pub level: LogLevel,
    pub format: OutputFormat,
    /// `"stdout"`, `"stderr"` or a file path
    pub output_path: String,
    /// Maximum size of one log file in MB
    pub max_log_size: u64,
    pub max_log_age: Duration,
    /// Maximum number of rotated files kept
    pub max_log_files: usize,
    pub compress_logs: bool,
    /// Maximum size of one message in KB, 0 for unlimited
    pub max_message_size: usize,
    /// Extra, provider specific configuration
    pub config: ConfigMap,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: OutputFormat::Text,
            output_path: STDOUT.to_string(),
            max_log_size: DEFAULT_MAX_LOG_SIZE_MB,
            max_log_age: DEFAULT_MAX_LOG_AGE,
            max_log_files: DEFAULT_MAX_LOG_FILES,
            compress_logs: false,
            max_message_size: 0,
            config: ConfigMap::new(),
        }
    }
}

impl LoggerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default format (builder style, used for provider defaults)
    #[must_use = "builder methods return a new value"]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Apply `options` left to right
    #[must_use = "builder methods return a new value"]
    pub fn apply(mut self, options: &[LoggerOption]) -> Self {
        for option in options {
            option.apply(&mut self);
        }
        self
    }

    /// Read a boolean from the extra configuration
    #[must_use]
    pub fn extra_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(serde_json::Value::as_bool)
    }

    /// Read a string from the extra configuration
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(serde_json::Value::as_str)
    }
}

/// A single composable mutation of [`LoggerOptions`]
#[derive(Clone)]
pub struct LoggerOption(Arc<dyn Fn(&mut LoggerOptions) + Send + Sync>);

impl LoggerOption {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut LoggerOptions) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, options: &mut LoggerOptions) {
        (self.0)(options);
    }
}

impl fmt::Debug for LoggerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoggerOption(..)")
    }
}

pub fn with_level(level: LogLevel) -> LoggerOption {
    LoggerOption::new(move |o| o.level = level)
}

pub fn with_format(format: OutputFormat) -> LoggerOption {
    LoggerOption::new(move |o| o.format = format)
}

pub fn with_output_path(path: impl Into<String>) -> LoggerOption {
    let path = path.into();
    LoggerOption::new(move |o| o.output_path = path.clone())
}

/// Replace the extra configuration map
pub fn with_config(config: ConfigMap) -> LoggerOption {
    LoggerOption::new(move |o| o.config = config.clone())
}

/// Maximum size of one log file in MB
pub fn with_max_log_size(size_mb: u64) -> LoggerOption {
    LoggerOption::new(move |o| o.max_log_size = size_mb)
}

pub fn with_max_log_age(age: Duration) -> LoggerOption {
    LoggerOption::new(move |o| o.max_log_age = age)
}

pub fn with_max_log_files(files: usize) -> LoggerOption {
    LoggerOption::new(move |o| o.max_log_files = files)
}

pub fn with_compress_logs(compress: bool) -> LoggerOption {
    LoggerOption::new(move |o| o.compress_logs = compress)
}

/// Maximum size of one message in KB, 0 for unlimited
pub fn with_max_message_size(size_kb: usize) -> LoggerOption {
    LoggerOption::new(move |o| o.max_message_size = size_kb)
}

/// Translate a key/value configuration map into options.
///
/// Each recognised key is applied only when it holds a value of the expected
/// type; anything else leaves the provider default in place. The whole map
/// also becomes the extra configuration.
#[must_use]
pub fn options_from_config_map(config: &ConfigMap) -> Vec<LoggerOption> {
    let mut options = Vec::new();

    if let Some(level) = config.get("level").and_then(level_from_value) {
        options.push(with_level(level));
    }
    if let Some(format) = config
        .get("format")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse::<OutputFormat>().ok())
    {
        options.push(with_format(format));
    }
    if let Some(path) = config.get("outputPath").and_then(serde_json::Value::as_str) {
        options.push(with_output_path(path));
    }
    if let Some(size) = config.get("maxLogSize").and_then(serde_json::Value::as_u64) {
        options.push(with_max_log_size(size));
    }
    if let Some(secs) = config.get("maxLogAge").and_then(serde_json::Value::as_u64) {
        options.push(with_max_log_age(Duration::from_secs(secs)));
    }
    if let Some(files) = config
        .get("maxLogFiles")
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
    {
        options.push(with_max_log_files(files));
    }
    if let Some(compress) = config.get("compressLogs").and_then(serde_json::Value::as_bool) {
        options.push(with_compress_logs(compress));
    }
    if let Some(size) = config
        .get("maxMessageSize")
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
    {
        options.push(with_max_message_size(size));
    }

    options.push(with_config(config.clone()));
    options
}

fn level_from_value(value: &serde_json::Value) -> Option<LogLevel> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(LogLevel::from_u8),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> ConfigMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_defaults() {
        let options = LoggerOptions::default();
        assert_eq!(options.level, LogLevel::Info);
        assert_eq!(options.format, OutputFormat::Text);
        assert_eq!(options.output_path, "stdout");
        assert_eq!(options.max_log_size, 100);
        assert_eq!(options.max_log_age, Duration::from_secs(604_800));
        assert_eq!(options.max_log_files, 10);
        assert!(!options.compress_logs);
        assert_eq!(options.max_message_size, 0);
        assert!(options.config.is_empty());
    }

    #[test]
    fn test_later_options_win() {
        let options = LoggerOptions::default().apply(&[
            with_level(LogLevel::Debug),
            with_output_path("/tmp/a.log"),
            with_level(LogLevel::Error),
        ]);
        assert_eq!(options.level, LogLevel::Error);
        assert_eq!(options.output_path, "/tmp/a.log");
        assert_eq!(options.max_log_files, DEFAULT_MAX_LOG_FILES);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::parse_lenient("xml"), OutputFormat::Text);
    }

    #[test]
    fn test_config_map_typed_extraction() {
        let config = map(json!({
            "level": "warn",
            "format": "json",
            "outputPath": "/var/log/app.log",
            "maxLogSize": 5,
            "maxLogAge": 3600,
            "maxLogFiles": 2,
            "compressLogs": true,
            "maxMessageSize": 4,
        }));
        let options = LoggerOptions::default().apply(&options_from_config_map(&config));

        assert_eq!(options.level, LogLevel::Warn);
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.output_path, "/var/log/app.log");
        assert_eq!(options.max_log_size, 5);
        assert_eq!(options.max_log_age, Duration::from_secs(3600));
        assert_eq!(options.max_log_files, 2);
        assert!(options.compress_logs);
        assert_eq!(options.max_message_size, 4);
        assert_eq!(options.config, config);
    }

    #[test]
    fn test_config_map_wrong_types_fall_back() {
        let config = map(json!({
            "level": true,
            "format": 3,
            "outputPath": 12,
            "maxLogSize": "big",
            "maxLogFiles": -1,
            "compressLogs": "yes",
        }));
        let defaults = LoggerOptions::default().with_format(OutputFormat::Json);
        let options = defaults.clone().apply(&options_from_config_map(&config));

        assert_eq!(options.level, defaults.level);
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.output_path, defaults.output_path);
        assert_eq!(options.max_log_size, defaults.max_log_size);
        assert_eq!(options.max_log_files, defaults.max_log_files);
        assert_eq!(options.compress_logs, defaults.compress_logs);
    }

    #[test]
    fn test_numeric_level() {
        let options = LoggerOptions::default()
            .apply(&options_from_config_map(&map(json!({ "level": 0 }))));
        assert_eq!(options.level, LogLevel::Debug);

        let options = LoggerOptions::default()
            .apply(&options_from_config_map(&map(json!({ "level": 42 }))));
        assert_eq!(options.level, LogLevel::Info);
    }
}
