//! Named factories that construct loggers for one backend

use super::error::Result;
use super::logger::LoggerRef;
use super::options::{options_from_config_map, ConfigMap, LoggerOption, LoggerOptions};

/// Turns a name plus options into a logger of one backend.
///
/// Providers hold no per-logger state and may be called concurrently. Every
/// logger a provider returns owns its own sink handle.
///
/// # Examples
///
/// ```
/// use logface::backends::CaptureProvider;
/// use logface::core::{with_level, LogLevel, Logger, LoggerProvider};
///
/// let provider = CaptureProvider::new();
/// let logger = provider.create("svc", &[with_level(LogLevel::Warn)]).unwrap();
/// assert_eq!(logger.level(), LogLevel::Warn);
/// ```
pub trait LoggerProvider: Send + Sync {
    /// The options a logger starts from before any caller option is applied
    fn default_options(&self) -> LoggerOptions {
        LoggerOptions::default()
    }

    /// Build a logger from `options` applied over [`LoggerProvider::default_options`]
    fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef>;

    /// Build a logger from a key/value map.
    ///
    /// Recognised keys of the wrong type are ignored, never an error.
    fn create_with_config(&self, name: &str, config: &ConfigMap) -> Result<LoggerRef> {
        self.create(name, &options_from_config_map(config))
    }

    /// Resolve the final options for `options` over this provider's defaults
    fn resolve_options(&self, options: &[LoggerOption]) -> LoggerOptions {
        self.default_options().apply(options)
    }
}
