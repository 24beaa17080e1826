//! Process-wide registry of providers and memoised named loggers
//!
//! Lock order is `loggers` before `providers`; no method takes them the other
//! way round. Provider construction runs outside both locks, so a provider
//! may itself call back into the factory.

use super::config::{LogConfig, DEFAULT_LOGGER_NAME, DEFAULT_PROVIDER};
use super::error::{LoggerError, Result};
use super::logger::LoggerRef;
use super::options::{ConfigMap, LoggerOption};
use super::provider::LoggerProvider;
use crate::backends::builtin_providers;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

type ProviderRef = Arc<dyn LoggerProvider>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    provider: String,
}

impl CacheKey {
    fn new(name: &str, provider: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
        }
    }
}

/// Registry of named providers plus a cache of named loggers
///
/// # Examples
///
/// ```
/// use logface::backends::CaptureProvider;
/// use logface::core::{LogFactory, Logger};
/// use std::sync::Arc;
///
/// let factory = LogFactory::new();
/// factory.register_provider("custom", Arc::new(CaptureProvider::new()));
///
/// let logger = factory.create_logger_with_provider("app", "custom", &[]).unwrap();
/// logger.info("x", &[]);
///
/// factory.unregister_provider("custom");
/// assert!(factory.create_logger_with_provider("app2", "custom", &[]).is_err());
/// ```
pub struct LogFactory {
    providers: RwLock<HashMap<String, ProviderRef>>,
    loggers: RwLock<HashMap<CacheKey, LoggerRef>>,
    default_provider: RwLock<String>,
}

impl LogFactory {
    /// Factory with every compiled-in provider registered and `console` as
    /// the default provider
    #[must_use]
    pub fn new() -> Self {
        let factory = Self::empty();
        for (name, provider) in builtin_providers() {
            factory.register_provider(name, provider);
        }
        factory
    }

    /// Factory with no providers at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            loggers: RwLock::new(HashMap::new()),
            default_provider: RwLock::new(DEFAULT_PROVIDER.to_string()),
        }
    }

    /// The process-wide factory, created on first use
    pub fn global() -> &'static LogFactory {
        static GLOBAL: OnceLock<LogFactory> = OnceLock::new();
        GLOBAL.get_or_init(LogFactory::new)
    }

    /// Register `provider` under `name`, replacing any previous one.
    ///
    /// Loggers cached for a replaced provider are evicted.
    pub fn register_provider(&self, name: impl Into<String>, provider: ProviderRef) {
        let name = name.into();
        let mut loggers = self.loggers.write();
        let mut providers = self.providers.write();
        if providers.insert(name.clone(), provider).is_some() {
            loggers.retain(|key, _| key.provider != name);
        }
    }

    /// Remove the provider and every logger cached for it.
    ///
    /// Returns the removed provider, if any.
    pub fn unregister_provider(&self, name: &str) -> Option<ProviderRef> {
        let mut loggers = self.loggers.write();
        let mut providers = self.providers.write();
        let removed = providers.remove(name);
        if removed.is_some() {
            loggers.retain(|key, _| key.provider != name);
        }
        removed
    }

    #[must_use]
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a provider by name
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ProviderNotFound`] for an unregistered name
    pub fn provider(&self, name: &str) -> Result<ProviderRef> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::provider_not_found(name))
    }

    #[must_use]
    pub fn default_provider(&self) -> String {
        self.default_provider.read().clone()
    }

    /// Change the provider used by [`LogFactory::get_logger_with_name`]
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ProviderNotFound`] for an unregistered name
    pub fn set_default_provider(&self, name: &str) -> Result<()> {
        if !self.has_provider(name) {
            return Err(LoggerError::provider_not_found(name));
        }
        *self.default_provider.write() = name.to_string();
        Ok(())
    }

    /// Build a fresh logger with `options` and cache it under `name`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown provider or if the backend cannot be built
    pub fn create_logger_with_provider(
        &self,
        name: &str,
        provider_name: &str,
        options: &[LoggerOption],
    ) -> Result<LoggerRef> {
        let provider = self.provider(provider_name)?;
        let logger = provider.create(name, options)?;
        self.store(CacheKey::new(name, provider_name), &provider, logger.clone());
        Ok(logger)
    }

    /// Build a fresh logger from a key/value map.
    ///
    /// The map's `provider` string selects the provider, falling back to the
    /// default provider.
    ///
    /// # Errors
    ///
    /// Fails for an unknown provider or if the backend cannot be built
    pub fn create_logger_with_config(&self, name: &str, config: &ConfigMap) -> Result<LoggerRef> {
        let provider_name = config
            .get("provider")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| self.default_provider(), str::to_string);

        let provider = self.provider(&provider_name)?;
        let logger = provider.create_with_config(name, config)?;
        self.store(CacheKey::new(name, &provider_name), &provider, logger.clone());
        Ok(logger)
    }

    /// Build a fresh logger from a typed configuration, validating a copy first
    ///
    /// # Errors
    ///
    /// Fails for an unknown provider or if the backend cannot be built
    pub fn create_logger_with_log_config(&self, config: &LogConfig) -> Result<LoggerRef> {
        let mut config = config.clone();
        config.validate();
        self.create_logger_with_provider(&config.name, &config.provider, &config.to_options())
    }

    /// The `app` logger of the default provider
    ///
    /// # Errors
    ///
    /// Fails if the default provider is gone or cannot build a logger
    pub fn get_logger(&self) -> Result<LoggerRef> {
        self.get_logger_with_name(DEFAULT_LOGGER_NAME)
    }

    /// Memoised logger `name` of the default provider
    ///
    /// # Errors
    ///
    /// Fails if the default provider is gone or cannot build a logger
    pub fn get_logger_with_name(&self, name: &str) -> Result<LoggerRef> {
        let provider_name = self.default_provider();
        self.get_logger_with_provider(name, &provider_name)
    }

    /// Memoised logger `name` of `provider_name`, built with defaults on
    /// first use
    ///
    /// # Errors
    ///
    /// Fails for an unknown provider or if the backend cannot be built
    pub fn get_logger_with_provider(&self, name: &str, provider_name: &str) -> Result<LoggerRef> {
        let key = CacheKey::new(name, provider_name);
        if let Some(logger) = self.loggers.read().get(&key) {
            return Ok(Arc::clone(logger));
        }

        let provider = self.provider(provider_name)?;
        let created = provider.create(name, &[])?;

        let mut loggers = self.loggers.write();
        if let Some(existing) = loggers.get(&key) {
            return Ok(Arc::clone(existing));
        }
        if self.is_current(provider_name, &provider) {
            loggers.insert(key, Arc::clone(&created));
        }
        Ok(created)
    }

    /// The cached logger for `name` and `provider_name`, if any
    #[must_use]
    pub fn cached_logger(&self, name: &str, provider_name: &str) -> Option<LoggerRef> {
        self.loggers
            .read()
            .get(&CacheKey::new(name, provider_name))
            .cloned()
    }

    #[must_use]
    pub fn cached_logger_count(&self) -> usize {
        self.loggers.read().len()
    }

    /// Drop every cached logger; providers stay registered
    pub fn clear_cache(&self) {
        self.loggers.write().clear();
    }

    fn store(&self, key: CacheKey, provider: &ProviderRef, logger: LoggerRef) {
        let mut loggers = self.loggers.write();
        if self.is_current(&key.provider, provider) {
            loggers.insert(key, logger);
        }
    }

    /// `true` if `provider` is still the one registered under `name`
    fn is_current(&self, name: &str, provider: &ProviderRef) -> bool {
        self.providers
            .read()
            .get(name)
            .is_some_and(|registered| Arc::ptr_eq(registered, provider))
    }
}

impl Default for LogFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFactory")
            .field("providers", &self.provider_names())
            .field("default_provider", &self.default_provider())
            .field("cached_loggers", &self.cached_logger_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::CaptureProvider;
    use crate::core::{with_level, LogLevel};
    use serde_json::json;

    fn capture_factory() -> (LogFactory, CaptureProvider) {
        let factory = LogFactory::empty();
        let provider = CaptureProvider::new();
        factory.register_provider("capture", Arc::new(provider.clone()));
        factory.set_default_provider("capture").unwrap();
        (factory, provider)
    }

    #[test]
    fn test_builtins_registered() {
        let factory = LogFactory::new();
        assert!(factory.has_provider("console"));
        assert_eq!(factory.default_provider(), "console");
        #[cfg(all(feature = "tracing-backend", feature = "log-backend"))]
        assert_eq!(factory.provider_names(), vec!["console", "log", "tracing"]);
    }

    #[test]
    fn test_unknown_provider_is_distinguishable() {
        let factory = LogFactory::new();
        let err = factory
            .create_logger_with_provider("app", "nope", &[])
            .unwrap_err();
        assert!(err.is_provider_not_found());
        assert!(factory.set_default_provider("nope").unwrap_err().is_provider_not_found());
        assert_eq!(factory.default_provider(), "console");
    }

    #[test]
    fn test_get_logger_is_memoised() {
        let (factory, _) = capture_factory();
        let first = factory.get_logger_with_name("db").unwrap();
        let second = factory.get_logger_with_name("db").unwrap();
        let other = factory.get_logger_with_name("http").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(factory.get_logger().unwrap().name(), "app");
        assert_eq!(factory.cached_logger_count(), 3);
    }

    #[test]
    fn test_create_replaces_cached_logger() {
        let (factory, _) = capture_factory();
        let cached = factory.get_logger_with_name("svc").unwrap();
        let fresh = factory
            .create_logger_with_provider("svc", "capture", &[with_level(LogLevel::Error)])
            .unwrap();

        assert!(!Arc::ptr_eq(&cached, &fresh));
        let now = factory.cached_logger("svc", "capture").unwrap();
        assert!(Arc::ptr_eq(&now, &fresh));
        assert_eq!(now.level(), LogLevel::Error);
    }

    #[test]
    fn test_unregister_evicts_cache() {
        let (factory, _) = capture_factory();
        factory.get_logger_with_provider("a", "capture").unwrap();
        assert!(factory.unregister_provider("capture").is_some());

        assert!(factory.cached_logger("a", "capture").is_none());
        assert!(factory
            .get_logger_with_provider("a", "capture")
            .unwrap_err()
            .is_provider_not_found());
        assert!(factory.unregister_provider("capture").is_none());
    }

    #[test]
    fn test_reregister_evicts_old_loggers() {
        let (factory, first) = capture_factory();
        factory.get_logger_with_name("x").unwrap().info("one", &[]);

        let second = CaptureProvider::new();
        factory.register_provider("capture", Arc::new(second.clone()));
        factory.get_logger_with_name("x").unwrap().info("two", &[]);

        assert_eq!(first.store().messages(), vec!["one".to_string()]);
        assert_eq!(second.store().messages(), vec!["two".to_string()]);
    }

    #[test]
    fn test_config_map_selects_provider() {
        let (factory, provider) = capture_factory();
        factory.register_provider("other", Arc::new(CaptureProvider::new()));

        let config = match json!({ "provider": "other", "level": "warn" }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let logger = factory.create_logger_with_config("cfg", &config).unwrap();
        assert_eq!(logger.level(), LogLevel::Warn);
        assert!(factory.cached_logger("cfg", "other").is_some());

        let logger = factory.create_logger_with_config("cfg", &ConfigMap::new()).unwrap();
        logger.info("default provider", &[]);
        assert_eq!(provider.store().len(), 1);
    }

    #[test]
    fn test_log_config_is_validated() {
        let (factory, provider) = capture_factory();
        let config = LogConfig::new()
            .with_provider("capture")
            .with_name("")
            .with_format("yaml")
            .with_level(LogLevel::Debug);

        let logger = factory.create_logger_with_log_config(&config).unwrap();
        assert_eq!(logger.name(), "app");
        logger.debug("validated", &[]);
        assert_eq!(provider.store().messages(), vec!["validated".to_string()]);
        assert_eq!(config.format, "yaml");
    }
}
