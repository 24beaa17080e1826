//! Process-wide default logger and package-level shortcuts
//!
//! The default logger starts out as `LogFactory::global().get_logger()` and can
//! be swapped at any time with [`set_global_logger`]. Swapping only affects
//! later calls through this module; loggers already handed out keep working.
//!
//! # Examples
//!
//! ```no_run
//! use logface::core::{field, Logger};
//! use logface::global;
//!
//! global::info("service started", &[field("port", 8080)]);
//! global::warnf(format_args!("{} retries left", 2));
//!
//! let db = global::get_logger_with_name("db").unwrap();
//! db.info("connected", &[]);
//! ```

use crate::backends::ConsoleLogger;
use crate::core::{
    ConfigMap, Field, LogConfig, LogFactory, Logger, LoggerOption, LoggerOptions, LoggerProvider,
    LoggerRef, Result,
};
use parking_lot::{const_rwlock, RwLock};
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

static GLOBAL_LOGGER: RwLock<Option<LoggerRef>> = const_rwlock(None);

/// Replace the default logger used by this module's functions
pub fn set_global_logger(logger: LoggerRef) {
    *GLOBAL_LOGGER.write() = Some(logger);
}

/// The current default logger, created on first use
///
/// The default logger is built without holding the slot lock, so a provider
/// that logs through this module while being created does not deadlock. Such
/// nested calls get a stdout console logger that is not kept.
pub fn global_logger() -> LoggerRef {
    if let Some(logger) = GLOBAL_LOGGER.read().as_ref() {
        return Arc::clone(logger);
    }
    if BUILDING.with(Cell::get) {
        return fallback_logger();
    }

    BUILDING.with(|building| building.set(true));
    let built = default_logger();
    BUILDING.with(|building| building.set(false));

    let mut slot = GLOBAL_LOGGER.write();
    match slot.as_ref() {
        Some(logger) => Arc::clone(logger),
        None => {
            *slot = Some(Arc::clone(&built));
            built
        }
    }
}

thread_local! {
    static BUILDING: Cell<bool> = const { Cell::new(false) };
}

fn default_logger() -> LoggerRef {
    match LogFactory::global().get_logger() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!(
                "[LOGGER WARNING] Default provider unavailable ({}), using stdout console logger",
                e
            );
            fallback_logger()
        }
    }
}

fn fallback_logger() -> LoggerRef {
    Arc::new(ConsoleLogger::with_sink(
        crate::core::DEFAULT_LOGGER_NAME,
        &LoggerOptions::default(),
        crate::sink::SharedSink::stdout(),
    ))
}

pub fn debug(message: &str, fields: &[Field]) {
    global_logger().debug(message, fields);
}

pub fn info(message: &str, fields: &[Field]) {
    global_logger().info(message, fields);
}

pub fn warn(message: &str, fields: &[Field]) {
    global_logger().warn(message, fields);
}

pub fn error(message: &str, fields: &[Field]) {
    global_logger().error(message, fields);
}

/// Write a fatal entry and exit the process if it was emitted
pub fn fatal(message: &str, fields: &[Field]) {
    if let Some(exit) = global_logger().fatal(message, fields) {
        exit.terminate();
    }
}

/// Write a panic entry and unwind with its line if it was emitted
pub fn panic(message: &str, fields: &[Field]) {
    if let Err(err) = global_logger().panic(message, fields) {
        std::panic::panic_any(err.message);
    }
}

pub fn debugf(args: fmt::Arguments<'_>) {
    global_logger().debugf(args);
}

pub fn infof(args: fmt::Arguments<'_>) {
    global_logger().infof(args);
}

pub fn warnf(args: fmt::Arguments<'_>) {
    global_logger().warnf(args);
}

pub fn errorf(args: fmt::Arguments<'_>) {
    global_logger().errorf(args);
}

pub fn fatalf(args: fmt::Arguments<'_>) {
    if let Some(exit) = global_logger().fatalf(args) {
        exit.terminate();
    }
}

pub fn panicf(args: fmt::Arguments<'_>) {
    if let Err(err) = global_logger().panicf(args) {
        std::panic::panic_any(err.message);
    }
}

/// Flush the default logger
pub fn sync() -> Result<()> {
    global_logger().sync()
}

pub fn register_provider(name: impl Into<String>, provider: Arc<dyn LoggerProvider>) {
    LogFactory::global().register_provider(name, provider);
}

pub fn unregister_provider(name: &str) -> Option<Arc<dyn LoggerProvider>> {
    LogFactory::global().unregister_provider(name)
}

pub fn get_logger() -> Result<LoggerRef> {
    LogFactory::global().get_logger()
}

pub fn get_logger_with_name(name: &str) -> Result<LoggerRef> {
    LogFactory::global().get_logger_with_name(name)
}

pub fn get_logger_with_provider(name: &str, provider_name: &str) -> Result<LoggerRef> {
    LogFactory::global().get_logger_with_provider(name, provider_name)
}

pub fn create_logger_with_provider(
    name: &str,
    provider_name: &str,
    options: &[LoggerOption],
) -> Result<LoggerRef> {
    LogFactory::global().create_logger_with_provider(name, provider_name, options)
}

pub fn get_logger_with_config(name: &str, config: &ConfigMap) -> Result<LoggerRef> {
    LogFactory::global().create_logger_with_config(name, config)
}

pub fn get_logger_with_log_config(config: &LogConfig) -> Result<LoggerRef> {
    LogFactory::global().create_logger_with_log_config(config)
}
