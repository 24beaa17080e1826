//! # logface
//!
//! A logging facade: application code talks to one [`Logger`] contract while
//! the backend behind it is chosen at runtime by provider name.
//!
//! ## Features
//!
//! - **Swappable backends**: built-in `console`, `tracing` and `log` providers,
//!   plus any [`LoggerProvider`] registered at runtime
//! - **Structured fields**: loggers derive new loggers carrying accumulated
//!   key/value fields without mutating the original
//! - **Level gating**: six levels with cheap `is_*_enabled` checks
//! - **Configuration**: functional options or a serde [`LogConfig`] loaded
//!   from JSON or TOML
//! - **Rotating files**: size-based rotation with backup pruning and gzip
//!
//! ## Example
//!
//! ```no_run
//! use logface::prelude::*;
//!
//! let factory = LogFactory::new();
//! let logger = factory
//!     .create_logger_with_provider("api", "console", &[with_level(LogLevel::Debug)])
//!     .unwrap();
//!
//! let request = logger.with_fields(vec![field("request_id", "r-17")]);
//! request.info("handled", &[field("status", 200)]);
//! logface::info!(request, "took {} ms", 12);
//! ```

pub mod backends;
pub mod core;
pub mod global;
pub mod macros;
pub mod sink;

pub mod prelude {
    pub use crate::backends::{CaptureProvider, ConsoleLogger, ConsoleProvider};
    pub use crate::core::{
        field, with_compress_logs, with_config, with_format, with_level, with_max_log_age,
        with_max_log_files, with_max_log_size, with_max_message_size, with_output_path,
        ConfigMap, Context, Exit, Field, FieldValue, LogConfig, LogFactory, LogLevel, LogPanic,
        Logger, LoggerError, LoggerOption, LoggerOptions, LoggerProvider, LoggerRef,
        OutputFormat, Result,
    };
    pub use crate::global::{global_logger, set_global_logger};
}

pub use crate::core::{
    field, Context, Exit, Field, FieldValue, LogConfig, LogFactory, LogLevel, LogPanic, Logger,
    LoggerError, LoggerOption, LoggerOptions, LoggerProvider, LoggerRef, OutputFormat, Result,
};
pub use global::{global_logger, set_global_logger};
