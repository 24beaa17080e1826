//! Core facade types: levels, fields, options, the logger contract,
//! providers and the registry

pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod field;
pub mod log_level;
pub mod logger;
pub mod options;
pub mod provider;

pub use config::{LogConfig, DEFAULT_LOGGER_NAME, DEFAULT_PROVIDER};
pub use context::Context;
pub use error::{LoggerError, Result};
pub use factory::LogFactory;
pub use field::{field, format_fields, merge_fields, Field, FieldValue};
pub use log_level::LogLevel;
pub use logger::{
    truncate_message, Exit, LogPanic, Logger, LoggerRef, LoggerState, FATAL_EXIT_CODE,
    TRUNCATION_MARKER,
};
pub use options::{
    options_from_config_map, with_compress_logs, with_config, with_format, with_level,
    with_max_log_age, with_max_log_files, with_max_log_size, with_max_message_size,
    with_output_path, ConfigMap, LoggerOption, LoggerOptions, OutputFormat,
};
pub use provider::LoggerProvider;
