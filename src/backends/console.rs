//! Plain console writer with its own text and JSON rendering
//!
//! Text entries look like
//! `2024-05-01 12:00:00.000 [INFO] [app] message key=value`;
//! JSON entries are one object with `time`, `level`, `logger` and `msg` plus
//! one key per field.

use crate::core::{
    format_fields, Context, Field, LogLevel, Logger, LoggerOption, LoggerOptions,
    LoggerProvider, LoggerRef, LoggerState, OutputFormat, Result,
};
use crate::sink::SharedSink;
use chrono::Local;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "console";

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Rendering settings shared by a logger and its derivations
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rendering {
    format: OutputFormat,
    color: bool,
    timestamp_format: String,
}

impl Rendering {
    fn from_options(options: &LoggerOptions, sink: &SharedSink) -> Self {
        let timestamp_format = match options.extra_str("timestampFormat") {
            Some(fmt) if is_valid_strftime(fmt) => fmt.to_string(),
            Some(fmt) => {
                eprintln!(
                    "[LOGGER WARNING] Invalid timestampFormat '{}', using '{}'",
                    fmt, DEFAULT_TIMESTAMP_FORMAT
                );
                DEFAULT_TIMESTAMP_FORMAT.to_string()
            }
            None => DEFAULT_TIMESTAMP_FORMAT.to_string(),
        };

        Self {
            format: options.format,
            color: cfg!(feature = "console")
                && options.extra_bool("color").unwrap_or(false)
                && sink.is_terminal(),
            timestamp_format,
        }
    }
}

fn is_valid_strftime(fmt: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

/// Logger writing rendered lines to stdout, stderr or a rotating file
pub struct ConsoleLogger {
    state: LoggerState,
    sink: SharedSink,
    rendering: Arc<Rendering>,
}

impl ConsoleLogger {
    /// Open the sink named by `options` and build the logger.
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be opened
    pub fn new(name: &str, options: &LoggerOptions) -> Result<Self> {
        let sink = SharedSink::open(options)?;
        Ok(Self::with_sink(name, options, sink))
    }

    /// Build the logger over an existing sink
    pub fn with_sink(name: &str, options: &LoggerOptions, sink: SharedSink) -> Self {
        let rendering = Arc::new(Rendering::from_options(options, &sink));
        Self {
            state: LoggerState::new(name, options),
            sink,
            rendering,
        }
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub fn format(&self) -> OutputFormat {
        self.rendering.format
    }

    fn derive(&self, state: LoggerState) -> LoggerRef {
        Arc::new(Self {
            state,
            sink: self.sink.clone(),
            rendering: Arc::clone(&self.rendering),
        })
    }

    fn render(&self, level: LogLevel, message: &str, fields: &[Field]) -> String {
        let timestamp = Local::now()
            .format(&self.rendering.timestamp_format)
            .to_string();

        let line = match self.rendering.format {
            OutputFormat::Text => self.render_text(&timestamp, level, message, fields),
            OutputFormat::Json => self
                .render_json(&timestamp, level, message, fields)
                .unwrap_or_else(|_| self.render_text(&timestamp, level, message, fields)),
        };

        self.state.truncate(&line).into_owned()
    }

    fn render_text(&self, timestamp: &str, level: LogLevel, message: &str, fields: &[Field]) -> String {
        let mut line = format!("{} [{}] [{}] {}", timestamp, level, self.state.name(), message);
        if !fields.is_empty() {
            line.push(' ');
            line.push_str(&format_fields(fields));
        }
        line
    }

    fn render_json(
        &self,
        timestamp: &str,
        level: LogLevel,
        message: &str,
        fields: &[Field],
    ) -> serde_json::Result<String> {
        let mut object = serde_json::Map::new();
        object.insert("time".into(), timestamp.into());
        object.insert("level".into(), level.as_str().into());
        object.insert("logger".into(), self.state.name().into());
        object.insert("msg".into(), message.into());
        for field in fields {
            object.insert(field.key.clone(), field.value.to_json_value());
        }
        serde_json::to_string(&object)
    }

    #[cfg(feature = "console")]
    fn colorize(&self, level: LogLevel, line: &str) -> String {
        use colored::Colorize;

        if !self.rendering.color || self.rendering.format != OutputFormat::Text {
            return line.to_string();
        }
        let label = format!("[{}]", level);
        let colored_label = format!("[{}]", level.as_str().color(level.color_code()).bold());
        line.replacen(&label, &colored_label, 1)
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, _level: LogLevel, line: &str) -> String {
        line.to_string()
    }
}

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn level(&self) -> LogLevel {
        self.state.level()
    }

    fn set_level(&self, level: LogLevel) {
        self.state.set_level(level);
    }

    fn context(&self) -> Context {
        self.state.context()
    }

    fn fields(&self) -> &[Field] {
        self.state.fields()
    }

    fn emit(&self, level: LogLevel, message: &str, fields: &[Field]) -> Option<String> {
        if !self.state.enabled(level) {
            return None;
        }
        let line = self.render(level, message, &self.state.merged_fields(fields));
        self.sink.write_line(&self.colorize(level, &line));
        Some(line)
    }

    fn with_fields(&self, fields: Vec<Field>) -> LoggerRef {
        self.derive(self.state.fork_with_fields(&fields))
    }

    fn with_context(&self, context: Context) -> LoggerRef {
        self.derive(self.state.fork_with_context(context))
    }

    fn sync(&self) -> Result<()> {
        self.sink.sync()
    }
}

/// Provider for [`ConsoleLogger`], text output by default
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProvider;

impl ConsoleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerProvider for ConsoleProvider {
    fn default_options(&self) -> LoggerOptions {
        LoggerOptions::default().with_format(OutputFormat::Text)
    }

    fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef> {
        let options = self.resolve_options(options);
        Ok(Arc::new(ConsoleLogger::new(name, &options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{field, with_format, with_level, with_max_message_size};

    fn memory_logger(options: &[LoggerOption]) -> (ConsoleLogger, SharedSink) {
        let sink = SharedSink::memory();
        let options = ConsoleProvider.resolve_options(options);
        (ConsoleLogger::with_sink("app", &options, sink.clone()), sink)
    }

    #[test]
    fn test_text_line_layout() {
        let (logger, sink) = memory_logger(&[]);
        logger.with_field("user", "ann".into()).info("Login", &[field("ok", true)]);

        let output = sink.contents();
        let line = output.trim_end();
        // "YYYY-MM-DD HH:MM:SS.mmm" is 23 characters
        assert_eq!(&line[23..], " [INFO] [app] Login user=ann ok=true");
    }

    #[test]
    fn test_gated_entries_are_not_written() {
        let (logger, sink) = memory_logger(&[with_level(LogLevel::Warn)]);
        logger.info("hidden", &[]);
        logger.debugf(format_args!("hidden {}", 1));
        assert!(sink.contents().is_empty());

        logger.set_level(LogLevel::Debug);
        logger.debug("shown", &[]);
        assert!(sink.contents().contains("[DEBUG] [app] shown"));
    }

    #[test]
    fn test_json_reserved_keys_overwritten_by_fields() {
        let (logger, sink) = memory_logger(&[with_format(OutputFormat::Json)]);
        logger.warn("disk", &[field("pct", 91), field("logger", "override")]);

        let value: serde_json::Value = serde_json::from_str(sink.contents().trim()).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["msg"], "disk");
        assert_eq!(value["pct"], 91);
        assert_eq!(value["logger"], "override");
        assert!(value["time"].is_string());
    }

    #[test]
    fn test_truncates_full_line() {
        let (logger, sink) = memory_logger(&[with_max_message_size(1)]);
        logger.error(&"m".repeat(4000), &[]);

        let output = sink.contents();
        let line = output.trim_end_matches('\n');
        assert_eq!(line.len(), 1024);
        assert!(line.ends_with("mmm..."));
    }

    #[test]
    fn test_escalations_return_rendered_line() {
        let (logger, sink) = memory_logger(&[]);

        let exit = logger.fatal("shutting down", &[]).expect("fatal is enabled");
        assert_eq!(exit.code(), 1);
        assert!(exit.line().ends_with("[FATAL] [app] shutting down"));

        let err = logger.panicf(format_args!("bad state {}", 7)).unwrap_err();
        assert!(err.message.ends_with("[PANIC] [app] bad state 7"));
        assert_eq!(sink.contents().lines().count(), 2);
    }

    #[test]
    fn test_derived_loggers_share_sink() {
        let (logger, sink) = memory_logger(&[]);
        let child = logger.with_fields(vec![field("request_id", "r-1")]);
        child.info("from child", &[]);
        logger.info("from parent", &[]);

        let output = sink.contents();
        assert!(output.contains("from child request_id=r-1"));
        assert!(output.lines().any(|l| l.ends_with("from parent")));
        assert!(logger.fields().is_empty());
    }

    #[test]
    fn test_invalid_timestamp_format_falls_back() {
        let mut config = crate::core::ConfigMap::new();
        config.insert("timestampFormat".into(), "%Q".into());
        let (logger, sink) = memory_logger(&[crate::core::with_config(config)]);
        logger.info("ok", &[]);
        assert!(sink.contents().contains("[INFO] [app] ok"));
    }
}
