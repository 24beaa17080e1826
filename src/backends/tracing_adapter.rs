//! Adapter over `tracing` with a per-logger `tracing-subscriber` fmt subscriber
//!
//! Each logger owns a [`Dispatch`] writing to its own sink, so loggers never
//! depend on (or disturb) the process-wide subscriber. Events are emitted
//! inside [`tracing::dispatcher::with_default`].
//!
//! `tracing` field names are static, so the accumulated fields travel as one
//! `attrs` value rendered `key=value key=value`. Fatal and panic entries are
//! `ERROR` events carrying a `severity` field.

use super::{plain_line, push_severity};
use crate::core::{
    format_fields, Context, Field, LogLevel, Logger, LoggerOption, LoggerOptions, LoggerProvider,
    LoggerRef, LoggerState, OutputFormat, Result,
};
use crate::sink::SharedSink;
use std::sync::Arc;
use tracing::field::{display, DisplayValue};
use tracing::{Dispatch, Level};

pub const PROVIDER_NAME: &str = "tracing";

/// Logger backed by a private `tracing` subscriber
pub struct TracingLogger {
    state: LoggerState,
    sink: SharedSink,
    dispatch: Dispatch,
}

impl TracingLogger {
    /// # Errors
    ///
    /// Returns error if the log file cannot be opened
    pub fn new(name: &str, options: &LoggerOptions) -> Result<Self> {
        let sink = SharedSink::open(options)?;
        Ok(Self::with_sink(name, options, sink))
    }

    pub fn with_sink(name: &str, options: &LoggerOptions, sink: SharedSink) -> Self {
        Self {
            state: LoggerState::new(name, options),
            dispatch: build_dispatch(options, &sink),
            sink,
        }
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    fn derive(&self, state: LoggerState) -> LoggerRef {
        Arc::new(Self {
            state,
            sink: self.sink.clone(),
            dispatch: self.dispatch.clone(),
        })
    }

    fn dispatch_event(&self, level: LogLevel, message: &str, fields: &[Field]) {
        let name = self.state.name();
        let rendered = (!fields.is_empty()).then(|| format_fields(fields));
        let attrs: Option<DisplayValue<&str>> = rendered.as_deref().map(display);

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Debug => {
                tracing::event!(Level::DEBUG, logger = %name, attrs, "{}", message)
            }
            LogLevel::Info => {
                tracing::event!(Level::INFO, logger = %name, attrs, "{}", message)
            }
            LogLevel::Warn => {
                tracing::event!(Level::WARN, logger = %name, attrs, "{}", message)
            }
            LogLevel::Error => {
                tracing::event!(Level::ERROR, logger = %name, attrs, "{}", message)
            }
            LogLevel::Fatal | LogLevel::Panic => {
                let severity = level.as_str();
                tracing::event!(Level::ERROR, logger = %name, severity, attrs, "{}", message)
            }
        });
    }
}

fn build_dispatch(options: &LoggerOptions, sink: &SharedSink) -> Dispatch {
    let writer_sink = sink.clone();
    let builder = tracing_subscriber::fmt()
        .with_writer(move || writer_sink.clone())
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_target(options.extra_bool("target").unwrap_or(false))
        .with_thread_ids(options.extra_bool("threadIds").unwrap_or(false));

    match options.format {
        OutputFormat::Json => Dispatch::new(builder.json().finish()),
        OutputFormat::Text => Dispatch::new(builder.finish()),
    }
}

impl Logger for TracingLogger {
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
        let message = self.state.truncate(message);
        let mut fields = self.state.merged_fields(fields);
        self.dispatch_event(level, &message, &fields);
        push_severity(level, &mut fields);
        Some(plain_line(level, self.state.name(), &message, &fields))
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

/// Provider for [`TracingLogger`], JSON output by default
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProvider;

impl TracingProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerProvider for TracingProvider {
    fn default_options(&self) -> LoggerOptions {
        LoggerOptions::default().with_format(OutputFormat::Json)
    }

    fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef> {
        let options = self.resolve_options(options);
        Ok(Arc::new(TracingLogger::new(name, &options)?))
    }
}
