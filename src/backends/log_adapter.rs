//! Adapter over the `log` crate's record model
//!
//! Every entry becomes a [`log::Record`] whose target is the logger name and
//! whose key/values are the merged fields. Records are written by a
//! per-logger [`RecordWriter`] implementing [`log::Log`], so output never
//! depends on the process-wide `log` logger. With the `forward` extra key
//! set, records are also handed to [`log::logger()`].
//!
//! `log` has no fatal or panic level: both are written as `ERROR` records
//! with a `severity` key.

use super::{plain_line, push_severity};
use crate::core::{
    Context, Field, FieldValue, LogLevel, Logger, LoggerOption, LoggerOptions,
    LoggerProvider, LoggerRef, LoggerState, OutputFormat, Result,
};
use crate::sink::SharedSink;
use chrono::{SecondsFormat, Utc};
use log::kv::{self, Key, Source, VisitSource};
use log::Record;
use std::cell::Cell;
use std::fmt::Write as _;
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "log";

/// Renders `log` records into a sink
pub struct RecordWriter {
    sink: SharedSink,
    format: OutputFormat,
    forward: bool,
}

impl RecordWriter {
    pub fn new(sink: SharedSink, format: OutputFormat, forward: bool) -> Self {
        Self {
            sink,
            format,
            forward,
        }
    }

    /// Render, write and optionally forward `record`, returning the line
    pub fn write(&self, record: &Record<'_>) -> String {
        let line = self.render(record);
        self.sink.write_line(&line);
        if self.forward {
            forward(record);
        }
        line
    }

    fn render(&self, record: &Record<'_>) -> String {
        let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        match self.format {
            OutputFormat::Text => render_text(&time, record),
            OutputFormat::Json => render_json(&time, record).unwrap_or_else(|e| {
                eprintln!("[LOGGER ERROR] Failed to serialize log record: {}", e);
                render_text(&time, record)
            }),
        }
    }
}

impl log::Log for RecordWriter {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.write(record);
    }

    fn flush(&self) {
        if let Err(e) = self.sink.sync() {
            eprintln!("[LOGGER ERROR] Failed to flush log output: {}", e);
        }
    }
}

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Clears the forwarding flag even if the process logger panics
struct ForwardGuard;

impl Drop for ForwardGuard {
    fn drop(&mut self) {
        FORWARDING.with(|flag| flag.set(false));
    }
}

/// Hand `record` to the process-wide `log` logger.
///
/// Records reaching this point again on the same thread (a writer installed
/// as the process logger) are not forwarded a second time.
fn forward(record: &Record<'_>) {
    if record.level() > log::max_level() {
        return;
    }
    if FORWARDING.with(|flag| flag.replace(true)) {
        return;
    }
    let _guard = ForwardGuard;
    let logger = log::logger();
    if logger.enabled(record.metadata()) {
        logger.log(record);
    }
}

fn render_text(time: &str, record: &Record<'_>) -> String {
    let mut line = format!(
        "{} {:<5} {}: {}",
        time,
        record.level(),
        record.target(),
        record.args()
    );
    let mut visitor = TextPairs(&mut line);
    if let Err(e) = record.key_values().visit(&mut visitor) {
        eprintln!("[LOGGER ERROR] Failed to render log fields: {}", e);
    }
    line
}

fn render_json(time: &str, record: &Record<'_>) -> serde_json::Result<String> {
    let mut object = serde_json::Map::new();
    object.insert("time".into(), time.into());
    object.insert("level".into(), record.level().as_str().into());
    object.insert("target".into(), record.target().into());
    object.insert("msg".into(), record.args().to_string().into());

    let mut visitor = JsonPairs(&mut object);
    if let Err(e) = record.key_values().visit(&mut visitor) {
        eprintln!("[LOGGER ERROR] Failed to render log fields: {}", e);
    }
    serde_json::to_string(&object)
}

/// Fields exposed as a `log` key/value source
struct FieldSource<'a>(&'a [Field]);

impl Source for FieldSource<'_> {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn VisitSource<'kvs>,
    ) -> std::result::Result<(), kv::Error> {
        for field in self.0 {
            visitor.visit_pair(Key::from_str(&field.key), kv_value(&field.value))?;
        }
        Ok(())
    }
}

fn kv_value(value: &FieldValue) -> kv::Value<'_> {
    match value {
        FieldValue::String(s) => kv::Value::from(s.as_str()),
        FieldValue::Int(i) => kv::Value::from(*i),
        FieldValue::Uint(u) => kv::Value::from(*u),
        FieldValue::Float(f) => kv::Value::from(*f),
        FieldValue::Bool(b) => kv::Value::from(*b),
        FieldValue::Null => kv::Value::from("null"),
    }
}

struct TextPairs<'a>(&'a mut String);

impl<'kvs> VisitSource<'kvs> for TextPairs<'_> {
    fn visit_pair(
        &mut self,
        key: Key<'kvs>,
        value: kv::Value<'kvs>,
    ) -> std::result::Result<(), kv::Error> {
        write!(self.0, " {}={}", key, value).map_err(|_| kv::Error::msg("formatting failed"))
    }
}

struct JsonPairs<'a>(&'a mut serde_json::Map<String, serde_json::Value>);

impl<'kvs> VisitSource<'kvs> for JsonPairs<'_> {
    fn visit_pair(
        &mut self,
        key: Key<'kvs>,
        value: kv::Value<'kvs>,
    ) -> std::result::Result<(), kv::Error> {
        self.0.insert(key.as_str().to_string(), json_value(&value));
        Ok(())
    }
}

fn json_value(value: &kv::Value<'_>) -> serde_json::Value {
    if let Some(b) = value.to_bool() {
        return b.into();
    }
    if let Some(i) = value.to_i64() {
        return i.into();
    }
    if let Some(u) = value.to_u64() {
        return u.into();
    }
    if let Some(f) = value.to_f64() {
        return serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);
    }
    value.to_string().into()
}

fn record_level(level: LogLevel) -> log::Level {
    match level {
        LogLevel::Debug => log::Level::Debug,
        LogLevel::Info => log::Level::Info,
        LogLevel::Warn => log::Level::Warn,
        LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => log::Level::Error,
    }
}

/// Logger producing `log` records
pub struct LogLogger {
    state: LoggerState,
    writer: Arc<RecordWriter>,
}

impl LogLogger {
    /// # Errors
    ///
    /// Returns error if the log file cannot be opened
    pub fn new(name: &str, options: &LoggerOptions) -> Result<Self> {
        let sink = SharedSink::open(options)?;
        Ok(Self::with_sink(name, options, sink))
    }

    pub fn with_sink(name: &str, options: &LoggerOptions, sink: SharedSink) -> Self {
        let forward = options.extra_bool("forward").unwrap_or(false);
        Self {
            state: LoggerState::new(name, options),
            writer: Arc::new(RecordWriter::new(sink, options.format, forward)),
        }
    }

    /// The writer as a [`log::Log`], e.g. to install with `log::set_logger`
    pub fn record_writer(&self) -> Arc<RecordWriter> {
        Arc::clone(&self.writer)
    }

    fn derive(&self, state: LoggerState) -> LoggerRef {
        Arc::new(Self {
            state,
            writer: Arc::clone(&self.writer),
        })
    }
}

impl Logger for LogLogger {
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
        push_severity(level, &mut fields);

        // The record borrows the formatted arguments, so it lives in one expression
        self.writer.write(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(record_level(level))
                .target(self.state.name())
                .key_values(&FieldSource(&fields))
                .build(),
        );
        Some(plain_line(level, self.state.name(), &message, &fields))
    }

    fn with_fields(&self, fields: Vec<Field>) -> LoggerRef {
        self.derive(self.state.fork_with_fields(&fields))
    }

    fn with_context(&self, context: Context) -> LoggerRef {
        self.derive(self.state.fork_with_context(context))
    }

    fn sync(&self) -> Result<()> {
        self.writer.sink.sync()
    }
}

/// Provider for [`LogLogger`], text output by default
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProvider;

impl LogProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LoggerProvider for LogProvider {
    fn default_options(&self) -> LoggerOptions {
        LoggerOptions::default().with_format(OutputFormat::Text)
    }

    fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef> {
        let options = self.resolve_options(options);
        Ok(Arc::new(LogLogger::new(name, &options)?))
    }
}
