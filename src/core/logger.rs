//! The logger contract shared by every backend

use super::context::Context;
use super::error::Result;
use super::field::{field, merge_fields, Field, FieldValue};
use super::log_level::LogLevel;
use super::options::LoggerOptions;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a logger of any backend
pub type LoggerRef = Arc<dyn Logger>;

/// Marker appended to truncated messages
pub const TRUNCATION_MARKER: &str = "...";

/// Exit code used when a fatal entry terminates the process
pub const FATAL_EXIT_CODE: i32 = 1;

/// Process termination requested by a fatal entry.
///
/// The entry has already been written and the sink flushed. Call
/// [`Exit::terminate`] from the program's entry point.
#[must_use = "a fatal entry only terminates the process once `terminate` is called"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit {
    code: i32,
    line: String,
}

impl Exit {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            code: FATAL_EXIT_CODE,
            line: line.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    /// The rendered entry that triggered the exit
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn terminate(self) -> ! {
        std::process::exit(self.code)
    }
}

/// Unrecoverable failure raised by a panic entry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LogPanic {
    /// The fully rendered entry
    pub message: String,
}

impl LogPanic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Abstract logging interface implemented by every backend.
///
/// Derivation methods (`with_*`) never mutate the receiver: they return a new
/// logger sharing the same sink with its own field, level and context
/// snapshot. Only [`Logger::set_level`] changes the receiver in place.
pub trait Logger: Send + Sync {
    fn name(&self) -> &str;

    fn level(&self) -> LogLevel;

    fn set_level(&self, level: LogLevel);

    fn context(&self) -> Context;

    /// Fields accumulated by derivation, in insertion order
    fn fields(&self) -> &[Field];

    /// Write one entry if `level` passes the gate.
    ///
    /// Returns the rendered entry, or `None` when the entry was gated.
    /// Write failures are reported on stderr and never returned.
    fn emit(&self, level: LogLevel, message: &str, fields: &[Field]) -> Option<String>;

    fn with_fields(&self, fields: Vec<Field>) -> LoggerRef;

    fn with_context(&self, context: Context) -> LoggerRef;

    /// Flush buffered output
    fn sync(&self) -> Result<()>;

    fn with_field(&self, key: &str, value: FieldValue) -> LoggerRef {
        self.with_fields(vec![Field::new(key, value)])
    }

    /// Attach `err` as the `error` field
    fn with_error(&self, err: &dyn std::error::Error) -> LoggerRef {
        self.with_fields(vec![field("error", err.to_string())])
    }

    /// Attach `time` as the `time` field (RFC 3339)
    fn with_time(&self, time: DateTime<Utc>) -> LoggerRef {
        self.with_fields(vec![field("time", time.to_rfc3339())])
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.level() <= level
    }

    fn is_debug_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Debug)
    }

    fn is_info_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Info)
    }

    fn is_warn_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Warn)
    }

    fn is_error_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Error)
    }

    fn is_fatal_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Fatal)
    }

    fn is_panic_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Panic)
    }

    fn debug(&self, message: &str, fields: &[Field]) {
        self.emit(LogLevel::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: &[Field]) {
        self.emit(LogLevel::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: &[Field]) {
        self.emit(LogLevel::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: &[Field]) {
        self.emit(LogLevel::Error, message, fields);
    }

    /// Write a fatal entry and return the exit the caller must perform
    ///
    /// Dropping the result is diagnosed by `unused_must_use`:
    ///
    /// ```compile_fail
    /// #![deny(unused_must_use)]
    /// use logface::backends::CaptureProvider;
    /// use logface::core::{Logger, LoggerProvider};
    ///
    /// let logger = CaptureProvider::new().create("db", &[]).unwrap();
    /// logger.fatal("db down", &[]);
    /// ```
    #[must_use = "call Exit::terminate() to end the process"]
    fn fatal(&self, message: &str, fields: &[Field]) -> Option<Exit> {
        let line = self.emit(LogLevel::Fatal, message, fields)?;
        flush_before_escalation(self);
        Some(Exit::new(line))
    }

    /// Write a panic entry and return it as an error to unwind on
    fn panic(&self, message: &str, fields: &[Field]) -> std::result::Result<(), LogPanic> {
        match self.emit(LogLevel::Panic, message, fields) {
            Some(line) => {
                flush_before_escalation(self);
                Err(LogPanic::new(line))
            }
            None => Ok(()),
        }
    }

    fn debugf(&self, args: fmt::Arguments<'_>) {
        if self.is_debug_enabled() {
            self.emit(LogLevel::Debug, &render_args(args), &[]);
        }
    }

    fn infof(&self, args: fmt::Arguments<'_>) {
        if self.is_info_enabled() {
            self.emit(LogLevel::Info, &render_args(args), &[]);
        }
    }

    fn warnf(&self, args: fmt::Arguments<'_>) {
        if self.is_warn_enabled() {
            self.emit(LogLevel::Warn, &render_args(args), &[]);
        }
    }

    fn errorf(&self, args: fmt::Arguments<'_>) {
        if self.is_error_enabled() {
            self.emit(LogLevel::Error, &render_args(args), &[]);
        }
    }

    #[must_use = "call Exit::terminate() to end the process"]
    fn fatalf(&self, args: fmt::Arguments<'_>) -> Option<Exit> {
        if !self.is_fatal_enabled() {
            return None;
        }
        self.fatal(&render_args(args), &[])
    }

    fn panicf(&self, args: fmt::Arguments<'_>) -> std::result::Result<(), LogPanic> {
        if !self.is_panic_enabled() {
            return Ok(());
        }
        self.panic(&render_args(args), &[])
    }
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("fields", &self.fields())
            .finish()
    }
}

fn render_args(args: fmt::Arguments<'_>) -> Cow<'static, str> {
    match args.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(args.to_string()),
    }
}

fn flush_before_escalation<L: Logger + ?Sized>(logger: &L) {
    if let Err(e) = logger.sync() {
        eprintln!("[LOGGER ERROR] Failed to flush before escalation: {}", e);
    }
}

/// Per-instance state every built-in backend carries.
///
/// Owns the gating level, the accumulated fields, the bound context and the
/// message size limit. The sink is held by the backend itself.
pub struct LoggerState {
    name: String,
    level: RwLock<LogLevel>,
    fields: Vec<Field>,
    context: Context,
    /// KB, 0 for unlimited
    max_message_size: usize,
}

impl LoggerState {
    pub fn new(name: impl Into<String>, options: &LoggerOptions) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(options.level),
            fields: Vec::new(),
            context: Context::background(),
            max_message_size: options.max_message_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn context(&self) -> Context {
        self.context.clone()
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// `true` if an entry at `level` passes the gate
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level() <= level
    }

    /// Accumulated fields followed by per-call `extra`, keys de-duplicated
    pub fn merged_fields(&self, extra: &[Field]) -> Vec<Field> {
        merge_fields(&self.fields, extra)
    }

    pub fn truncate<'a>(&self, text: &'a str) -> Cow<'a, str> {
        truncate_message(text, self.max_message_size)
    }

    /// Snapshot with `extra` appended to the accumulated fields
    #[must_use]
    pub fn fork_with_fields(&self, extra: &[Field]) -> Self {
        Self {
            fields: merge_fields(&self.fields, extra),
            ..self.fork()
        }
    }

    #[must_use]
    pub fn fork_with_context(&self, context: Context) -> Self {
        Self {
            context,
            ..self.fork()
        }
    }

    fn fork(&self) -> Self {
        Self {
            name: self.name.clone(),
            level: RwLock::new(self.level()),
            fields: self.fields.clone(),
            context: self.context.clone(),
            max_message_size: self.max_message_size,
        }
    }
}

impl fmt::Debug for LoggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerState")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("fields", &self.fields)
            .field("context", &self.context)
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

/// Cut `text` to `max_kb` KiB, marker included.
///
/// Byte oriented: the cut backs off to the nearest character boundary, so a
/// multibyte message may end up a few bytes shorter than the limit.
pub fn truncate_message(text: &str, max_kb: usize) -> Cow<'_, str> {
    let limit = max_kb.saturating_mul(1024);
    if limit == 0 || text.len() <= limit {
        return Cow::Borrowed(text);
    }

    let mut cut = limit.saturating_sub(TRUNCATION_MARKER.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
    truncated.push_str(&text[..cut]);
    truncated.push_str(TRUNCATION_MARKER);
    Cow::Owned(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::with_level;

    fn state(level: LogLevel) -> LoggerState {
        LoggerState::new("test", &LoggerOptions::default().apply(&[with_level(level)]))
    }

    #[test]
    fn test_gating() {
        let state = state(LogLevel::Warn);
        assert!(!state.enabled(LogLevel::Debug));
        assert!(!state.enabled(LogLevel::Info));
        assert!(state.enabled(LogLevel::Warn));
        assert!(state.enabled(LogLevel::Panic));

        state.set_level(LogLevel::Debug);
        assert!(state.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_fork_does_not_touch_parent() {
        let parent = state(LogLevel::Info);
        let child = parent.fork_with_fields(&[field("request_id", "abc")]);
        let sibling = parent.fork_with_fields(&[field("user", 7)]);

        assert!(parent.fields().is_empty());
        assert_eq!(child.fields(), &[field("request_id", "abc")]);
        assert_eq!(sibling.fields(), &[field("user", 7)]);

        child.set_level(LogLevel::Error);
        assert_eq!(parent.level(), LogLevel::Info);
    }

    #[test]
    fn test_fork_with_context() {
        let parent = state(LogLevel::Info);
        let child = parent.fork_with_context(Context::new(42_u32));
        assert!(parent.context().is_background());
        assert_eq!(child.context().value::<u32>(), Some(&42));
    }

    #[test]
    fn test_truncate_ascii() {
        let message = "x".repeat(2000);
        let truncated = truncate_message(&message, 1);
        assert_eq!(truncated.len(), 1024);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..1021], &message[..1021]);
    }

    #[test]
    fn test_truncate_untouched() {
        assert!(matches!(truncate_message("short", 1), Cow::Borrowed("short")));
        let long = "y".repeat(5000);
        assert_eq!(truncate_message(&long, 0).len(), 5000);

        let exact = "z".repeat(1024);
        assert_eq!(truncate_message(&exact, 1).len(), 1024);
        assert!(!truncate_message(&exact, 1).ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte_backs_off() {
        // 5 bytes per pair, so byte 1021 falls inside a character
        let message = "é€".repeat(400);
        let truncated = truncate_message(&message, 1);
        assert!(truncated.len() <= 1024);
        assert!(truncated.ends_with("..."));
        assert!(message.starts_with(truncated.trim_end_matches("...")));
    }

    #[test]
    fn test_exit_and_panic_values() {
        let exit = Exit::new("fatal line");
        assert_eq!(exit.code(), 1);
        assert_eq!(exit.line(), "fatal line");

        let err = LogPanic::new("panic line");
        assert_eq!(err.to_string(), "panic line");
    }
}
