//! In-memory backend recording every emitted entry
//!
//! Useful as a test double and for registering custom providers. Entries are
//! kept in a [`CaptureStore`] shared by the provider, its loggers and every
//! logger derived from them.
//!
//! # Examples
//!
//! ```
//! use logface::backends::CaptureProvider;
//! use logface::core::{field, Logger, LoggerProvider};
//!
//! let provider = CaptureProvider::new();
//! let logger = provider.create("svc", &[]).unwrap();
//! logger.info("ready", &[field("port", 8080)]);
//!
//! let entries = provider.store().entries();
//! assert_eq!(entries[0].message, "ready");
//! ```

use super::plain_line;
use crate::core::{
    Context, Field, FieldValue, LogLevel, Logger, LoggerOption, LoggerProvider, LoggerRef,
    LoggerState, Result,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One recorded entry
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEntry {
    pub logger: String,
    pub level: LogLevel,
    /// Message after truncation
    pub message: String,
    /// Accumulated and per-call fields, merged
    pub fields: Vec<Field>,
}

impl CapturedEntry {
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}

/// Shared, cloneable entry buffer
#[derive(Debug, Clone, Default)]
pub struct CaptureStore {
    entries: Arc<Mutex<Vec<CapturedEntry>>>,
    syncs: Arc<AtomicUsize>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: CapturedEntry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<CapturedEntry> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of `sync` calls made by loggers writing to this store
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::Relaxed)
    }
}

/// Logger appending entries to a [`CaptureStore`]
pub struct CaptureLogger {
    state: LoggerState,
    store: CaptureStore,
}

impl CaptureLogger {
    pub fn new(state: LoggerState, store: CaptureStore) -> Self {
        Self { state, store }
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    fn derive(&self, state: LoggerState) -> LoggerRef {
        Arc::new(Self::new(state, self.store.clone()))
    }
}

impl Logger for CaptureLogger {
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
        let entry = CapturedEntry {
            logger: self.state.name().to_string(),
            level,
            message: self.state.truncate(message).into_owned(),
            fields: self.state.merged_fields(fields),
        };
        let line = plain_line(level, &entry.logger, &entry.message, &entry.fields);
        self.store.push(entry);
        Some(line)
    }

    fn with_fields(&self, fields: Vec<Field>) -> LoggerRef {
        self.derive(self.state.fork_with_fields(&fields))
    }

    fn with_context(&self, context: Context) -> LoggerRef {
        self.derive(self.state.fork_with_context(context))
    }

    fn sync(&self) -> Result<()> {
        self.store.syncs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Provider whose loggers all record into one [`CaptureStore`]
#[derive(Debug, Clone, Default)]
pub struct CaptureProvider {
    store: CaptureStore,
}

impl CaptureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: CaptureStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }
}

impl LoggerProvider for CaptureProvider {
    fn create(&self, name: &str, options: &[LoggerOption]) -> Result<LoggerRef> {
        let options = self.resolve_options(options);
        Ok(Arc::new(CaptureLogger::new(
            LoggerState::new(name, &options),
            self.store.clone(),
        )))
    }
}
