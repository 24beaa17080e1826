//! Concrete logger backends and their providers

pub mod capture;
pub mod console;
#[cfg(feature = "log-backend")]
pub mod log_adapter;
#[cfg(feature = "tracing-backend")]
pub mod tracing_adapter;

pub use capture::{CaptureLogger, CaptureProvider, CaptureStore, CapturedEntry};
pub use console::{ConsoleLogger, ConsoleProvider};
#[cfg(feature = "log-backend")]
pub use log_adapter::{LogLogger, LogProvider};
#[cfg(feature = "tracing-backend")]
pub use tracing_adapter::{TracingLogger, TracingProvider};

use crate::core::{field, format_fields, Field, LogLevel, LoggerProvider};
use std::sync::Arc;

/// The providers compiled into this build, keyed by registry name
pub fn builtin_providers() -> Vec<(&'static str, Arc<dyn LoggerProvider>)> {
    let mut providers: Vec<(&'static str, Arc<dyn LoggerProvider>)> =
        vec![(console::PROVIDER_NAME, Arc::new(ConsoleProvider))];
    #[cfg(feature = "tracing-backend")]
    providers.push((tracing_adapter::PROVIDER_NAME, Arc::new(TracingProvider)));
    #[cfg(feature = "log-backend")]
    providers.push((log_adapter::PROVIDER_NAME, Arc::new(LogProvider)));
    providers
}

/// `[LEVEL] [name] message k=v`, used where the backend does not hand back
/// its own rendering
pub(crate) fn plain_line(level: LogLevel, name: &str, message: &str, fields: &[Field]) -> String {
    let mut line = format!("[{}] [{}] {}", level, name, message);
    if !fields.is_empty() {
        line.push(' ');
        line.push_str(&format_fields(fields));
    }
    line
}

/// Tags fatal and panic entries with `severity` for backends whose levels
/// stop at error
pub(crate) fn push_severity(level: LogLevel, fields: &mut Vec<Field>) {
    if matches!(level, LogLevel::Fatal | LogLevel::Panic) {
        fields.push(field("severity", level.as_str()));
    }
}
