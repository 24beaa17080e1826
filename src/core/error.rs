//! Errors surfaced by logger construction, configuration loading and flushing
//!
//! Emit calls never return these; write failures are reported on stderr.

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Lookup of a provider name nobody registered
    #[error("Logger provider not found: '{name}'")]
    ProviderNotFound { name: String },

    /// A JSON or TOML document that does not describe a `LogConfig`
    #[error("Failed to parse {format} configuration: {message}")]
    ConfigParse { format: String, message: String },

    /// Failed IO with what was being attempted
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The live log file could not be opened
    #[error("Cannot open log file '{path}': {message}")]
    FileOpen { path: String, message: String },

    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },
}

impl LoggerError {
    pub fn provider_not_found(name: impl Into<String>) -> Self {
        LoggerError::ProviderNotFound { name: name.into() }
    }

    pub fn config_parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ConfigParse {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn file_open(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// `true` for an unknown provider name
    #[must_use]
    pub fn is_provider_not_found(&self) -> bool {
        matches!(self, LoggerError::ProviderNotFound { .. })
    }
}

/// Lets [`SharedSink`](crate::sink::SharedSink) report flush failures through `io::Write`
impl From<LoggerError> for std::io::Error {
    fn from(err: LoggerError) -> Self {
        match err {
            LoggerError::IoError(e) => e,
            LoggerError::IoOperation { source, .. } => source,
            other => std::io::Error::other(other),
        }
    }
}
