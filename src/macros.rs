//! Formatting macros over any [`Logger`](crate::core::Logger).
//!
//! Arguments are only formatted when the level is enabled. Fields may be
//! given as `"key" => value` pairs before a `;`.
//!
//! # Examples
//!
//! ```
//! use logface::backends::CaptureProvider;
//! use logface::core::LoggerProvider;
//! use logface::{info, warn};
//!
//! let provider = CaptureProvider::new();
//! let logger = provider.create("server", &[]).unwrap();
//!
//! info!(logger, "Server started");
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! warn!(logger, "path" => "/health", "status" => 503; "Probe failed after {} tries", 3);
//!
//! assert_eq!(provider.store().len(), 3);
//! ```

use crate::core::Exit;

/// Log at an explicit level.
///
/// ```
/// # use logface::backends::CaptureProvider;
/// # use logface::core::{LogLevel, LoggerProvider};
/// # let logger = CaptureProvider::new().create("doc", &[]).unwrap();
/// use logface::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($key:literal => $value:expr),+ ; $($arg:tt)+) => {{
        use $crate::core::Logger as _;
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.emit(
                level,
                &::std::format!($($arg)+),
                &[$($crate::core::field($key, $value)),+],
            );
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::core::Logger as _;
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.emit(level, &::std::format!($($arg)+), &[]);
        }
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message, evaluating to `Option<Exit>`.
///
/// ```
/// # use logface::backends::CaptureProvider;
/// # use logface::core::LoggerProvider;
/// # let logger = CaptureProvider::new().create("doc", &[]).unwrap();
/// use logface::fatal;
/// if let Some(exit) = fatal!(logger, "Unable to recover: {}", "disk full") {
///     assert_eq!(exit.code(), 1);
///     // exit.terminate() in a real program
/// }
/// ```
///
/// Like [`Logger::fatal`](crate::core::Logger::fatal), the result must be used:
///
/// ```compile_fail
/// #![deny(unused_must_use)]
/// # use logface::backends::CaptureProvider;
/// # use logface::core::LoggerProvider;
/// # let logger = CaptureProvider::new().create("doc", &[]).unwrap();
/// logface::fatal!(logger, "again {}", 1);
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::macros::must_terminate({
            use $crate::core::Logger as _;
            $logger.fatalf(::std::format_args!($($arg)+))
        })
    };
}

/// Carries the `must_use` lint through the `fatal!` expansion
#[doc(hidden)]
#[inline]
#[must_use = "call Exit::terminate() to end the process"]
pub fn must_terminate(exit: Option<Exit>) -> Option<Exit> {
    exit
}

/// Log a panic-level message, evaluating to `Result<(), LogPanic>`.
///
/// ```
/// # use logface::backends::CaptureProvider;
/// # use logface::core::LoggerProvider;
/// # let logger = CaptureProvider::new().create("doc", &[]).unwrap();
/// use logface::panic_log;
/// let err = panic_log!(logger, "Invariant violated: {}", 7).unwrap_err();
/// assert!(err.message.contains("Invariant violated: 7"));
/// ```
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::core::Logger as _;
        $logger.panicf(::std::format_args!($($arg)+))
    }};
}
