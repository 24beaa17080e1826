//! Output targets shared between a logger and the loggers derived from it

pub mod rotating_file;

pub use rotating_file::{RotatingFile, RotationPolicy};

use crate::core::error::{LoggerError, Result};
use crate::core::options::{LoggerOptions, STDERR, STDOUT};
use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

enum SinkTarget {
    Stdout,
    Stderr,
    File(RotatingFile),
    Memory(Vec<u8>),
}

/// Cloneable handle to one output target.
///
/// Clones write to the same target; each line is written under one lock so
/// concurrent entries never interleave.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<SinkTarget>>,
}

impl SharedSink {
    fn from_target(target: SinkTarget) -> Self {
        Self {
            inner: Arc::new(Mutex::new(target)),
        }
    }

    /// Resolve the output target named by `options.output_path`.
    ///
    /// `"stdout"` (or empty) and `"stderr"` select the process streams; any
    /// other value is a rotating file configured from the rotation options.
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be opened
    pub fn open(options: &LoggerOptions) -> Result<Self> {
        match options.output_path.trim() {
            "" | STDOUT => Ok(Self::stdout()),
            STDERR => Ok(Self::stderr()),
            path => {
                let file = RotatingFile::open(path, RotationPolicy::from_options(options))?;
                Ok(Self::from_target(SinkTarget::File(file)))
            }
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::from_target(SinkTarget::Stdout)
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self::from_target(SinkTarget::Stderr)
    }

    /// In-memory buffer, read back with [`SharedSink::contents`]
    #[must_use]
    pub fn memory() -> Self {
        Self::from_target(SinkTarget::Memory(Vec::new()))
    }

    /// Everything written so far to a memory sink, empty for other targets
    #[must_use]
    pub fn contents(&self) -> String {
        match &*self.inner.lock() {
            SinkTarget::Memory(buf) => String::from_utf8_lossy(buf).into_owned(),
            _ => String::new(),
        }
    }

    /// `true` for a process stream attached to a terminal
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match &*self.inner.lock() {
            SinkTarget::Stdout => io::stdout().is_terminal(),
            SinkTarget::Stderr => io::stderr().is_terminal(),
            SinkTarget::File(_) | SinkTarget::Memory(_) => false,
        }
    }

    /// `true` if both handles write to the same target
    #[must_use]
    pub fn same_target(&self, other: &SharedSink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Write `line` plus a newline. Failures are reported on stderr.
    pub fn write_line(&self, line: &str) {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        if let Err(e) = self.write_bytes(&buf) {
            eprintln!("[LOGGER ERROR] Failed to write log entry: {}", e);
        }
    }

    fn write_bytes(&self, buf: &[u8]) -> io::Result<()> {
        match &mut *self.inner.lock() {
            SinkTarget::Stdout => io::stdout().lock().write_all(buf),
            SinkTarget::Stderr => io::stderr().lock().write_all(buf),
            SinkTarget::File(file) => file.write_all(buf),
            SinkTarget::Memory(mem) => {
                mem.extend_from_slice(buf);
                Ok(())
            }
        }
    }

    /// Flush the target.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying stream or file fails to flush
    pub fn sync(&self) -> Result<()> {
        let result = match &mut *self.inner.lock() {
            SinkTarget::Stdout => io::stdout().flush(),
            SinkTarget::Stderr => io::stderr().flush(),
            SinkTarget::File(file) => file.flush(),
            SinkTarget::Memory(_) => Ok(()),
        };
        result.map_err(|e| LoggerError::io_operation("flushing log output", e.to_string(), e))
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sync().map_err(io::Error::from)
    }
}

impl std::fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &*self.inner.lock() {
            SinkTarget::Stdout => "stdout".to_string(),
            SinkTarget::Stderr => "stderr".to_string(),
            SinkTarget::File(file) => file.path().display().to_string(),
            SinkTarget::Memory(_) => "memory".to_string(),
        };
        f.debug_struct("SharedSink").field("target", &target).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::with_output_path;
    use tempfile::tempdir;

    #[test]
    fn test_memory_sink_shared_between_clones() {
        let sink = SharedSink::memory();
        let clone = sink.clone();
        sink.write_line("first");
        clone.write_line("second");

        assert_eq!(sink.contents(), "first\nsecond\n");
        assert!(sink.same_target(&clone));
        assert!(!sink.same_target(&SharedSink::memory()));
    }

    #[test]
    fn test_open_resolves_targets() {
        let sink = SharedSink::open(&LoggerOptions::default()).unwrap();
        assert_eq!(format!("{:?}", sink), "SharedSink { target: \"stdout\" }");

        let options = LoggerOptions::default().apply(&[with_output_path("stderr")]);
        let sink = SharedSink::open(&options).unwrap();
        assert_eq!(format!("{:?}", sink), "SharedSink { target: \"stderr\" }");
    }

    #[test]
    fn test_file_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/app.log");
        let options =
            LoggerOptions::default().apply(&[with_output_path(path.display().to_string())]);

        let sink = SharedSink::open(&options).unwrap();
        sink.write_line("hello file");
        sink.sync().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello file\n");
        assert!(!sink.is_terminal());
    }
}
