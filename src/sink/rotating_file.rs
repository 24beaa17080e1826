//! Size-rotating log file with optional gzip compression
//!
//! The live file is `name`; rotated backups are `name.1`, `name.2`, ... with
//! `name.1` the most recent. Compressed backups carry a `.gz` suffix.

use crate::core::error::{LoggerError, Result};
use crate::core::options::LoggerOptions;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// When and how a [`RotatingFile`] recycles its backups
///
/// # Examples
///
/// ```
/// use logface::sink::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes that triggers rotation, 0 disables rotation
    pub max_bytes: u64,
    /// Backups kept, 0 keeps all
    pub max_backups: usize,
    /// Backups older than this many days are removed, 0 keeps all
    pub max_age_days: u64,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from_options(&LoggerOptions::default())
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the policy from logger options: MB to bytes, age to whole days
    #[must_use]
    pub fn from_options(options: &LoggerOptions) -> Self {
        Self {
            max_bytes: options.max_log_size.saturating_mul(1024 * 1024),
            max_backups: options.max_log_files,
            max_age_days: options.max_log_age.as_secs() / SECONDS_PER_DAY,
            compress: options.compress_logs,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// Append-only file that rotates itself by size
pub struct RotatingFile {
    base_path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    current_size: u64,
}

impl RotatingFile {
    /// Open (or create) the live file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn open<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = open_append(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            file: Some(file),
            current_size,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Path of backup `index`, uncompressed
    #[must_use]
    pub fn backup_path(&self, index: usize) -> PathBuf {
        suffixed(&self.base_path, &index.to_string())
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.policy.max_bytes > 0
            && self.current_size > 0
            && self.current_size.saturating_add(incoming) > self.policy.max_bytes
    }

    /// Shift backups, move the live file to `.1` and reopen.
    ///
    /// # Errors
    ///
    /// Returns error if the live file cannot be moved or reopened
    pub fn rotate(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                eprintln!(
                    "[LOGGER WARNING] Failed to flush '{}' before rotation: {}",
                    self.base_path.display(),
                    e
                );
            }
        }

        self.shift_backups();

        let first = self.backup_path(1);
        let moved = fs::rename(&self.base_path, &first);

        // Always reopen, even if the move failed, so writing can continue
        let (file, size) = open_append(&self.base_path)?;
        self.file = Some(file);
        self.current_size = size;

        moved.map_err(|e| {
            LoggerError::file_rotation(
                self.base_path.display().to_string(),
                format!("Failed to rotate current log file: {}", e),
            )
        })?;

        if self.policy.compress {
            if let Err(e) = compress_file(&first) {
                eprintln!("[LOGGER WARNING] Log compression failed: {}", e);
            }
        }

        self.prune();
        Ok(())
    }

    /// Rename `.N` to `.N+1`, highest index first
    fn shift_backups(&self) {
        let mut highest = 0;
        while self.backup_exists(highest + 1) {
            highest += 1;
        }

        for index in (1..=highest).rev() {
            for (from, to) in [
                (self.backup_path(index), self.backup_path(index + 1)),
                (gz_path(&self.backup_path(index)), gz_path(&self.backup_path(index + 1))),
            ] {
                if from.exists() {
                    if let Err(e) = fs::rename(&from, &to) {
                        eprintln!(
                            "[LOGGER WARNING] Failed to shift backup {}: {}",
                            from.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    fn backup_exists(&self, index: usize) -> bool {
        let plain = self.backup_path(index);
        plain.exists() || gz_path(&plain).exists()
    }

    /// Remove backups beyond the count limit or older than the age limit
    fn prune(&self) {
        let max_age = (self.policy.max_age_days > 0)
            .then(|| Duration::from_secs(self.policy.max_age_days * SECONDS_PER_DAY));
        let now = SystemTime::now();

        let mut index = 1;
        while self.backup_exists(index) {
            let over_count = self.policy.max_backups > 0 && index > self.policy.max_backups;
            for path in [self.backup_path(index), gz_path(&self.backup_path(index))] {
                let too_old = max_age.is_some_and(|max_age| {
                    fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .ok()
                        .and_then(|modified| now.duration_since(modified).ok())
                        .is_some_and(|age| age > max_age)
                });
                if (over_count || too_old) && path.exists() {
                    if let Err(e) = fs::remove_file(&path) {
                        eprintln!(
                            "[LOGGER WARNING] Failed to remove old backup {}: {}",
                            path.display(),
                            e
                        );
                    }
                }
            }
            index += 1;
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len() as u64) {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
            }
        }

        if self.file.is_none() {
            let (file, size) = open_append(&self.base_path).map_err(io::Error::from)?;
            self.file = Some(file);
            self.current_size = size;
        }

        match self.file.as_mut() {
            Some(file) => {
                let written = file.write(buf)?;
                self.current_size += written as u64;
                Ok(written)
            }
            None => Err(io::Error::other("log file not open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_open(path.display().to_string(), format!("Failed to open: {}", e))
        })?;

    let size = file.metadata().map(|m| m.len()).map_err(|e| {
        LoggerError::file_open(
            path.display().to_string(),
            format!("Cannot access file metadata: {}", e),
        )
    })?;

    Ok((file, size))
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn gz_path(path: &Path) -> PathBuf {
    suffixed(path, "gz")
}

/// Gzip `path` into `path.gz`, removing the original only on success
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter};

    let gz_path = gz_path(path);
    let temp_path = suffixed(&gz_path, "tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut writer| writer.flush());
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }

    Ok(())
}
