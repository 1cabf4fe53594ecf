//! Size-based rotating log file writer
//!
//! Owns the single file currently open for append. A write that would push the
//! open file past the size limit closes it first, so every line lands whole in
//! exactly one file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::config::LoggerConfig;
use crate::error::{IoContext, Result};

/// Extension used by log files
pub const LOG_FILE_EXTENSION: &str = "log";

/// Build the path of a log file created at `epoch_millis`
///
/// Format: `{prefix}-{epochMillis}-{lowercase uuid}.log`
pub fn create_log_file_path(logs_dir: &Path, prefix: &str, epoch_millis: i64) -> PathBuf {
    let uuid = Uuid::new_v4().hyphenated().to_string();
    logs_dir.join(format!(
        "{}-{}-{}.{}",
        prefix, epoch_millis, uuid, LOG_FILE_EXTENSION
    ))
}

/// Check whether a file name belongs to this writer's log set
pub fn is_log_file_name(name: &str, prefix: &str) -> bool {
    !name.starts_with('.')
        && name.starts_with(prefix)
        && Path::new(name).extension().and_then(|e| e.to_str()) == Some(LOG_FILE_EXTENSION)
}

/// The file currently open for append
#[derive(Debug)]
struct OpenLogFile {
    file: File,
    path: PathBuf,
    size: u64,
}

/// Appends lines to size-bounded log files
#[derive(Debug)]
pub struct RotatingWriter {
    logs_dir: PathBuf,
    file_prefix: String,
    max_file_size_bytes: u64,
    current: Option<OpenLogFile>,
    /// Millisecond stamp of the last file opened, keeps names strictly increasing
    last_file_millis: i64,
}

impl RotatingWriter {
    /// Create a writer; no file is opened until the first write
    pub fn new(logs_dir: PathBuf, file_prefix: impl Into<String>, max_file_size_bytes: u64) -> Self {
        Self {
            logs_dir,
            file_prefix: file_prefix.into(),
            max_file_size_bytes,
            current: None,
            last_file_millis: i64::MIN,
        }
    }

    /// Create a writer from a logger configuration
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(
            config.logs_dir.clone(),
            config.file_prefix.clone(),
            config.max_file_size_bytes,
        )
    }

    /// Path of the file currently open for append, if any
    pub fn current_file(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    /// Bytes written to the file currently open for append
    pub fn current_file_size(&self) -> u64 {
        self.current.as_ref().map(|c| c.size).unwrap_or(0)
    }

    /// Append `line` plus a newline, rotating first if the file would overflow
    pub fn write(&mut self, line: &str) -> Result<()> {
        self.ensure_logs_dir()?;

        let mut data = String::with_capacity(line.len() + 1);
        data.push_str(line);
        data.push('\n');
        let bytes = data.as_bytes();

        self.rotate_if_needed(bytes.len() as u64);

        if self.current.is_none() {
            self.current = Some(self.open_new_file()?);
        }

        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };

        if let Err(e) = current.file.write_all(bytes) {
            // A partial write leaves the tracked size unreliable; start fresh next time
            let path = current.path.display().to_string();
            self.current = None;
            return Err(e).with_io_context(|| format!("Failed to append to log file {}", path));
        }
        current.size += bytes.len() as u64;
        Ok(())
    }

    /// Persist everything written so far to storage
    pub fn flush(&mut self) -> Result<()> {
        if let Some(current) = self.current.as_mut() {
            current.file.flush().io_context("Failed to flush log file")?;
            current.file.sync_data().io_context("Failed to sync log file")?;
        }
        Ok(())
    }

    /// Forget the open file if it was deleted out from under the writer
    ///
    /// Returns true when the handle was released.
    pub fn release_if_removed(&mut self) -> bool {
        let removed = self
            .current
            .as_ref()
            .map(|c| !c.path.exists())
            .unwrap_or(false);
        if removed {
            self.current = None;
        }
        removed
    }

    /// All log files in the directory that carry this writer's prefix, unordered
    pub fn list_log_files(&self) -> Result<Vec<PathBuf>> {
        self.ensure_logs_dir()?;

        let entries = fs::read_dir(&self.logs_dir).io_context("Failed to read logs directory")?;
        let mut files = Vec::new();

        for entry in entries {
            let entry = entry.io_context("Failed to read logs directory entry")?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if is_log_file_name(name, &self.file_prefix) {
                files.push(entry.path());
            }
        }

        Ok(files)
    }

    /// Close the current file when `incoming_bytes` would overflow it
    fn rotate_if_needed(&mut self, incoming_bytes: u64) {
        let Some(current) = self.current.as_ref() else {
            return;
        };

        if current.size + incoming_bytes <= self.max_file_size_bytes {
            return;
        }

        debug!(
            path = %current.path.display(),
            size = current.size,
            incoming_bytes,
            "Rotating log file"
        );
        self.current = None;
    }

    fn open_new_file(&mut self) -> Result<OpenLogFile> {
        let millis = Utc::now()
            .timestamp_millis()
            .max(self.last_file_millis.saturating_add(1));
        let path = create_log_file_path(&self.logs_dir, &self.file_prefix, millis);

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .with_io_context(|| format!("Failed to create log file {}", path.display()))?;

        self.last_file_millis = millis;
        debug!(path = %path.display(), "Opened new log file");

        Ok(OpenLogFile {
            file,
            path,
            size: 0,
        })
    }

    fn ensure_logs_dir(&self) -> Result<()> {
        if self.logs_dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.logs_dir).io_context("Failed to create logs directory")
    }
}
