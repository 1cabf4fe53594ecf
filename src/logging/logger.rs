//! Logger facade
//!
//! Every operation runs inside one serialized context per logger: a reentrant
//! lock around the writer, configuration and purge timer. A console sink or
//! encryption backend that calls back into the same logger from inside that
//! context runs inline instead of deadlocking.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use tracing::debug;

use super::console::{ConsoleSink, StderrConsole};
use super::export::{export_encrypted, export_plain};
use super::file_writer::RotatingWriter;
use super::level::LogLevel;
use super::retention::purge_expired_files;
use super::selection::{select_files, DateInterval};
use super::timestamp::timestamp_string;
use crate::archive::{ArchiveEncryptor, UnsupportedEncryptor};
use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};

type FailureHook = Box<dyn Fn(&LoggerError) + Send + Sync>;

/// Mutable state guarded by the serialized context
struct LoggerState {
    config: LoggerConfig,
    writer: RotatingWriter,
    /// When the last sweep ran; in memory only, so a restart resets it
    last_purge: Option<SystemTime>,
}

impl LoggerState {
    fn maybe_purge(&mut self, now: SystemTime) {
        let interval = self.config.auto_purge_interval();
        if interval.is_zero() {
            return;
        }

        let due = match self.last_purge {
            None => true,
            Some(last) => now
                .duration_since(last)
                .map(|elapsed| elapsed >= interval)
                .unwrap_or(false),
        };
        if due {
            self.purge(now);
        }
    }

    fn purge(&mut self, now: SystemTime) -> usize {
        self.last_purge = Some(now);

        let retention = self.config.retention();
        if retention.is_zero() {
            return 0;
        }

        let Ok(files) = self.writer.list_log_files() else {
            return 0;
        };
        let removed = purge_expired_files(&files, now, retention);
        if self.writer.release_if_removed() {
            debug!("Open log file was purged, next write starts a new file");
        }
        if removed > 0 {
            debug!(removed, "Purged expired log files");
        }
        removed
    }

    fn selected_files(&self, interval: &DateInterval) -> Result<Vec<PathBuf>> {
        let files = self.writer.list_log_files()?;
        let selected = select_files(&files, interval);
        if selected.is_empty() {
            return Err(LoggerError::EmptySelection);
        }
        Ok(selected)
    }
}

/// Leveled logger writing to rotating files
pub struct Logger {
    context: ReentrantMutex<RefCell<LoggerState>>,
    console: Box<dyn ConsoleSink>,
    encryptor: Box<dyn ArchiveEncryptor>,
    write_failures: AtomicU64,
    on_write_failure: Option<FailureHook>,
}

impl Logger {
    /// Create a logger; the configuration is normalized first
    pub fn new(config: LoggerConfig) -> Self {
        let config = config.normalized();
        let writer = RotatingWriter::from_config(&config);
        Self {
            context: ReentrantMutex::new(RefCell::new(LoggerState {
                config,
                writer,
                last_purge: None,
            })),
            console: Box::new(StderrConsole),
            encryptor: Box::new(UnsupportedEncryptor),
            write_failures: AtomicU64::new(0),
            on_write_failure: None,
        }
    }

    /// Replace the console sink (default: standard error)
    pub fn with_console(mut self, console: impl ConsoleSink + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Install an encrypted archive backend (default: unsupported)
    pub fn with_encryptor(mut self, encryptor: impl ArchiveEncryptor + 'static) -> Self {
        self.encryptor = Box::new(encryptor);
        self
    }

    /// Observe append failures that `log` swallows
    pub fn with_write_failure_hook(
        mut self,
        hook: impl Fn(&LoggerError) + Send + Sync + 'static,
    ) -> Self {
        self.on_write_failure = Some(Box::new(hook));
        self
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> LoggerConfig {
        let guard = self.context.lock();
        let state = guard.borrow();
        state.config.clone()
    }

    /// Number of append or flush failures swallowed so far
    pub fn write_failure_count(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn fault(&self, message: &str) {
        self.log(LogLevel::Fault, message);
    }

    /// Log a message without metadata
    pub fn log(&self, level: LogLevel, message: &str) {
        self.log_with_metadata::<&str, &str>(level, message, &[]);
    }

    /// Log a message followed by `key=value` pairs sorted by key
    ///
    /// Never fails: append errors are counted and reported to the failure
    /// hook, then dropped.
    pub fn log_with_metadata<K, V>(&self, level: LogLevel, message: &str, metadata: &[(K, V)])
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let guard = self.context.lock();
        let now = Utc::now();
        let line = build_log_line(level, message, metadata, now);

        let mirror = {
            let state = guard.borrow();
            state.config.console_enabled && level >= state.config.console_minimum_level
        };
        if mirror {
            self.console.write_line(level, &line);
        }

        let result = {
            let mut state = guard.borrow_mut();
            let written = state.writer.write(&line);
            if written.is_ok() {
                state.maybe_purge(SystemTime::from(now));
            }
            written
        };
        if let Err(e) = result {
            self.record_write_failure(&e);
        }
    }

    /// Change the lowest level mirrored to the console
    pub fn set_console_minimum_level(&self, level: LogLevel) {
        let guard = self.context.lock();
        guard.borrow_mut().config.console_minimum_level = level;
    }

    pub fn console_minimum_level(&self) -> LogLevel {
        let guard = self.context.lock();
        let level = guard.borrow().config.console_minimum_level;
        level
    }

    /// Persist buffered bytes of the open log file; failures are swallowed
    pub fn flush(&self) {
        let guard = self.context.lock();
        let result = guard.borrow_mut().writer.flush();
        if let Err(e) = result {
            self.record_write_failure(&e);
        }
    }

    /// Sweep expired files now, regardless of the auto-purge timer
    ///
    /// Returns the number of files removed.
    pub fn purge_expired_logs(&self) -> usize {
        let guard = self.context.lock();
        let removed = guard.borrow_mut().purge(SystemTime::now());
        removed
    }

    /// All log files of this logger, sorted by name (creation order)
    pub fn list_log_files(&self) -> Result<Vec<PathBuf>> {
        let guard = self.context.lock();
        let mut files = guard.borrow().writer.list_log_files()?;
        files.sort();
        Ok(files)
    }

    /// Bundle the log files inside `interval` into a plain archive
    ///
    /// Fails with [`LoggerError::EmptySelection`] when no file matches; no
    /// output is written in that case.
    pub fn export_logs(&self, interval: &DateInterval) -> Result<PathBuf> {
        let guard = self.context.lock();
        let state = guard.borrow();
        let selected = state.selected_files(interval)?;
        export_plain(
            &selected,
            interval,
            &state.config.file_prefix,
            &state.config.export_dir,
        )
    }

    /// Bundle the log files inside `interval` into a password-encrypted archive
    pub fn export_encrypted_logs(&self, interval: &DateInterval, password: &str) -> Result<PathBuf> {
        if password.is_empty() {
            return Err(LoggerError::InvalidPassword);
        }
        if !self.encryptor.is_available() {
            return Err(LoggerError::UnsupportedFeature);
        }

        let guard = self.context.lock();
        let (selected, prefix, export_dir) = {
            let state = guard.borrow();
            (
                state.selected_files(interval)?,
                state.config.file_prefix.clone(),
                state.config.export_dir.clone(),
            )
        };

        export_encrypted(
            &selected,
            interval,
            &prefix,
            &export_dir,
            password,
            self.encryptor.as_ref(),
        )
    }

    fn record_write_failure(&self, error: &LoggerError) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
        debug!(error = %error, "Dropped log write");
        if let Some(hook) = &self.on_write_failure {
            hook(error);
        }
    }

    pub async fn flush_async(self: &Arc<Self>) {
        let logger = Arc::clone(self);
        let _ = tokio::task::spawn_blocking(move || logger.flush()).await;
    }

    pub async fn purge_expired_logs_async(self: &Arc<Self>) -> usize {
        let logger = Arc::clone(self);
        tokio::task::spawn_blocking(move || logger.purge_expired_logs())
            .await
            .unwrap_or(0)
    }

    pub async fn export_logs_async(self: &Arc<Self>, interval: DateInterval) -> Result<PathBuf> {
        let logger = Arc::clone(self);
        tokio::task::spawn_blocking(move || logger.export_logs(&interval))
            .await
            .map_err(join_error)?
    }

    pub async fn export_encrypted_logs_async(
        self: &Arc<Self>,
        interval: DateInterval,
        password: String,
    ) -> Result<PathBuf> {
        let logger = Arc::clone(self);
        tokio::task::spawn_blocking(move || logger.export_encrypted_logs(&interval, &password))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> LoggerError {
    LoggerError::io("Export task failed", io::Error::other(e))
}

/// Render `[{timestamp}] [{LEVEL}] {message}` plus sorted `key=value` pairs
pub fn build_log_line<K, V>(
    level: LogLevel,
    message: &str,
    metadata: &[(K, V)],
    at: DateTime<Utc>,
) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let ts = timestamp_string(at);
    if metadata.is_empty() {
        return format!("[{}] [{}] {}", ts, level.as_str(), message);
    }

    let mut pairs: Vec<(&str, &str)> = metadata
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let metadata = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");

    format!("[{}] [{}] {} {}", ts, level.as_str(), message, metadata)
}
