//! Error taxonomy for the logger
//!
//! The append path swallows every one of these; export and the archive reader
//! surface them to the caller as distinct variants.

use std::io;

use thiserror::Error;

/// Errors produced by logger operations
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Directory or file creation, open, read, write, or delete failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Export was requested over an interval that matches no log files
    #[error("no log files in the requested interval")]
    EmptySelection,

    /// Encrypted export was requested with an empty password
    #[error("export password must not be empty")]
    InvalidPassword,

    /// Encrypted export is not available in this build or on this platform
    #[error("encrypted export is not supported on this platform")]
    UnsupportedFeature,

    /// Archive bytes do not follow the stored-entry layout
    #[error("malformed archive: {0}")]
    MalformedArchive(String),
}

impl LoggerError {
    /// Build an I/O error with a context message
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        LoggerError::Io {
            context: context.into(),
            source,
        }
    }

    /// Underlying I/O error, if this is an I/O failure
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            LoggerError::Io { source, .. } => Some(source),
            _ => None,
        }
    }

    /// One-line message for people running the CLI
    ///
    /// Storage failures are reduced to their likely cause; everything else
    /// uses the `Display` text.
    pub fn user_message(&self) -> String {
        match self {
            LoggerError::Io { context, source } => match StorageFault::classify(source) {
                StorageFault::Other => format!("{}: {}", context, source),
                fault => format!("{}: {}", context, fault.describe()),
            },
            other => other.to_string(),
        }
    }
}

/// Likely cause of a storage I/O failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFault {
    /// No space left or quota exhausted
    Full,
    /// The process may not touch the path
    Denied,
    /// The path does not exist
    Missing,
    Other,
}

impl StorageFault {
    pub fn classify(error: &io::Error) -> Self {
        use io::ErrorKind;

        match error.kind() {
            ErrorKind::StorageFull | ErrorKind::QuotaExceeded | ErrorKind::WriteZero => {
                StorageFault::Full
            }
            ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => StorageFault::Denied,
            ErrorKind::NotFound => StorageFault::Missing,
            _ => match error.raw_os_error() {
                // ENOSPC, EDQUOT (Linux), EDQUOT (macOS)
                #[cfg(unix)]
                Some(28 | 122 | 69) => StorageFault::Full,
                // EACCES, EROFS
                #[cfg(unix)]
                Some(13 | 30) => StorageFault::Denied,
                _ => StorageFault::Other,
            },
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            StorageFault::Full => "no space left for log storage",
            StorageFault::Denied => "permission denied",
            StorageFault::Missing => "file or directory not found",
            StorageFault::Other => "storage error",
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, LoggerError>;

/// Attach a context message to an `io::Result`
pub trait IoContext<T> {
    fn io_context(self, context: &str) -> Result<T>;

    fn with_io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, context: &str) -> Result<T> {
        self.map_err(|e| LoggerError::io(context, e))
    }

    fn with_io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| LoggerError::io(f(), e))
    }
}
