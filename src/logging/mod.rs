//! Logging system for locallog
//!
//! Leveled lines are appended to size-bounded log files, expired files are
//! swept by age, and selected files can be exported as archive bundles.

mod console;
mod export;
pub mod file_times;
mod file_writer;
mod level;
mod logger;
mod retention;
mod selection;
mod timestamp;

pub use console::{ConsoleSink, StderrConsole};
pub use export::{
    export_encrypted, export_file_name, export_plain, ENCRYPTED_EXPORT_EXTENSION,
    PLAIN_EXPORT_EXTENSION,
};
pub use file_writer::{create_log_file_path, is_log_file_name, RotatingWriter, LOG_FILE_EXTENSION};
pub use level::{LogLevel, ParseLevelError};
pub use logger::{build_log_line, Logger};
pub use retention::{purge_expired_files, DEFAULT_RETENTION};
pub use selection::{select_files, DateInterval};
pub use timestamp::timestamp_string;
