//! locallog - on-device structured logging
//!
//! Appends leveled, timestamped lines to rotating files, purges files past a
//! retention window, and exports a time range of logs as a ZIP bundle or a
//! password-encrypted archive.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggerConfig;
pub use error::{LoggerError, Result};
pub use logging::{DateInterval, LogLevel, Logger};
