//! Console mirroring of log lines

use std::io::Write;

use super::level::LogLevel;

/// Destination for lines mirrored to the console
///
/// The logger calls this from inside its serialized context, after the level
/// threshold has been checked. Implementations may log through the same
/// logger again; nested calls run inline.
pub trait ConsoleSink: Send + Sync {
    fn write_line(&self, level: LogLevel, line: &str);
}

/// Writes each line to the process's standard error
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrConsole;

impl ConsoleSink for StderrConsole {
    fn write_line(&self, _level: LogLevel, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }
}

impl<F> ConsoleSink for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn write_line(&self, level: LogLevel, line: &str) {
        self(level, line)
    }
}
