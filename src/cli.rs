//! Command-line interface for the `locallog` binary

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::archive::read_archive;
use crate::config::{config_file_path, LoggerConfig};
use crate::logging::{file_times, DateInterval, LogLevel, Logger};

/// locallog - append, purge, and export on-device log files
#[derive(Debug, Parser)]
#[command(name = "locallog", version, about)]
pub struct Cli {
    /// Path to a TOML configuration file (default: ~/.locallog/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print diagnostic tracing output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Append one line to a new log file
    ///
    /// Each invocation starts its own file; rotation across lines only
    /// happens within one process.
    Log {
        /// trace, debug, info, warning, error, or fault
        level: LogLevel,
        message: String,
        /// Metadata pair, may be repeated
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },
    /// Delete log files older than the retention window
    Purge,
    /// List log files, oldest first
    List,
    /// Bundle the log files of an interval into an archive
    Export {
        /// Interval start, RFC 3339 or epoch seconds
        #[arg(long, value_parser = parse_timestamp)]
        from: DateTime<Utc>,
        /// Interval end, RFC 3339 or epoch seconds
        #[arg(long, value_parser = parse_timestamp)]
        to: DateTime<Utc>,
        /// Produce an encrypted archive with this password
        #[arg(long)]
        password: Option<String>,
    },
    /// Check a plain export archive and list its entries
    Verify { archive: PathBuf },
    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Resolve the configuration for this invocation
    pub fn load_config(&self) -> Result<LoggerConfig> {
        match &self.config {
            Some(path) => LoggerConfig::load_from_path(path),
            None => LoggerConfig::load(),
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;

        match self.command {
            Commands::Config { json } => display_config(&config, json),
            Commands::Verify { archive } => verify_archive(&archive),
            command => {
                let logger = Arc::new(Logger::new(config));
                run_logger_command(&logger, command).await
            }
        }
    }
}

async fn run_logger_command(logger: &Arc<Logger>, command: Commands) -> Result<()> {
    match command {
        Commands::Log {
            level,
            message,
            meta,
        } => {
            logger.log_with_metadata(level, &message, &meta);
            logger.flush_async().await;
            if logger.write_failure_count() > 0 {
                anyhow::bail!(
                    "Failed to write to {}",
                    logger.config().logs_dir.display()
                );
            }
        }
        Commands::Purge => {
            let removed = logger.purge_expired_logs_async().await;
            println!("Removed {} expired log file(s)", removed);
        }
        Commands::List => {
            for path in logger.list_log_files()? {
                let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                let modified = file_times::file_timestamp(&path)
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", modified, size, path.display());
            }
        }
        Commands::Export { from, to, password } => {
            if from > to {
                anyhow::bail!("--from must not be later than --to");
            }
            let interval = DateInterval::new(from, to);
            let path = match password {
                Some(password) => {
                    logger
                        .export_encrypted_logs_async(interval, password)
                        .await?
                }
                None => logger.export_logs_async(interval).await?,
            };
            println!("{}", path.display());
        }
        Commands::Config { .. } | Commands::Verify { .. } => {}
    }
    Ok(())
}

fn display_config(config: &LoggerConfig, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration to JSON")?;
        println!("{json}");
    } else {
        let toml = toml::to_string_pretty(config)
            .context("Failed to serialize configuration to TOML")?;
        println!("# {}", config_file_path().display());
        print!("{toml}");
    }
    Ok(())
}

fn verify_archive(path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = read_archive(&bytes)
        .with_context(|| format!("{} is not a valid log archive", path.display()))?;
    for entry in &entries {
        println!("{:08x}\t{}\t{}", entry.crc32, entry.data.len(), entry.name);
    }
    println!("{} entries OK", entries.len());
    Ok(())
}

/// Parse `KEY=VALUE`
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse an RFC 3339 timestamp or whole epoch seconds
fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or_else(|| format!("`{s}` is neither RFC 3339 nor epoch seconds"))
}
