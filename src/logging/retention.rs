//! Log file retention management
//!
//! Handles cleanup of log files older than a retention window.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::file_times::file_timestamp;

/// Default retention period (7 days)
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Delete every file whose timestamp is strictly earlier than `reference - retention`
///
/// Files without a discoverable timestamp are left alone. Deletion is
/// best-effort: a file that cannot be removed is skipped.
///
/// Returns the number of files deleted.
pub fn purge_expired_files(
    files: &[PathBuf],
    reference: SystemTime,
    retention: Duration,
) -> usize {
    let cutoff = reference
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted_count = 0;

    for path in files {
        let Some(modified) = file_timestamp(path) else {
            continue;
        };

        if modified >= cutoff {
            continue;
        }

        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed expired log file");
                deleted_count += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove expired log file");
            }
        }
    }

    deleted_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn log_file_aged(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"test log content").unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_purge_empty_list() {
        let count = purge_expired_files(&[], SystemTime::now(), DEFAULT_RETENTION);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_purge_removes_only_expired_files() {
        let temp_dir = TempDir::new().unwrap();
        let old = log_file_aged(temp_dir.path(), "app-1.log", Duration::from_secs(3600));
        let recent = log_file_aged(temp_dir.path(), "app-2.log", Duration::from_secs(10));

        let count = purge_expired_files(
            &[old.clone(), recent.clone()],
            SystemTime::now(),
            Duration::from_secs(60),
        );

        assert_eq!(count, 1);
        assert!(!old.exists());
        assert!(recent.exists());
    }

    #[test]
    fn test_file_exactly_at_cutoff_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app-1.log");
        let file = File::create(&path).unwrap();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        file.set_modified(stamp).unwrap();
        drop(file);

        let retention = Duration::from_secs(100);
        let count = purge_expired_files(&[path.clone()], stamp + retention, retention);
        assert_eq!(count, 0);
        assert!(path.exists());

        let count = purge_expired_files(
            &[path.clone()],
            stamp + retention + Duration::from_secs(1),
            retention,
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let ghost = temp_dir.path().join("ghost.log");
        let old = log_file_aged(temp_dir.path(), "app-1.log", Duration::from_secs(3600));

        let count = purge_expired_files(&[ghost, old.clone()], SystemTime::now(), Duration::ZERO);
        assert_eq!(count, 1);
        assert!(!old.exists());
    }

    #[test]
    fn test_zero_retention_keeps_future_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app-1.log");
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(600))
            .unwrap();
        drop(file);

        let count = purge_expired_files(&[path.clone()], SystemTime::now(), Duration::ZERO);
        assert_eq!(count, 0);
        assert!(path.exists());
    }
}
