//! Time-range selection of log files

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use super::file_times::file_timestamp;

/// Closed time range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Interval reaching `before` into the past and `after` into the future of `at`
    pub fn around(at: DateTime<Utc>, before: Duration, after: Duration) -> Self {
        let before = chrono::Duration::from_std(before).unwrap_or(chrono::Duration::MAX);
        let after = chrono::Duration::from_std(after).unwrap_or(chrono::Duration::MAX);
        Self {
            start: at.checked_sub_signed(before).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: at.checked_add_signed(after).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// `contains` for a filesystem timestamp
    pub fn contains_system_time(&self, at: SystemTime) -> bool {
        self.contains(DateTime::<Utc>::from(at))
    }
}

/// Files whose timestamp falls inside `interval`, oldest first
///
/// Files without a discoverable timestamp are dropped. Files with equal
/// timestamps keep their input order.
pub fn select_files(files: &[PathBuf], interval: &DateInterval) -> Vec<PathBuf> {
    let mut selected: Vec<(SystemTime, &PathBuf)> = files
        .iter()
        .filter_map(|path| file_timestamp(path).map(|ts| (ts, path)))
        .filter(|(ts, _)| interval.contains_system_time(*ts))
        .collect();

    selected.sort_by_key(|(ts, _)| *ts);
    selected.into_iter().map(|(_, path)| path.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    const BASE: u64 = 1_700_000_000;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn utc(secs: u64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs as i64, 0).unwrap()
    }

    fn file_at(dir: &Path, name: &str, secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(at(secs)).unwrap();
        path
    }

    #[test]
    fn test_contains_is_inclusive() {
        let interval = DateInterval::new(utc(BASE), utc(BASE + 10));
        assert!(interval.contains(utc(BASE)));
        assert!(interval.contains(utc(BASE + 10)));
        assert!(interval.contains(utc(BASE + 5)));
        assert!(!interval.contains(utc(BASE - 1)));
        assert!(!interval.contains(utc(BASE + 11)));
    }

    #[test]
    fn test_around() {
        let interval = DateInterval::around(
            utc(BASE),
            Duration::from_secs(60),
            Duration::from_secs(30),
        );
        assert_eq!(interval.start, utc(BASE - 60));
        assert_eq!(interval.end, utc(BASE + 30));
    }

    #[test]
    fn test_select_filters_and_orders_by_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let late = file_at(dir, "c.log", BASE + 20);
        let early = file_at(dir, "a.log", BASE);
        let outside = file_at(dir, "b.log", BASE + 100);
        let middle = file_at(dir, "d.log", BASE + 10);

        let interval = DateInterval::new(utc(BASE), utc(BASE + 20));
        let selected = select_files(&[late.clone(), early.clone(), outside, middle.clone()], &interval);

        assert_eq!(selected, vec![early, middle, late]);
    }

    #[test]
    fn test_select_is_stable_for_equal_timestamps() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let second = file_at(dir, "z.log", BASE);
        let first = file_at(dir, "a.log", BASE);

        let interval = DateInterval::new(utc(BASE), utc(BASE));
        let selected = select_files(&[second.clone(), first.clone()], &interval);
        assert_eq!(selected, vec![second, first]);
    }

    #[test]
    fn test_select_drops_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let ghost = temp_dir.path().join("ghost.log");
        let interval = DateInterval::new(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC);
        assert!(select_files(&[ghost], &interval).is_empty());
    }
}
