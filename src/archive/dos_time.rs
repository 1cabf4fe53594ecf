//! MS-DOS packed date and time
//!
//! Date: bits 15-9 year since 1980, 8-5 month, 4-0 day.
//! Time: bits 15-11 hour, 10-5 minute, 4-0 seconds / 2.
//! Fields hold local wall-clock time, as ZIP readers expect.

use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

/// Packed `(date, time)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant
    pub const EPOCH: DosDateTime = DosDateTime {
        date: (1 << 5) | 1,
        time: 0,
    };

    /// Encode the wall-clock fields of `at`, clamping the year into 1980..=2107
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let year = at.year().clamp(1980, 2107) as u32;
        let month = at.month().clamp(1, 12);
        let day = at.day().clamp(1, 31);
        let hour = at.hour().min(23);
        let minute = at.minute().min(59);
        let second = at.second().min(59);

        DosDateTime {
            date: (((year - 1980) << 9) | (month << 5) | day) as u16,
            time: ((hour << 11) | (minute << 5) | (second / 2)) as u16,
        }
    }

    /// Encode `at` in the host's local time zone
    pub fn from_system_time(at: SystemTime) -> Self {
        Self::from_datetime(&DateTime::<Local>::from(at))
    }
}
