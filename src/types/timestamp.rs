//! Field-wise timestamps for log entries
//!
//! Entries store a human-readable clock reading (year through second plus the
//! UTC offset) because the rendered reports print each piece separately. A
//! derived unix epoch is carried alongside so entries can be compared and
//! sorted without reassembling the fields; all ordering goes through it.

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp attached to every log entry and message snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogTimestamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// UTC offset the reading was taken in, e.g. `+00:00`
    pub tz: String,
    /// Derived unix seconds; ordering and equality use this field only
    #[serde(default)]
    pub epoch: i64,
}

impl LogTimestamp {
    /// Capture the current local time
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    /// Build from a chrono datetime, deriving the epoch
    pub fn from_datetime(dt: DateTime<Local>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            tz: dt.offset().to_string(),
            epoch: dt.timestamp(),
        }
    }

    /// Build from explicit fields, interpreted as UTC
    ///
    /// Invalid calendar combinations get an epoch of 0 but keep the fields
    /// as given; rendering still works, ordering degrades.
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        let epoch = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            tz: "+00:00".to_string(),
            epoch,
        }
    }

    /// Month/day/year, as the reports print dates
    pub fn date_string(&self) -> String {
        format!("{}/{}/{}", self.month, self.day, self.year)
    }

    /// Hour:minute:second, as the reports print clock times
    pub fn time_string(&self) -> String {
        format!("{}:{}:{}", self.hour, self.minute, self.second)
    }
}

impl PartialEq for LogTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.epoch == other.epoch
    }
}

impl Eq for LogTimestamp {}

impl PartialOrd for LogTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogTimestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.epoch.cmp(&other.epoch)
    }
}
