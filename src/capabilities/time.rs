//! Wall-clock access for the time resource, the time tool, `ping` and `/api/time`.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSnapshot {
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub iso_time: String,
    /// IANA zone name, e.g. `Europe/Berlin`.
    pub timezone: String,
}

impl TimeSnapshot {
    pub fn at(instant: DateTime<Utc>, timezone: impl Into<String>) -> Self {
        Self {
            timestamp: instant.timestamp_millis(),
            iso_time: format_iso(instant),
            timezone: timezone.into(),
        }
    }

    pub fn unix_seconds(&self) -> i64 {
        self.timestamp.div_euclid(1_000)
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn formatted_utc(&self) -> Option<String> {
        DateTime::from_timestamp_millis(self.timestamp)
            .map(|instant| instant.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

pub trait TimeProvider: Send + Sync {
    fn now(&self) -> TimeSnapshot;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(host_timezone())
    }
}

impl TimeProvider for SystemClock {
    fn now(&self) -> TimeSnapshot {
        TimeSnapshot::at(Utc::now(), self.timezone.name())
    }
}

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix.
pub fn format_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// The host's configured zone, or UTC when it cannot be determined.
pub fn host_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| parse_timezone(&name))
        .unwrap_or(Tz::UTC)
}
