//! Pure calendrical helpers shared by services and models.
//!
//! # Responsibility
//! - Provide direct calendrical calculations (leap years, month lengths,
//!   clock conversion) without touching storage.
//! - Convert between epoch milliseconds, epoch days and week boundaries.
//! - Own the static timezone lookup table used by account settings.
//!
//! # Invariants
//! - All functions are deterministic and side-effect free.
//! - Epoch days count whole UTC days since 1970-01-01.

use chrono::{DateTime, Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const MS_PER_DAY: i64 = 86_400_000;

/// Timezone identifiers accepted by account settings.
///
/// A static table rather than a full tz database: the core only validates
/// the stored preference, rendering stays in the UI layer.
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Anchorage",
    "Pacific/Honolulu",
    "America/Toronto",
    "America/Vancouver",
    "America/Mexico_City",
    "America/Sao_Paulo",
    "Europe/London",
    "Europe/Dublin",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Madrid",
    "Europe/Rome",
    "Europe/Amsterdam",
    "Europe/Stockholm",
    "Europe/Warsaw",
    "Europe/Kyiv",
    "Africa/Cairo",
    "Africa/Johannesburg",
    "Africa/Lagos",
    "Asia/Dubai",
    "Asia/Karachi",
    "Asia/Kolkata",
    "Asia/Dhaka",
    "Asia/Bangkok",
    "Asia/Singapore",
    "Asia/Hong_Kong",
    "Asia/Shanghai",
    "Asia/Tokyo",
    "Asia/Seoul",
    "Australia/Perth",
    "Australia/Sydney",
    "Pacific/Auckland",
];

/// Returns whether `timezone` names an entry of [`SUPPORTED_TIMEZONES`].
pub fn is_supported_timezone(timezone: &str) -> bool {
    let trimmed = timezone.trim();
    SUPPORTED_TIMEZONES.iter().any(|known| *known == trimmed)
}

/// First day of the week used for retro week boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStartDay {
    #[default]
    Monday,
    Saturday,
    Sunday,
}

impl WeekStartDay {
    /// Stable storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Parses the storage spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monday" => Some(Self::Monday),
            "saturday" => Some(Self::Saturday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }

    fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Saturday => Weekday::Sat,
            Self::Sunday => Weekday::Sun,
        }
    }
}

/// Half-day marker for 12-hour clock rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meridiem {
    Am,
    Pm,
}

/// Returns whether `year` is a Gregorian leap year.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the day count of `month` (1-12) in `year`.
///
/// Returns `None` for months outside 1-12.
pub fn days_in_month(year: i32, month: u32) -> Option<u8> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => Some(if is_leap_year(year) { 29 } else { 28 }),
        _ => None,
    }
}

/// Converts a 24-hour clock hour (0-23) to its 12-hour rendering.
///
/// Returns `None` when `hour` is out of range.
pub fn to_12_hour(hour: u8) -> Option<(u8, Meridiem)> {
    if hour > 23 {
        return None;
    }
    let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
    let display = match hour % 12 {
        0 => 12,
        other => other,
    };
    Some((display, meridiem))
}

/// Converts a 12-hour clock hour (1-12) plus meridiem back to 0-23.
///
/// Returns `None` when `hour` is out of range.
pub fn to_24_hour(hour: u8, meridiem: Meridiem) -> Option<u8> {
    if hour == 0 || hour > 12 {
        return None;
    }
    let base = hour % 12;
    Some(match meridiem {
        Meridiem::Am => base,
        Meridiem::Pm => base + 12,
    })
}

/// Returns the whole UTC days elapsed since the epoch for `epoch_ms`.
///
/// Floors toward negative infinity so pre-epoch instants land on the
/// correct calendar day.
pub fn epoch_day_from_ms(epoch_ms: i64) -> i64 {
    epoch_ms.div_euclid(MS_PER_DAY)
}

/// Returns the first millisecond of `epoch_day`.
///
/// Returns `None` on arithmetic overflow.
pub fn epoch_day_to_ms(epoch_day: i64) -> Option<i64> {
    epoch_day.checked_mul(MS_PER_DAY)
}

/// Returns the epoch day starting the week that contains `epoch_ms`.
///
/// The week boundary is defined by `week_starts_on`. Returns `None` when
/// `epoch_ms` is outside the representable date range.
pub fn week_start_of(epoch_ms: i64, week_starts_on: WeekStartDay) -> Option<i64> {
    let date = DateTime::from_timestamp_millis(epoch_ms)?.date_naive();
    let offset = (date.weekday().num_days_from_monday() + 7
        - week_starts_on.weekday().num_days_from_monday())
        % 7;
    let start = date.checked_sub_days(Days::new(u64::from(offset)))?;
    // NaiveDate::default() is 1970-01-01.
    Some(start.signed_duration_since(NaiveDate::default()).num_days())
}
