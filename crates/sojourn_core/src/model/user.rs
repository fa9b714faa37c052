//! User identity and account-settings models.
//!
//! # Responsibility
//! - Map external authentication subjects to stable user ids.
//! - Carry per-user preferences consumed by retro week math and clock
//!   rendering.
//!
//! # Invariants
//! - `subject` is unique per user and never reassigned.
//! - `timezone` must name an entry of `timeutil::SUPPORTED_TIMEZONES`.

use crate::timeutil::WeekStartDay;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user row.
///
/// Kept as a type alias to make ownership parameters explicit in repo and
/// service signatures.
pub type UserId = Uuid;

/// One authenticated user known to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable internal id referenced by every owned record.
    pub uuid: UserId,
    /// External identity-provider subject. Unique, never reused.
    pub subject: String,
    pub email: String,
    pub display_name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Clock rendering preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockFormat {
    TwelveHour,
    #[default]
    TwentyFourHour,
}

impl ClockFormat {
    /// Stable storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwelveHour => "12h",
            Self::TwentyFourHour => "24h",
        }
    }

    /// Parses the storage spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "12h" => Some(Self::TwelveHour),
            "24h" => Some(Self::TwentyFourHour),
            _ => None,
        }
    }
}

/// Per-user preferences, one row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub user_uuid: UserId,
    /// IANA-style zone name validated against the static table.
    pub timezone: String,
    pub clock: ClockFormat,
    pub week_starts_on: WeekStartDay,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AccountSettings {
    /// Settings presented before a user has stored any: UTC, 24-hour
    /// clock, Monday weeks.
    pub fn defaults_for(user_uuid: UserId) -> Self {
        Self {
            user_uuid,
            timezone: "UTC".to_string(),
            clock: ClockFormat::default(),
            week_starts_on: WeekStartDay::default(),
            created_at: 0,
            updated_at: 0,
        }
    }
}
