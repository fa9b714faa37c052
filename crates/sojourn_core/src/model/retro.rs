//! Weekly retrospective model.
//!
//! # Invariants
//! - At most one retro per `(user, week_start)`; writes upsert.
//! - `week_start` is an epoch day on the user's configured week boundary.
//! - Ratings are integers in `1..=10`.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a retro.
pub type RetroId = Uuid;

/// Slider ratings captured by a retro, each `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroRatings {
    pub energy: u8,
    pub focus: u8,
    pub satisfaction: u8,
    pub progress: u8,
}

impl RetroRatings {
    /// Returns the first out-of-range rating as `(name, value)`.
    pub fn first_out_of_range(&self) -> Option<(&'static str, u8)> {
        [
            ("energy", self.energy),
            ("focus", self.focus),
            ("satisfaction", self.satisfaction),
            ("progress", self.progress),
        ]
        .into_iter()
        .find(|(_, value)| !(1..=10).contains(value))
    }
}

/// One weekly self-reflection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retro {
    pub uuid: RetroId,
    pub user_uuid: UserId,
    /// Epoch day of the configured week start.
    pub week_start: i64,
    pub ratings: RetroRatings,
    pub went_well: String,
    pub went_poorly: String,
    pub next_week: String,
    pub created_at: i64,
    pub updated_at: i64,
}
