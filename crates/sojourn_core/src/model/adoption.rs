//! Product-adoption milestone model.
//!
//! Tracks one-time firsts (first sign-in, first goal, ...) used for
//! onboarding progress. Recording is idempotent per user and kind.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// First-time product event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionKind {
    FirstSignIn,
    FirstGoal,
    FirstTask,
    FirstNote,
    FirstRetro,
}

impl AdoptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstSignIn => "first_sign_in",
            Self::FirstGoal => "first_goal",
            Self::FirstTask => "first_task",
            Self::FirstNote => "first_note",
            Self::FirstRetro => "first_retro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first_sign_in" => Some(Self::FirstSignIn),
            "first_goal" => Some(Self::FirstGoal),
            "first_task" => Some(Self::FirstTask),
            "first_note" => Some(Self::FirstNote),
            "first_retro" => Some(Self::FirstRetro),
            _ => None,
        }
    }
}

/// One achieved adoption milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionMilestone {
    pub uuid: Uuid,
    pub user_uuid: UserId,
    pub kind: AdoptionKind,
    /// Epoch ms of the first occurrence.
    pub achieved_at: i64,
}
