//! Goal and goal-milestone domain models.
//!
//! # Responsibility
//! - Define the goal record and its ordered milestone sub-steps.
//! - Keep status vocabularies stable for storage and serialization.
//!
//! # Invariants
//! - Milestone `sort_order` values are contiguous `0..n` within a goal.
//! - `completed_at` is set exactly when the status says completed/done.

use crate::model::content::RichText;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a goal.
pub type GoalId = Uuid;

/// Stable identifier for a goal milestone.
pub type MilestoneId = Uuid;

/// Goal lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Milestone lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// One user-defined objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub uuid: GoalId,
    pub user_uuid: UserId,
    pub title: String,
    pub description: RichText,
    pub status: GoalStatus,
    /// Optional target expressed as an epoch day.
    pub target_date: Option<i64>,
    /// Epoch ms, set when `status == Completed`.
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One ordered sub-step of a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalMilestone {
    pub uuid: MilestoneId,
    pub user_uuid: UserId,
    pub goal_uuid: GoalId,
    pub title: String,
    pub description: RichText,
    pub status: MilestoneStatus,
    /// Position within the goal, contiguous from zero.
    pub sort_order: i64,
    /// Epoch ms, set when `status == Done`.
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}
