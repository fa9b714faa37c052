//! Append-only activity timeline models.
//!
//! # Invariants
//! - Events are never updated or deleted; `goal_uuid`/`milestone_uuid`
//!   are plain values so the feed survives goal deletion.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a timeline event.
pub type TimelineEventId = Uuid;

/// Change kind recorded by the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    GoalCreated,
    GoalUpdated,
    GoalCompleted,
    GoalReopened,
    GoalDeleted,
    MilestoneAdded,
    MilestoneUpdated,
    MilestoneCompleted,
    MilestoneRemoved,
}

impl TimelineEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoalCreated => "goal_created",
            Self::GoalUpdated => "goal_updated",
            Self::GoalCompleted => "goal_completed",
            Self::GoalReopened => "goal_reopened",
            Self::GoalDeleted => "goal_deleted",
            Self::MilestoneAdded => "milestone_added",
            Self::MilestoneUpdated => "milestone_updated",
            Self::MilestoneCompleted => "milestone_completed",
            Self::MilestoneRemoved => "milestone_removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "goal_created" => Some(Self::GoalCreated),
            "goal_updated" => Some(Self::GoalUpdated),
            "goal_completed" => Some(Self::GoalCompleted),
            "goal_reopened" => Some(Self::GoalReopened),
            "goal_deleted" => Some(Self::GoalDeleted),
            "milestone_added" => Some(Self::MilestoneAdded),
            "milestone_updated" => Some(Self::MilestoneUpdated),
            "milestone_completed" => Some(Self::MilestoneCompleted),
            "milestone_removed" => Some(Self::MilestoneRemoved),
            _ => None,
        }
    }
}

/// One append-only log entry describing a goal or milestone change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub uuid: TimelineEventId,
    pub user_uuid: UserId,
    /// Goal the change belongs to. Plain value, the goal may be gone.
    pub goal_uuid: Uuid,
    /// Set for milestone-scoped events.
    pub milestone_uuid: Option<Uuid>,
    pub kind: TimelineEventKind,
    /// Short human-readable summary, e.g. the title at change time.
    pub detail: String,
    pub created_at: i64,
}
