//! Goal use-case service.
//!
//! # Responsibility
//! - Provide goal and milestone entry points for UI callers.
//! - Validate titles before persistence.
//! - Log cascade deletes with their removed-milestone counts.
//!
//! # Invariants
//! - Service APIs never bypass repository ownership checks.
//! - Completing/reopening goes through `set_goal_status` so timeline
//!   events stay consistent with status transitions.

use crate::model::goal::{Goal, GoalId, GoalMilestone, GoalStatus, MilestoneId, MilestoneStatus};
use crate::model::user::UserId;
use crate::repo::goal_repo::{
    GoalListQuery, GoalRepository, GoalUpdate, MilestoneUpdate, NewGoal, NewMilestone,
};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for goal use-cases.
#[derive(Debug)]
pub enum GoalServiceError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for GoalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GoalServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::EmptyTitle => None,
        }
    }
}

impl From<RepoError> for GoalServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Goal service facade over repository implementations.
pub struct GoalService<R: GoalRepository> {
    repo: R,
}

impl<R: GoalRepository> GoalService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one goal and its `goal_created` timeline event.
    pub fn create_goal(
        &self,
        user_uuid: UserId,
        draft: NewGoal,
    ) -> Result<Goal, GoalServiceError> {
        require_title(&draft.title)?;
        Ok(self.repo.create_goal(user_uuid, &draft)?)
    }

    /// Gets one goal by stable id.
    pub fn get_goal(&self, user_uuid: UserId, goal_uuid: GoalId) -> Result<Goal, GoalServiceError> {
        Ok(self.repo.get_goal(user_uuid, goal_uuid)?)
    }

    /// Lists goals using optional status filter and pagination.
    pub fn list_goals(
        &self,
        user_uuid: UserId,
        query: &GoalListQuery,
    ) -> Result<Vec<Goal>, GoalServiceError> {
        Ok(self.repo.list_goals(user_uuid, query)?)
    }

    /// Replaces title, description mirrors and target date.
    pub fn update_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        changes: GoalUpdate,
    ) -> Result<Goal, GoalServiceError> {
        require_title(&changes.title)?;
        Ok(self.repo.update_goal(user_uuid, goal_uuid, &changes)?)
    }

    /// Marks one goal completed, stamping `completed_at`.
    pub fn complete_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> Result<Goal, GoalServiceError> {
        Ok(self
            .repo
            .set_goal_status(user_uuid, goal_uuid, GoalStatus::Completed)?)
    }

    /// Returns one completed goal to active, clearing `completed_at`.
    pub fn reopen_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> Result<Goal, GoalServiceError> {
        Ok(self
            .repo
            .set_goal_status(user_uuid, goal_uuid, GoalStatus::Active)?)
    }

    /// Deletes one goal and its milestones in a single transaction.
    pub fn delete_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> Result<u64, GoalServiceError> {
        let removed = self.repo.delete_goal(user_uuid, goal_uuid)?;
        info!(
            "event=goal_delete module=goal status=ok goal={goal_uuid} milestones_removed={removed}"
        );
        Ok(removed)
    }

    /// Appends one milestone at the end of the goal's ordering.
    pub fn add_milestone(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        draft: NewMilestone,
    ) -> Result<GoalMilestone, GoalServiceError> {
        require_title(&draft.title)?;
        Ok(self.repo.add_milestone(user_uuid, goal_uuid, &draft)?)
    }

    /// Gets one milestone by stable id.
    pub fn get_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
    ) -> Result<GoalMilestone, GoalServiceError> {
        Ok(self.repo.get_milestone(user_uuid, milestone_uuid)?)
    }

    /// Lists one goal's milestones in `sort_order` position.
    pub fn list_milestones(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> Result<Vec<GoalMilestone>, GoalServiceError> {
        Ok(self.repo.list_milestones(user_uuid, goal_uuid)?)
    }

    /// Replaces milestone title and description mirrors.
    pub fn update_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        changes: MilestoneUpdate,
    ) -> Result<GoalMilestone, GoalServiceError> {
        require_title(&changes.title)?;
        Ok(self
            .repo
            .update_milestone(user_uuid, milestone_uuid, &changes)?)
    }

    /// Transitions milestone status, stamping `completed_at` on `done`.
    pub fn set_milestone_status(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        status: MilestoneStatus,
    ) -> Result<GoalMilestone, GoalServiceError> {
        Ok(self
            .repo
            .set_milestone_status(user_uuid, milestone_uuid, status)?)
    }

    /// Moves one milestone to `target_index` within its goal.
    ///
    /// Out-of-range targets clamp to the list bounds; `None` moves to the
    /// end. Returns the goal's milestones in their new order.
    pub fn reorder_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        target_index: Option<i64>,
    ) -> Result<Vec<GoalMilestone>, GoalServiceError> {
        Ok(self
            .repo
            .reorder_milestone(user_uuid, milestone_uuid, target_index)?)
    }

    /// Removes one milestone and closes the ordering gap.
    pub fn remove_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
    ) -> Result<(), GoalServiceError> {
        Ok(self.repo.remove_milestone(user_uuid, milestone_uuid)?)
    }
}

fn require_title(title: &str) -> Result<(), GoalServiceError> {
    if title.trim().is_empty() {
        return Err(GoalServiceError::EmptyTitle);
    }
    Ok(())
}
