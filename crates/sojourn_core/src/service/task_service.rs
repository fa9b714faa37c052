//! Task use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for task callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository ownership checks.
//! - Service layer remains storage-agnostic.

use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::user::UserId;
use crate::repo::task_repo::{NewTask, TaskListQuery, TaskRepository, TaskUpdate};
use crate::repo::RepoResult;

/// Use-case service wrapper for task CRUD operations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task with default status `todo`.
    pub fn create_task(&self, user_uuid: UserId, draft: &NewTask) -> RepoResult<Task> {
        self.repo.create_task(user_uuid, draft)
    }

    /// Gets one task by stable id.
    pub fn get_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<Task> {
        self.repo.get_task(user_uuid, task_uuid)
    }

    /// Lists tasks using filter and pagination options.
    pub fn list_tasks(&self, user_uuid: UserId, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(user_uuid, query)
    }

    /// Replaces title, description mirrors and due date.
    pub fn update_task(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        changes: &TaskUpdate,
    ) -> RepoResult<Task> {
        self.repo.update_task(user_uuid, task_uuid, changes)
    }

    /// Transitions task status.
    ///
    /// Terminal states stamp `completed_at`; returning to an open state
    /// clears it.
    pub fn set_task_status(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        status: TaskStatus,
    ) -> RepoResult<Task> {
        self.repo.set_task_status(user_uuid, task_uuid, status)
    }

    /// Hard-deletes one task.
    pub fn delete_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<()> {
        self.repo.delete_task(user_uuid, task_uuid)
    }
}
