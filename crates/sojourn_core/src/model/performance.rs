//! Performance-review question and response models.
//!
//! # Responsibility
//! - Define the user-customizable prompt list and its recorded answers.
//!
//! # Invariants
//! - Active question `sort_order` values are contiguous `0..n` per user.
//! - A question with responses is deactivated instead of removed, so old
//!   answers keep their prompt text.

use crate::model::content::RichText;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a performance question.
pub type QuestionId = Uuid;

/// Stable identifier for a performance response.
pub type ResponseId = Uuid;

/// One self-review prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceQuestion {
    pub uuid: QuestionId,
    pub user_uuid: UserId,
    pub prompt: String,
    /// Position within the active list, contiguous from zero.
    pub sort_order: i64,
    /// Cleared instead of deleting once responses exist.
    pub is_active: bool,
    /// Seeded from the default prompt set rather than user-created.
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One recorded answer for a question and review period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceResponse {
    pub uuid: ResponseId,
    pub user_uuid: UserId,
    pub question_uuid: QuestionId,
    /// Review period in `YYYY-MM` form.
    pub period: String,
    pub answer: RichText,
    pub created_at: i64,
    pub updated_at: i64,
}

/// What `delete_question` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionDeleteOutcome {
    /// Question had responses and was deactivated.
    Deactivated,
    /// Question had no responses and its row was removed.
    Removed,
}
