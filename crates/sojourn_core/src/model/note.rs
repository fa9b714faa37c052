//! Note model with soft-delete tombstones.
//!
//! # Invariants
//! - `is_deleted` is the source of truth for tombstone state; default
//!   reads exclude tombstoned notes.
//! - `preview_text` is derived from the body mirrors, never user-set.

use crate::model::content::RichText;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// One free-form note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub uuid: NoteId,
    pub user_uuid: UserId,
    pub title: String,
    pub body: RichText,
    /// Derived plain-text summary, capped length.
    pub preview_text: Option<String>,
    /// Soft delete tombstone.
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
