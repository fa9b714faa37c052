//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/get/list/delete APIs.
//! - Derive `preview_text` from the body mirrors on every write.
//!
//! # Invariants
//! - `update_note` uses full content replacement semantics.
//! - Preview derives from the HTML mirror, falling back to the plain
//!   mirror when the HTML mirror is blank.

use crate::model::content::RichText;
use crate::model::note::{Note, NoteId};
use crate::model::user::UserId;
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::repo::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PREVIEW_MAX_CHARS: usize = 160;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::EmptyTitle => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note, deriving its preview text.
    pub fn create_note(
        &self,
        user_uuid: UserId,
        title: impl Into<String>,
        body: RichText,
    ) -> Result<Note, NoteServiceError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(NoteServiceError::EmptyTitle);
        }

        let preview = derive_preview(&body);
        let note = self
            .repo
            .create_note(user_uuid, title.as_str(), &body, preview.as_deref())?;
        Ok(note)
    }

    /// Replaces note content fully and recomputes the preview.
    pub fn update_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        title: impl Into<String>,
        body: RichText,
    ) -> Result<Note, NoteServiceError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(NoteServiceError::EmptyTitle);
        }

        let preview = derive_preview(&body);
        let note = self.repo.update_note_full(
            user_uuid,
            note_uuid,
            title.as_str(),
            &body,
            preview.as_deref(),
        )?;
        Ok(note)
    }

    /// Gets one note by stable id.
    pub fn get_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<Note> {
        self.repo.get_note(user_uuid, note_uuid, false)
    }

    /// Lists notes with pagination.
    pub fn list_notes(&self, user_uuid: UserId, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        self.repo.list_notes(user_uuid, query)
    }

    /// Tombstones one note.
    pub fn delete_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<()> {
        self.repo.soft_delete_note(user_uuid, note_uuid)
    }

    /// Clears a note's tombstone.
    pub fn restore_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<Note> {
        self.repo.restore_note(user_uuid, note_uuid)
    }
}

/// Derives preview text from a rich-text body.
///
/// Rules:
/// - Source is the HTML mirror; when blank the plain mirror is used.
/// - HTML tags are stripped and common entities decoded.
/// - Whitespace is normalized and the first 160 chars retained.
pub fn derive_preview(body: &RichText) -> Option<String> {
    let source = if body.html.trim().is_empty() {
        body.plain.clone()
    } else {
        let stripped = HTML_TAG_RE.replace_all(&body.html, " ");
        decode_entities(&stripped)
    };

    let normalized = WHITESPACE_RE.replace_all(&source, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
