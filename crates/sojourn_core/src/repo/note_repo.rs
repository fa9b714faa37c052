//! Note repository.
//!
//! # Responsibility
//! - Provide note persistence with soft-delete tombstones.
//! - Keep derived preview text alongside the body mirrors.
//!
//! # Invariants
//! - Default reads exclude tombstoned notes (`is_deleted = 0`).
//! - Note list is always sorted by `updated_at DESC, uuid ASC`.

use crate::model::adoption::AdoptionKind;
use crate::model::content::RichText;
use crate::model::note::{Note, NoteId};
use crate::model::user::UserId;
use crate::repo::adoption_repo::record_adoption;
use crate::repo::{
    check_owner, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const NOTES_DEFAULT_LIMIT: u32 = 10;
const NOTES_LIMIT_MAX: u32 = 50;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    body_plain,
    body_html,
    body_json,
    preview_text,
    is_deleted,
    created_at,
    updated_at
FROM notes";

/// Query options for note listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Whether tombstoned notes are included.
    pub include_deleted: bool,
    /// Maximum rows to return. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Creates one note with pre-derived preview text.
    fn create_note(
        &self,
        user_uuid: UserId,
        title: &str,
        body: &RichText,
        preview_text: Option<&str>,
    ) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        include_deleted: bool,
    ) -> RepoResult<Note>;
    /// Lists notes with pagination.
    fn list_notes(&self, user_uuid: UserId, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Replaces title, body mirrors and preview text.
    fn update_note_full(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        title: &str,
        body: &RichText,
        preview_text: Option<&str>,
    ) -> RepoResult<Note>;
    /// Marks one note as tombstoned. Idempotent.
    fn soft_delete_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<()>;
    /// Clears the tombstone flag. Idempotent.
    fn restore_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<Note>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "notes",
                    &[
                        "uuid",
                        "user_uuid",
                        "title",
                        "body_plain",
                        "body_html",
                        "body_json",
                        "preview_text",
                        "is_deleted",
                        "created_at",
                        "updated_at",
                    ],
                ),
                ("milestones", &["uuid", "user_uuid", "kind"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(
        &self,
        user_uuid: UserId,
        title: &str,
        body: &RichText,
        preview_text: Option<&str>,
    ) -> RepoResult<Note> {
        let note_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO notes (
                uuid,
                user_uuid,
                title,
                body_plain,
                body_html,
                body_json,
                preview_text,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0);",
            params![
                note_uuid.to_string(),
                user_uuid.to_string(),
                title,
                body.plain.as_str(),
                body.html.as_str(),
                body.json.as_str(),
                preview_text,
            ],
        )?;
        record_adoption(&tx, user_uuid, AdoptionKind::FirstNote)?;

        let created = load_required_note(&tx, note_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        include_deleted: bool,
    ) -> RepoResult<Note> {
        check_owner(self.conn, "notes", note_uuid, user_uuid)?;
        let note = load_required_note(self.conn, note_uuid)?;
        if note.is_deleted && !include_deleted {
            return Err(RepoError::NotFound(note_uuid));
        }
        Ok(note)
    }

    fn list_notes(&self, user_uuid: UserId, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE user_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_uuid.to_string())];

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        let limit = normalize_note_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn update_note_full(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        title: &str,
        body: &RichText,
        preview_text: Option<&str>,
    ) -> RepoResult<Note> {
        check_owner(self.conn, "notes", note_uuid, user_uuid)?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET title = ?2,
                 body_plain = ?3,
                 body_html = ?4,
                 body_json = ?5,
                 preview_text = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                note_uuid.to_string(),
                title,
                body.plain.as_str(),
                body.html.as_str(),
                body.json.as_str(),
                preview_text,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note_uuid));
        }

        load_required_note(self.conn, note_uuid)
    }

    fn soft_delete_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<()> {
        check_owner(self.conn, "notes", note_uuid, user_uuid)?;
        self.conn.execute(
            "UPDATE notes
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [note_uuid.to_string()],
        )?;
        Ok(())
    }

    fn restore_note(&self, user_uuid: UserId, note_uuid: NoteId) -> RepoResult<Note> {
        check_owner(self.conn, "notes", note_uuid, user_uuid)?;
        self.conn.execute(
            "UPDATE notes
             SET is_deleted = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 1;",
            [note_uuid.to_string()],
        )?;
        load_required_note(self.conn, note_uuid)
    }
}

/// Normalizes list limit according to the notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
        None => NOTES_DEFAULT_LIMIT,
    }
}

fn load_required_note(conn: &Connection, note_uuid: NoteId) -> RepoResult<Note> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([note_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_note_row(row);
    }
    Err(RepoError::NotFound(note_uuid))
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let is_deleted = parse_bool(row.get("is_deleted")?, "notes.is_deleted")?;

    Ok(Note {
        uuid: parse_uuid(&uuid_text, "notes.uuid")?,
        user_uuid: parse_uuid(&user_text, "notes.user_uuid")?,
        title: row.get("title")?,
        body: RichText {
            plain: row.get("body_plain")?,
            html: row.get("body_html")?,
            json: row.get("body_json")?,
        },
        preview_text: row.get("preview_text")?,
        is_deleted,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
