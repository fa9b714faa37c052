//! Product-adoption milestone repository.
//!
//! # Responsibility
//! - Record one-time firsts idempotently and list achieved milestones.
//!
//! # Invariants
//! - `(user_uuid, kind)` is unique; repeated recording is a no-op.

use crate::model::adoption::{AdoptionKind, AdoptionMilestone};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for adoption milestones.
pub trait AdoptionRepository {
    /// Records one first-time event. Returns `true` when this call was
    /// the first occurrence.
    fn record(&self, user_uuid: UserId, kind: AdoptionKind) -> RepoResult<bool>;
    /// Lists achieved milestones, oldest first.
    fn list(&self, user_uuid: UserId) -> RepoResult<Vec<AdoptionMilestone>>;
}

/// SQLite-backed adoption milestone repository.
pub struct SqliteAdoptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAdoptionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[("milestones", &["uuid", "user_uuid", "kind", "achieved_at"])],
        )?;
        Ok(Self { conn })
    }
}

impl AdoptionRepository for SqliteAdoptionRepository<'_> {
    fn record(&self, user_uuid: UserId, kind: AdoptionKind) -> RepoResult<bool> {
        record_adoption(self.conn, user_uuid, kind)
    }

    fn list(&self, user_uuid: UserId) -> RepoResult<Vec<AdoptionMilestone>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, user_uuid, kind, achieved_at
             FROM milestones
             WHERE user_uuid = ?1
             ORDER BY achieved_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_adoption_row(row)?);
        }
        Ok(items)
    }
}

/// Inserts one adoption row unless the kind was already achieved.
///
/// Shared with other repositories so firsts can be recorded inside their
/// write transactions.
pub(crate) fn record_adoption(
    conn: &Connection,
    user_uuid: UserId,
    kind: AdoptionKind,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO milestones (uuid, user_uuid, kind)
         VALUES (?1, ?2, ?3);",
        params![
            Uuid::new_v4().to_string(),
            user_uuid.to_string(),
            kind.as_str(),
        ],
    )?;
    Ok(changed > 0)
}

fn parse_adoption_row(row: &Row<'_>) -> RepoResult<AdoptionMilestone> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let kind_text: String = row.get("kind")?;
    let kind = AdoptionKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid adoption kind `{kind_text}` in milestones.kind"
        ))
    })?;

    Ok(AdoptionMilestone {
        uuid: parse_uuid(&uuid_text, "milestones.uuid")?,
        user_uuid: parse_uuid(&user_text, "milestones.user_uuid")?,
        kind,
        achieved_at: row.get("achieved_at")?,
    })
}
