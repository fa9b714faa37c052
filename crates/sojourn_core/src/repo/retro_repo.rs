//! Weekly retro repository.
//!
//! # Responsibility
//! - Persist one retro per user and week with upsert semantics.
//!
//! # Invariants
//! - `(user_uuid, week_start)` is unique; repeated saves update in place.
//! - Listing order is newest week first.

use crate::model::adoption::AdoptionKind;
use crate::model::retro::{Retro, RetroRatings};
use crate::model::user::UserId;
use crate::repo::adoption_repo::record_adoption;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const RETROS_DEFAULT_LIMIT: u32 = 12;
const RETROS_LIMIT_MAX: u32 = 52;

const RETRO_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    week_start,
    energy,
    focus,
    satisfaction,
    progress,
    went_well,
    went_poorly,
    next_week,
    created_at,
    updated_at
FROM retros";

/// Write model for retro saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetroDraft {
    pub ratings: RetroRatings,
    pub went_well: String,
    pub went_poorly: String,
    pub next_week: String,
}

/// Repository interface for retro operations.
pub trait RetroRepository {
    /// Creates or replaces the retro for `week_start`.
    fn upsert_retro(
        &self,
        user_uuid: UserId,
        week_start: i64,
        draft: &RetroDraft,
    ) -> RepoResult<Retro>;
    /// Loads the retro for one week, if recorded.
    fn get_retro(&self, user_uuid: UserId, week_start: i64) -> RepoResult<Option<Retro>>;
    /// Lists retros, newest week first.
    fn list_retros(&self, user_uuid: UserId, limit: Option<u32>) -> RepoResult<Vec<Retro>>;
}

/// SQLite-backed retro repository.
pub struct SqliteRetroRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRetroRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "retros",
                    &[
                        "uuid",
                        "user_uuid",
                        "week_start",
                        "energy",
                        "focus",
                        "satisfaction",
                        "progress",
                        "went_well",
                        "went_poorly",
                        "next_week",
                    ],
                ),
                ("milestones", &["uuid", "user_uuid", "kind"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl RetroRepository for SqliteRetroRepository<'_> {
    fn upsert_retro(
        &self,
        user_uuid: UserId,
        week_start: i64,
        draft: &RetroDraft,
    ) -> RepoResult<Retro> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT uuid FROM retros WHERE user_uuid = ?1 AND week_start = ?2;",
                params![user_uuid.to_string(), week_start],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(uuid_text) => {
                tx.execute(
                    "UPDATE retros
                     SET energy = ?2,
                         focus = ?3,
                         satisfaction = ?4,
                         progress = ?5,
                         went_well = ?6,
                         went_poorly = ?7,
                         next_week = ?8,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![
                        uuid_text,
                        i64::from(draft.ratings.energy),
                        i64::from(draft.ratings.focus),
                        i64::from(draft.ratings.satisfaction),
                        i64::from(draft.ratings.progress),
                        draft.went_well.as_str(),
                        draft.went_poorly.as_str(),
                        draft.next_week.as_str(),
                    ],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO retros (
                        uuid,
                        user_uuid,
                        week_start,
                        energy,
                        focus,
                        satisfaction,
                        progress,
                        went_well,
                        went_poorly,
                        next_week
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                    params![
                        Uuid::new_v4().to_string(),
                        user_uuid.to_string(),
                        week_start,
                        i64::from(draft.ratings.energy),
                        i64::from(draft.ratings.focus),
                        i64::from(draft.ratings.satisfaction),
                        i64::from(draft.ratings.progress),
                        draft.went_well.as_str(),
                        draft.went_poorly.as_str(),
                        draft.next_week.as_str(),
                    ],
                )?;
                record_adoption(&tx, user_uuid, AdoptionKind::FirstRetro)?;
            }
        }

        let saved = load_required_retro(&tx, user_uuid, week_start)?;
        tx.commit()?;
        Ok(saved)
    }

    fn get_retro(&self, user_uuid: UserId, week_start: i64) -> RepoResult<Option<Retro>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RETRO_SELECT_SQL}
             WHERE user_uuid = ?1
               AND week_start = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_uuid.to_string(), week_start])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_retro_row(row)?));
        }
        Ok(None)
    }

    fn list_retros(&self, user_uuid: UserId, limit: Option<u32>) -> RepoResult<Vec<Retro>> {
        let applied_limit = normalize_retro_limit(limit);
        let mut stmt = self.conn.prepare(&format!(
            "{RETRO_SELECT_SQL}
             WHERE user_uuid = ?1
             ORDER BY week_start DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_uuid.to_string(), i64::from(applied_limit)])?;
        let mut retros = Vec::new();
        while let Some(row) = rows.next()? {
            retros.push(parse_retro_row(row)?);
        }
        Ok(retros)
    }
}

/// Normalizes list limit according to the retro contract.
pub fn normalize_retro_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => RETROS_DEFAULT_LIMIT,
        Some(value) if value > RETROS_LIMIT_MAX => RETROS_LIMIT_MAX,
        Some(value) => value,
        None => RETROS_DEFAULT_LIMIT,
    }
}

fn load_required_retro(conn: &Connection, user_uuid: UserId, week_start: i64) -> RepoResult<Retro> {
    let mut stmt = conn.prepare(&format!(
        "{RETRO_SELECT_SQL}
         WHERE user_uuid = ?1
           AND week_start = ?2;"
    ))?;
    let mut rows = stmt.query(params![user_uuid.to_string(), week_start])?;
    if let Some(row) = rows.next()? {
        return parse_retro_row(row);
    }
    Err(RepoError::NotFound(user_uuid))
}

fn parse_retro_row(row: &Row<'_>) -> RepoResult<Retro> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;

    Ok(Retro {
        uuid: parse_uuid(&uuid_text, "retros.uuid")?,
        user_uuid: parse_uuid(&user_text, "retros.user_uuid")?,
        week_start: row.get("week_start")?,
        ratings: RetroRatings {
            energy: parse_rating(row.get("energy")?, "retros.energy")?,
            focus: parse_rating(row.get("focus")?, "retros.focus")?,
            satisfaction: parse_rating(row.get("satisfaction")?, "retros.satisfaction")?,
            progress: parse_rating(row.get("progress")?, "retros.progress")?,
        },
        went_well: row.get("went_well")?,
        went_poorly: row.get("went_poorly")?,
        next_week: row.get("next_week")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_rating(value: i64, column: &'static str) -> RepoResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|rating| (1..=10).contains(rating))
        .ok_or_else(|| RepoError::InvalidData(format!("invalid rating `{value}` in {column}")))
}
