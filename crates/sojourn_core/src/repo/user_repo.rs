//! User and account-settings repository.
//!
//! # Responsibility
//! - Map external auth subjects to stable user rows (get-or-create).
//! - Persist per-user preferences as a single upserted row.
//!
//! # Invariants
//! - `users.subject` is unique; `ensure_user` never creates duplicates.
//! - A missing settings row reads back as the documented defaults.

use crate::model::adoption::AdoptionKind;
use crate::model::user::{AccountSettings, ClockFormat, UserId, UserProfile};
use crate::repo::adoption_repo::record_adoption;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::timeutil::WeekStartDay;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    subject,
    email,
    display_name,
    created_at,
    updated_at
FROM users";

/// Repository interface for identity and settings operations.
pub trait UserRepository {
    /// Gets or creates the user row for an authenticated subject.
    /// Returns the profile and whether a row was created.
    fn ensure_user(
        &self,
        subject: &str,
        email: &str,
        display_name: &str,
    ) -> RepoResult<(UserProfile, bool)>;
    /// Loads one user by stable id.
    fn get_user(&self, user_uuid: UserId) -> RepoResult<Option<UserProfile>>;
    /// Loads one user by auth subject.
    fn find_by_subject(&self, subject: &str) -> RepoResult<Option<UserProfile>>;
    /// Replaces email and display name.
    fn update_profile(
        &self,
        user_uuid: UserId,
        email: &str,
        display_name: &str,
    ) -> RepoResult<UserProfile>;
    /// Loads settings, falling back to defaults when no row exists.
    fn get_settings(&self, user_uuid: UserId) -> RepoResult<AccountSettings>;
    /// Upserts the settings row.
    fn update_settings(
        &self,
        user_uuid: UserId,
        timezone: &str,
        clock: ClockFormat,
        week_starts_on: WeekStartDay,
    ) -> RepoResult<AccountSettings>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "users",
                    &[
                        "uuid",
                        "subject",
                        "email",
                        "display_name",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "account_settings",
                    &[
                        "user_uuid",
                        "timezone",
                        "clock",
                        "week_starts_on",
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

impl UserRepository for SqliteUserRepository<'_> {
    fn ensure_user(
        &self,
        subject: &str,
        email: &str,
        display_name: &str,
    ) -> RepoResult<(UserProfile, bool)> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if let Some(existing) = find_by_subject_in(&tx, subject)? {
            tx.commit()?;
            return Ok((existing, false));
        }

        let user_uuid = Uuid::new_v4();
        tx.execute(
            "INSERT INTO users (uuid, subject, email, display_name)
             VALUES (?1, ?2, ?3, ?4);",
            params![user_uuid.to_string(), subject, email, display_name],
        )?;
        record_adoption(&tx, user_uuid, AdoptionKind::FirstSignIn)?;

        let created = load_required_user(&tx, user_uuid)?;
        tx.commit()?;
        Ok((created, true))
    }

    fn get_user(&self, user_uuid: UserId) -> RepoResult<Option<UserProfile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_subject(&self, subject: &str) -> RepoResult<Option<UserProfile>> {
        find_by_subject_in(self.conn, subject)
    }

    fn update_profile(
        &self,
        user_uuid: UserId,
        email: &str,
        display_name: &str,
    ) -> RepoResult<UserProfile> {
        let changed = self.conn.execute(
            "UPDATE users
             SET email = ?2,
                 display_name = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![user_uuid.to_string(), email, display_name],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(user_uuid));
        }
        load_required_user(self.conn, user_uuid)
    }

    fn get_settings(&self, user_uuid: UserId) -> RepoResult<AccountSettings> {
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid, timezone, clock, week_starts_on, created_at, updated_at
             FROM account_settings
             WHERE user_uuid = ?1;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_settings_row(row);
        }
        Ok(AccountSettings::defaults_for(user_uuid))
    }

    fn update_settings(
        &self,
        user_uuid: UserId,
        timezone: &str,
        clock: ClockFormat,
        week_starts_on: WeekStartDay,
    ) -> RepoResult<AccountSettings> {
        if self.get_user(user_uuid)?.is_none() {
            return Err(RepoError::NotFound(user_uuid));
        }

        self.conn.execute(
            "INSERT INTO account_settings (user_uuid, timezone, clock, week_starts_on)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_uuid) DO UPDATE SET
                 timezone = excluded.timezone,
                 clock = excluded.clock,
                 week_starts_on = excluded.week_starts_on,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![
                user_uuid.to_string(),
                timezone,
                clock.as_str(),
                week_starts_on.as_str(),
            ],
        )?;

        self.get_settings(user_uuid)
    }
}

fn find_by_subject_in(conn: &Connection, subject: &str) -> RepoResult<Option<UserProfile>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE subject = ?1;"))?;
    let mut rows = stmt.query([subject])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn load_required_user(conn: &Connection, user_uuid: UserId) -> RepoResult<UserProfile> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
    let profile = stmt
        .query_row([user_uuid.to_string()], |row| {
            Ok(parse_user_row(row))
        })
        .optional()?;
    match profile {
        Some(result) => result,
        None => Err(RepoError::NotFound(user_uuid)),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let uuid_text: String = row.get("uuid")?;
    Ok(UserProfile {
        uuid: parse_uuid(&uuid_text, "users.uuid")?,
        subject: row.get("subject")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_settings_row(row: &Row<'_>) -> RepoResult<AccountSettings> {
    let user_text: String = row.get("user_uuid")?;
    let clock_text: String = row.get("clock")?;
    let clock = ClockFormat::parse(&clock_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid clock format `{clock_text}` in account_settings.clock"
        ))
    })?;
    let week_text: String = row.get("week_starts_on")?;
    let week_starts_on = WeekStartDay::parse(&week_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid week start `{week_text}` in account_settings.week_starts_on"
        ))
    })?;

    Ok(AccountSettings {
        user_uuid: parse_uuid(&user_text, "account_settings.user_uuid")?,
        timezone: row.get("timezone")?,
        clock,
        week_starts_on,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
