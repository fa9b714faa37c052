//! Append-only timeline event repository.
//!
//! # Responsibility
//! - Append goal/milestone change events and serve filtered listings.
//!
//! # Invariants
//! - The trait exposes no update or delete: the log is append-only.
//! - Listing order is deterministic: `created_at DESC, uuid ASC`.

use crate::model::goal::{GoalId, MilestoneId};
use crate::model::timeline::{TimelineEvent, TimelineEventKind};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const TIMELINE_DEFAULT_LIMIT: u32 = 50;
const TIMELINE_LIMIT_MAX: u32 = 200;

/// Query options for timeline listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineListQuery {
    /// Optional goal scope.
    pub goal_uuid: Option<GoalId>,
    /// Optional event-kind filter.
    pub kind: Option<TimelineEventKind>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for timeline reads.
pub trait TimelineRepository {
    /// Lists events newest first.
    fn list_events(
        &self,
        user_uuid: UserId,
        query: &TimelineListQuery,
    ) -> RepoResult<Vec<TimelineEvent>>;
}

/// SQLite-backed timeline repository.
pub struct SqliteTimelineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTimelineRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "timeline_events",
                &[
                    "uuid",
                    "user_uuid",
                    "goal_uuid",
                    "milestone_uuid",
                    "kind",
                    "detail",
                    "created_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl TimelineRepository for SqliteTimelineRepository<'_> {
    fn list_events(
        &self,
        user_uuid: UserId,
        query: &TimelineListQuery,
    ) -> RepoResult<Vec<TimelineEvent>> {
        let mut sql = String::from(
            "SELECT
                uuid,
                user_uuid,
                goal_uuid,
                milestone_uuid,
                kind,
                detail,
                created_at
             FROM timeline_events
             WHERE user_uuid = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(user_uuid.to_string())];

        if let Some(goal_uuid) = query.goal_uuid {
            sql.push_str(" AND goal_uuid = ?");
            bind_values.push(Value::Text(goal_uuid.to_string()));
        }
        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC");
        let limit = normalize_timeline_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

/// Normalizes list limit according to the timeline contract.
pub fn normalize_timeline_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => TIMELINE_DEFAULT_LIMIT,
        Some(value) if value > TIMELINE_LIMIT_MAX => TIMELINE_LIMIT_MAX,
        Some(value) => value,
        None => TIMELINE_DEFAULT_LIMIT,
    }
}

/// Appends one event row.
///
/// Shared with the goal repository so events land inside the same write
/// transaction as the change they describe.
pub(crate) fn append_event(
    conn: &Connection,
    user_uuid: UserId,
    goal_uuid: GoalId,
    milestone_uuid: Option<MilestoneId>,
    kind: TimelineEventKind,
    detail: &str,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO timeline_events (uuid, user_uuid, goal_uuid, milestone_uuid, kind, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            Uuid::new_v4().to_string(),
            user_uuid.to_string(),
            goal_uuid.to_string(),
            milestone_uuid.map(|value| value.to_string()),
            kind.as_str(),
            detail,
        ],
    )?;
    Ok(())
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<TimelineEvent> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let goal_text: String = row.get("goal_uuid")?;
    let milestone_uuid = row
        .get::<_, Option<String>>("milestone_uuid")?
        .map(|value| parse_uuid(&value, "timeline_events.milestone_uuid"))
        .transpose()?;
    let kind_text: String = row.get("kind")?;
    let kind = TimelineEventKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid event kind `{kind_text}` in timeline_events.kind"
        ))
    })?;

    Ok(TimelineEvent {
        uuid: parse_uuid(&uuid_text, "timeline_events.uuid")?,
        user_uuid: parse_uuid(&user_text, "timeline_events.user_uuid")?,
        goal_uuid: parse_uuid(&goal_text, "timeline_events.goal_uuid")?,
        milestone_uuid,
        kind,
        detail: row.get("detail")?,
        created_at: row.get("created_at")?,
    })
}
