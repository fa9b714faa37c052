//! Goal and goal-milestone repository.
//!
//! # Responsibility
//! - Provide persistence APIs for goals and their ordered milestones.
//! - Keep milestone `sort_order` contiguous across create/reorder/remove.
//! - Append timeline events inside the same transaction as the change
//!   they describe.
//!
//! # Invariants
//! - Deleting a goal removes its milestones in the same transaction.
//! - Milestone listing is deterministic: `sort_order ASC, uuid ASC`.
//! - `completed_at` is set exactly while status is completed/done.

use crate::model::adoption::AdoptionKind;
use crate::model::content::RichText;
use crate::model::goal::{Goal, GoalId, GoalMilestone, GoalStatus, MilestoneId, MilestoneStatus};
use crate::model::timeline::TimelineEventKind;
use crate::model::user::UserId;
use crate::repo::adoption_repo::record_adoption;
use crate::repo::timeline_repo::append_event;
use crate::repo::{check_owner, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const GOALS_DEFAULT_LIMIT: u32 = 20;
const GOALS_LIMIT_MAX: u32 = 100;

const GOAL_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description_plain,
    description_html,
    description_json,
    status,
    target_date,
    completed_at,
    created_at,
    updated_at
FROM goals";

const MILESTONE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    goal_uuid,
    title,
    description_plain,
    description_html,
    description_json,
    status,
    sort_order,
    completed_at,
    created_at,
    updated_at
FROM goal_milestones";

/// Write model for goal creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: RichText,
    /// Optional target expressed as an epoch day.
    pub target_date: Option<i64>,
}

/// Write model for goal updates. Full replacement semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalUpdate {
    pub title: String,
    pub description: RichText,
    pub target_date: Option<i64>,
}

/// Write model for milestone creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMilestone {
    pub title: String,
    pub description: RichText,
}

/// Write model for milestone updates. Full replacement semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneUpdate {
    pub title: String,
    pub description: RichText,
}

/// Query options for goal listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalListQuery {
    /// Optional status filter.
    pub status: Option<GoalStatus>,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for goal and milestone operations.
pub trait GoalRepository {
    fn create_goal(&self, user_uuid: UserId, draft: &NewGoal) -> RepoResult<Goal>;
    fn get_goal(&self, user_uuid: UserId, goal_uuid: GoalId) -> RepoResult<Goal>;
    fn list_goals(&self, user_uuid: UserId, query: &GoalListQuery) -> RepoResult<Vec<Goal>>;
    fn update_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        changes: &GoalUpdate,
    ) -> RepoResult<Goal>;
    /// Transitions goal status, stamping or clearing `completed_at`.
    /// A no-op transition appends no event.
    fn set_goal_status(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        status: GoalStatus,
    ) -> RepoResult<Goal>;
    /// Deletes the goal and its milestones. Returns removed milestone
    /// count.
    fn delete_goal(&self, user_uuid: UserId, goal_uuid: GoalId) -> RepoResult<u64>;

    /// Appends one milestone at the end of the goal's ordering.
    fn add_milestone(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        draft: &NewMilestone,
    ) -> RepoResult<GoalMilestone>;
    fn get_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
    ) -> RepoResult<GoalMilestone>;
    fn list_milestones(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> RepoResult<Vec<GoalMilestone>>;
    fn update_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        changes: &MilestoneUpdate,
    ) -> RepoResult<GoalMilestone>;
    fn set_milestone_status(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        status: MilestoneStatus,
    ) -> RepoResult<GoalMilestone>;
    /// Moves one milestone to `target_index` within its goal and rewrites
    /// sibling positions to contiguous `0..n`. `None` moves to the end.
    fn reorder_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        target_index: Option<i64>,
    ) -> RepoResult<Vec<GoalMilestone>>;
    /// Removes one milestone and closes the ordering gap.
    fn remove_milestone(&self, user_uuid: UserId, milestone_uuid: MilestoneId) -> RepoResult<()>;
}

/// SQLite-backed goal repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "goals",
                    &[
                        "uuid",
                        "user_uuid",
                        "title",
                        "description_plain",
                        "description_html",
                        "description_json",
                        "status",
                        "target_date",
                        "completed_at",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "goal_milestones",
                    &[
                        "uuid",
                        "user_uuid",
                        "goal_uuid",
                        "title",
                        "status",
                        "sort_order",
                        "completed_at",
                    ],
                ),
                ("timeline_events", &["uuid", "user_uuid", "goal_uuid", "kind"]),
                ("milestones", &["uuid", "user_uuid", "kind"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, user_uuid: UserId, draft: &NewGoal) -> RepoResult<Goal> {
        let goal_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO goals (
                uuid,
                user_uuid,
                title,
                description_plain,
                description_html,
                description_json,
                status,
                target_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7);",
            params![
                goal_uuid.to_string(),
                user_uuid.to_string(),
                draft.title.as_str(),
                draft.description.plain.as_str(),
                draft.description.html.as_str(),
                draft.description.json.as_str(),
                draft.target_date,
            ],
        )?;
        append_event(
            &tx,
            user_uuid,
            goal_uuid,
            None,
            TimelineEventKind::GoalCreated,
            draft.title.as_str(),
        )?;
        record_adoption(&tx, user_uuid, AdoptionKind::FirstGoal)?;

        let created = load_required_goal(&tx, goal_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_goal(&self, user_uuid: UserId, goal_uuid: GoalId) -> RepoResult<Goal> {
        check_owner(self.conn, "goals", goal_uuid, user_uuid)?;
        load_required_goal(self.conn, goal_uuid)
    }

    fn list_goals(&self, user_uuid: UserId, query: &GoalListQuery) -> RepoResult<Vec<Goal>> {
        let mut sql = format!("{GOAL_SELECT_SQL} WHERE user_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_uuid.to_string())];

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        let limit = normalize_goal_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn update_goal(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        changes: &GoalUpdate,
    ) -> RepoResult<Goal> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goals", goal_uuid, user_uuid)?;

        tx.execute(
            "UPDATE goals
             SET title = ?2,
                 description_plain = ?3,
                 description_html = ?4,
                 description_json = ?5,
                 target_date = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                goal_uuid.to_string(),
                changes.title.as_str(),
                changes.description.plain.as_str(),
                changes.description.html.as_str(),
                changes.description.json.as_str(),
                changes.target_date,
            ],
        )?;
        append_event(
            &tx,
            user_uuid,
            goal_uuid,
            None,
            TimelineEventKind::GoalUpdated,
            changes.title.as_str(),
        )?;

        let updated = load_required_goal(&tx, goal_uuid)?;
        tx.commit()?;
        Ok(updated)
    }

    fn set_goal_status(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        status: GoalStatus,
    ) -> RepoResult<Goal> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goals", goal_uuid, user_uuid)?;

        let current = load_required_goal(&tx, goal_uuid)?;
        if current.status == status {
            tx.commit()?;
            return Ok(current);
        }

        match status {
            GoalStatus::Completed => {
                tx.execute(
                    "UPDATE goals
                     SET status = 'completed',
                         completed_at = (strftime('%s', 'now') * 1000),
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    [goal_uuid.to_string()],
                )?;
                append_event(
                    &tx,
                    user_uuid,
                    goal_uuid,
                    None,
                    TimelineEventKind::GoalCompleted,
                    current.title.as_str(),
                )?;
            }
            GoalStatus::Active => {
                tx.execute(
                    "UPDATE goals
                     SET status = 'active',
                         completed_at = NULL,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    [goal_uuid.to_string()],
                )?;
                append_event(
                    &tx,
                    user_uuid,
                    goal_uuid,
                    None,
                    TimelineEventKind::GoalReopened,
                    current.title.as_str(),
                )?;
            }
        }

        let updated = load_required_goal(&tx, goal_uuid)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_goal(&self, user_uuid: UserId, goal_uuid: GoalId) -> RepoResult<u64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goals", goal_uuid, user_uuid)?;

        let current = load_required_goal(&tx, goal_uuid)?;
        let removed = tx.execute(
            "DELETE FROM goal_milestones WHERE goal_uuid = ?1;",
            [goal_uuid.to_string()],
        )?;
        append_event(
            &tx,
            user_uuid,
            goal_uuid,
            None,
            TimelineEventKind::GoalDeleted,
            current.title.as_str(),
        )?;
        tx.execute("DELETE FROM goals WHERE uuid = ?1;", [goal_uuid.to_string()])?;

        tx.commit()?;
        Ok(removed as u64)
    }

    fn add_milestone(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
        draft: &NewMilestone,
    ) -> RepoResult<GoalMilestone> {
        let milestone_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goals", goal_uuid, user_uuid)?;

        let sort_order = next_sort_order(&tx, goal_uuid)?;
        tx.execute(
            "INSERT INTO goal_milestones (
                uuid,
                user_uuid,
                goal_uuid,
                title,
                description_plain,
                description_html,
                description_json,
                status,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8);",
            params![
                milestone_uuid.to_string(),
                user_uuid.to_string(),
                goal_uuid.to_string(),
                draft.title.as_str(),
                draft.description.plain.as_str(),
                draft.description.html.as_str(),
                draft.description.json.as_str(),
                sort_order,
            ],
        )?;
        append_event(
            &tx,
            user_uuid,
            goal_uuid,
            Some(milestone_uuid),
            TimelineEventKind::MilestoneAdded,
            draft.title.as_str(),
        )?;

        let created = load_required_milestone(&tx, milestone_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
    ) -> RepoResult<GoalMilestone> {
        check_owner(self.conn, "goal_milestones", milestone_uuid, user_uuid)?;
        load_required_milestone(self.conn, milestone_uuid)
    }

    fn list_milestones(
        &self,
        user_uuid: UserId,
        goal_uuid: GoalId,
    ) -> RepoResult<Vec<GoalMilestone>> {
        check_owner(self.conn, "goals", goal_uuid, user_uuid)?;
        list_milestones_of(self.conn, goal_uuid)
    }

    fn update_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        changes: &MilestoneUpdate,
    ) -> RepoResult<GoalMilestone> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goal_milestones", milestone_uuid, user_uuid)?;

        let current = load_required_milestone(&tx, milestone_uuid)?;
        tx.execute(
            "UPDATE goal_milestones
             SET title = ?2,
                 description_plain = ?3,
                 description_html = ?4,
                 description_json = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                milestone_uuid.to_string(),
                changes.title.as_str(),
                changes.description.plain.as_str(),
                changes.description.html.as_str(),
                changes.description.json.as_str(),
            ],
        )?;
        append_event(
            &tx,
            user_uuid,
            current.goal_uuid,
            Some(milestone_uuid),
            TimelineEventKind::MilestoneUpdated,
            changes.title.as_str(),
        )?;

        let updated = load_required_milestone(&tx, milestone_uuid)?;
        tx.commit()?;
        Ok(updated)
    }

    fn set_milestone_status(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        status: MilestoneStatus,
    ) -> RepoResult<GoalMilestone> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goal_milestones", milestone_uuid, user_uuid)?;

        let current = load_required_milestone(&tx, milestone_uuid)?;
        match status {
            MilestoneStatus::Done => {
                tx.execute(
                    "UPDATE goal_milestones
                     SET status = 'done',
                         completed_at = (strftime('%s', 'now') * 1000),
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    [milestone_uuid.to_string()],
                )?;
                if current.status != MilestoneStatus::Done {
                    append_event(
                        &tx,
                        user_uuid,
                        current.goal_uuid,
                        Some(milestone_uuid),
                        TimelineEventKind::MilestoneCompleted,
                        current.title.as_str(),
                    )?;
                }
            }
            other => {
                tx.execute(
                    "UPDATE goal_milestones
                     SET status = ?2,
                         completed_at = NULL,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![milestone_uuid.to_string(), other.as_str()],
                )?;
            }
        }

        let updated = load_required_milestone(&tx, milestone_uuid)?;
        tx.commit()?;
        Ok(updated)
    }

    fn reorder_milestone(
        &self,
        user_uuid: UserId,
        milestone_uuid: MilestoneId,
        target_index: Option<i64>,
    ) -> RepoResult<Vec<GoalMilestone>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goal_milestones", milestone_uuid, user_uuid)?;

        let current = load_required_milestone(&tx, milestone_uuid)?;
        let mut sibling_ids = list_milestone_ids(&tx, current.goal_uuid)?;
        sibling_ids.retain(|id| *id != milestone_uuid);

        let target = target_index
            .unwrap_or(sibling_ids.len() as i64)
            .clamp(0, sibling_ids.len() as i64) as usize;
        sibling_ids.insert(target, milestone_uuid);

        rewrite_sort_orders(&tx, &sibling_ids)?;

        let reordered = list_milestones_of(&tx, current.goal_uuid)?;
        tx.commit()?;
        Ok(reordered)
    }

    fn remove_milestone(&self, user_uuid: UserId, milestone_uuid: MilestoneId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "goal_milestones", milestone_uuid, user_uuid)?;

        let current = load_required_milestone(&tx, milestone_uuid)?;
        tx.execute(
            "DELETE FROM goal_milestones WHERE uuid = ?1;",
            [milestone_uuid.to_string()],
        )?;

        let remaining = list_milestone_ids(&tx, current.goal_uuid)?;
        rewrite_sort_orders(&tx, &remaining)?;
        append_event(
            &tx,
            user_uuid,
            current.goal_uuid,
            Some(milestone_uuid),
            TimelineEventKind::MilestoneRemoved,
            current.title.as_str(),
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Normalizes list limit according to the goals contract.
pub fn normalize_goal_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => GOALS_DEFAULT_LIMIT,
        Some(value) if value > GOALS_LIMIT_MAX => GOALS_LIMIT_MAX,
        Some(value) => value,
        None => GOALS_DEFAULT_LIMIT,
    }
}

fn next_sort_order(conn: &Connection, goal_uuid: GoalId) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM goal_milestones
         WHERE goal_uuid = ?1;",
        [goal_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_milestone_ids(conn: &Connection, goal_uuid: GoalId) -> RepoResult<Vec<MilestoneId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM goal_milestones
         WHERE goal_uuid = ?1
         ORDER BY sort_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([goal_uuid.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "goal_milestones.uuid")?);
    }
    Ok(ids)
}

fn rewrite_sort_orders(conn: &Connection, ordered_ids: &[MilestoneId]) -> RepoResult<()> {
    for (index, id) in ordered_ids.iter().enumerate() {
        conn.execute(
            "UPDATE goal_milestones
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), index as i64],
        )?;
    }
    Ok(())
}

fn list_milestones_of(conn: &Connection, goal_uuid: GoalId) -> RepoResult<Vec<GoalMilestone>> {
    let mut stmt = conn.prepare(&format!(
        "{MILESTONE_SELECT_SQL}
         WHERE goal_uuid = ?1
         ORDER BY sort_order ASC, uuid ASC;"
    ))?;
    let mut rows = stmt.query([goal_uuid.to_string()])?;
    let mut milestones = Vec::new();
    while let Some(row) = rows.next()? {
        milestones.push(parse_milestone_row(row)?);
    }
    Ok(milestones)
}

fn load_required_goal(conn: &Connection, goal_uuid: GoalId) -> RepoResult<Goal> {
    let mut stmt = conn.prepare(&format!("{GOAL_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([goal_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_goal_row(row);
    }
    Err(RepoError::NotFound(goal_uuid))
}

fn load_required_milestone(
    conn: &Connection,
    milestone_uuid: MilestoneId,
) -> RepoResult<GoalMilestone> {
    let mut stmt = conn.prepare(&format!("{MILESTONE_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([milestone_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_milestone_row(row);
    }
    Err(RepoError::NotFound(milestone_uuid))
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let status_text: String = row.get("status")?;
    let status = GoalStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid goal status `{status_text}` in goals.status"))
    })?;

    Ok(Goal {
        uuid: parse_uuid(&uuid_text, "goals.uuid")?,
        user_uuid: parse_uuid(&user_text, "goals.user_uuid")?,
        title: row.get("title")?,
        description: RichText {
            plain: row.get("description_plain")?,
            html: row.get("description_html")?,
            json: row.get("description_json")?,
        },
        status,
        target_date: row.get("target_date")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_milestone_row(row: &Row<'_>) -> RepoResult<GoalMilestone> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let goal_text: String = row.get("goal_uuid")?;
    let status_text: String = row.get("status")?;
    let status = MilestoneStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid milestone status `{status_text}` in goal_milestones.status"
        ))
    })?;

    Ok(GoalMilestone {
        uuid: parse_uuid(&uuid_text, "goal_milestones.uuid")?,
        user_uuid: parse_uuid(&user_text, "goal_milestones.user_uuid")?,
        goal_uuid: parse_uuid(&goal_text, "goal_milestones.goal_uuid")?,
        title: row.get("title")?,
        description: RichText {
            plain: row.get("description_plain")?,
            html: row.get("description_html")?,
            json: row.get("description_json")?,
        },
        status,
        sort_order: row.get("sort_order")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
