//! Task repository.
//!
//! # Responsibility
//! - Provide CRUD persistence for standalone tasks.
//!
//! # Invariants
//! - `completed_at` is set exactly while the status is terminal.
//! - Task deletion is a hard delete.

use crate::model::adoption::AdoptionKind;
use crate::model::content::RichText;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::user::UserId;
use crate::repo::adoption_repo::record_adoption;
use crate::repo::{check_owner, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TASKS_DEFAULT_LIMIT: u32 = 20;
const TASKS_LIMIT_MAX: u32 = 100;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    title,
    description_plain,
    description_html,
    description_json,
    status,
    due_date,
    completed_at,
    created_at,
    updated_at
FROM tasks";

/// Write model for task creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: RichText,
    /// Optional due date expressed as an epoch day.
    pub due_date: Option<i64>,
}

/// Write model for task updates. Full replacement semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: RichText,
    pub due_date: Option<i64>,
}

/// Query options for task listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Optional status filter.
    pub status: Option<TaskStatus>,
    /// Optional inclusive due-date ceiling (epoch day).
    pub due_on_or_before: Option<i64>,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for task operations.
pub trait TaskRepository {
    fn create_task(&self, user_uuid: UserId, draft: &NewTask) -> RepoResult<Task>;
    fn get_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<Task>;
    fn list_tasks(&self, user_uuid: UserId, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn update_task(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        changes: &TaskUpdate,
    ) -> RepoResult<Task>;
    /// Transitions task status, stamping `completed_at` for terminal
    /// states and clearing it otherwise.
    fn set_task_status(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        status: TaskStatus,
    ) -> RepoResult<Task>;
    fn delete_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "tasks",
                    &[
                        "uuid",
                        "user_uuid",
                        "title",
                        "description_plain",
                        "description_html",
                        "description_json",
                        "status",
                        "due_date",
                        "completed_at",
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

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, user_uuid: UserId, draft: &NewTask) -> RepoResult<Task> {
        let task_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO tasks (
                uuid,
                user_uuid,
                title,
                description_plain,
                description_html,
                description_json,
                status,
                due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'todo', ?7);",
            params![
                task_uuid.to_string(),
                user_uuid.to_string(),
                draft.title.as_str(),
                draft.description.plain.as_str(),
                draft.description.html.as_str(),
                draft.description.json.as_str(),
                draft.due_date,
            ],
        )?;
        record_adoption(&tx, user_uuid, AdoptionKind::FirstTask)?;

        let created = load_required_task(&tx, task_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<Task> {
        check_owner(self.conn, "tasks", task_uuid, user_uuid)?;
        load_required_task(self.conn, task_uuid)
    }

    fn list_tasks(&self, user_uuid: UserId, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE user_uuid = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_uuid.to_string())];

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(due_ceiling) = query.due_on_or_before {
            sql.push_str(" AND due_date IS NOT NULL AND due_date <= ?");
            bind_values.push(Value::Integer(due_ceiling));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        let limit = normalize_task_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        changes: &TaskUpdate,
    ) -> RepoResult<Task> {
        check_owner(self.conn, "tasks", task_uuid, user_uuid)?;

        self.conn.execute(
            "UPDATE tasks
             SET title = ?2,
                 description_plain = ?3,
                 description_html = ?4,
                 description_json = ?5,
                 due_date = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                task_uuid.to_string(),
                changes.title.as_str(),
                changes.description.plain.as_str(),
                changes.description.html.as_str(),
                changes.description.json.as_str(),
                changes.due_date,
            ],
        )?;

        load_required_task(self.conn, task_uuid)
    }

    fn set_task_status(
        &self,
        user_uuid: UserId,
        task_uuid: TaskId,
        status: TaskStatus,
    ) -> RepoResult<Task> {
        check_owner(self.conn, "tasks", task_uuid, user_uuid)?;

        if status.is_terminal() {
            self.conn.execute(
                "UPDATE tasks
                 SET status = ?2,
                     completed_at = (strftime('%s', 'now') * 1000),
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![task_uuid.to_string(), status.as_str()],
            )?;
        } else {
            self.conn.execute(
                "UPDATE tasks
                 SET status = ?2,
                     completed_at = NULL,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![task_uuid.to_string(), status.as_str()],
            )?;
        }

        load_required_task(self.conn, task_uuid)
    }

    fn delete_task(&self, user_uuid: UserId, task_uuid: TaskId) -> RepoResult<()> {
        check_owner(self.conn, "tasks", task_uuid, user_uuid)?;
        self.conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [task_uuid.to_string()])?;
        Ok(())
    }
}

/// Normalizes list limit according to the tasks contract.
pub fn normalize_task_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => TASKS_DEFAULT_LIMIT,
        Some(value) if value > TASKS_LIMIT_MAX => TASKS_LIMIT_MAX,
        Some(value) => value,
        None => TASKS_DEFAULT_LIMIT,
    }
}

fn load_required_task(conn: &Connection, task_uuid: TaskId) -> RepoResult<Task> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([task_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_task_row(row);
    }
    Err(RepoError::NotFound(task_uuid))
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
        user_uuid: parse_uuid(&user_text, "tasks.user_uuid")?,
        title: row.get("title")?,
        description: RichText {
            plain: row.get("description_plain")?,
            html: row.get("description_html")?,
            json: row.get("description_json")?,
        },
        status,
        due_date: row.get("due_date")?,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
