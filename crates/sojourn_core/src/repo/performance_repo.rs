//! Performance question/response repository.
//!
//! # Responsibility
//! - Persist the ordered question list and its recorded answers.
//! - Own the soft/hard delete decision for questions inside one
//!   transaction.
//!
//! # Invariants
//! - Active question `sort_order` values are contiguous `0..n` per user
//!   after every create/reorder/delete.
//! - A question with responses is deactivated, never removed, so old
//!   answers keep their prompt text.
//! - One response per `(question, period)`; writes upsert.

use crate::model::content::RichText;
use crate::model::performance::{
    PerformanceQuestion, PerformanceResponse, QuestionDeleteOutcome, QuestionId,
};
use crate::model::user::UserId;
use crate::repo::{
    check_owner, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const QUESTION_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    prompt,
    sort_order,
    is_active,
    is_default,
    created_at,
    updated_at
FROM performance_questions";

const RESPONSE_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    question_uuid,
    period,
    answer_plain,
    answer_html,
    answer_json,
    created_at,
    updated_at
FROM performance_responses";

/// Repository interface for performance review operations.
pub trait PerformanceRepository {
    /// Appends one question at the end of the active ordering.
    fn create_question(
        &self,
        user_uuid: UserId,
        prompt: &str,
        is_default: bool,
    ) -> RepoResult<PerformanceQuestion>;
    /// Inserts the default prompt set for users with no questions yet.
    /// Returns the number of inserted rows (zero when already seeded).
    fn seed_default_questions(&self, user_uuid: UserId, prompts: &[&str]) -> RepoResult<u32>;
    fn get_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<PerformanceQuestion>;
    /// Lists questions ordered by `sort_order ASC, uuid ASC`. Inactive
    /// ones are excluded unless requested.
    fn list_questions(
        &self,
        user_uuid: UserId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PerformanceQuestion>>;
    /// Replaces the prompt of one active question.
    fn update_question_prompt(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        prompt: &str,
    ) -> RepoResult<PerformanceQuestion>;
    /// Moves one active question to `target_index` and rewrites the
    /// active ordering to contiguous `0..n`. `None` moves to the end.
    fn reorder_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        target_index: Option<i64>,
    ) -> RepoResult<Vec<PerformanceQuestion>>;
    /// Deactivates the question when responses exist, removes the row
    /// otherwise. Reindexes the remaining active ordering either way.
    fn delete_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<QuestionDeleteOutcome>;
    /// Upserts the response for `(question, period)`.
    fn upsert_response(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        period: &str,
        answer: &RichText,
    ) -> RepoResult<PerformanceResponse>;
    /// Lists responses recorded for one period, oldest first.
    fn list_responses_for_period(
        &self,
        user_uuid: UserId,
        period: &str,
    ) -> RepoResult<Vec<PerformanceResponse>>;
    /// Lists responses for one question, newest period first.
    fn list_responses_for_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<Vec<PerformanceResponse>>;
}

/// SQLite-backed performance repository.
pub struct SqlitePerformanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePerformanceRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "performance_questions",
                    &[
                        "uuid",
                        "user_uuid",
                        "prompt",
                        "sort_order",
                        "is_active",
                        "is_default",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "performance_responses",
                    &[
                        "uuid",
                        "user_uuid",
                        "question_uuid",
                        "period",
                        "answer_plain",
                        "answer_html",
                        "answer_json",
                    ],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl PerformanceRepository for SqlitePerformanceRepository<'_> {
    fn create_question(
        &self,
        user_uuid: UserId,
        prompt: &str,
        is_default: bool,
    ) -> RepoResult<PerformanceQuestion> {
        let question_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let sort_order = next_sort_order(&tx, user_uuid)?;
        tx.execute(
            "INSERT INTO performance_questions (
                uuid,
                user_uuid,
                prompt,
                sort_order,
                is_active,
                is_default
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5);",
            params![
                question_uuid.to_string(),
                user_uuid.to_string(),
                prompt,
                sort_order,
                is_default as i64,
            ],
        )?;

        let created = load_required_question(&tx, question_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn seed_default_questions(&self, user_uuid: UserId, prompts: &[&str]) -> RepoResult<u32> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM performance_questions WHERE user_uuid = ?1;",
            [user_uuid.to_string()],
            |row| row.get(0),
        )?;
        if existing > 0 {
            tx.commit()?;
            return Ok(0);
        }

        for (index, prompt) in prompts.iter().enumerate() {
            tx.execute(
                "INSERT INTO performance_questions (
                    uuid,
                    user_uuid,
                    prompt,
                    sort_order,
                    is_active,
                    is_default
                ) VALUES (?1, ?2, ?3, ?4, 1, 1);",
                params![
                    Uuid::new_v4().to_string(),
                    user_uuid.to_string(),
                    prompt,
                    index as i64,
                ],
            )?;
        }

        tx.commit()?;
        Ok(prompts.len() as u32)
    }

    fn get_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<PerformanceQuestion> {
        check_owner(self.conn, "performance_questions", question_uuid, user_uuid)?;
        load_required_question(self.conn, question_uuid)
    }

    fn list_questions(
        &self,
        user_uuid: UserId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PerformanceQuestion>> {
        let sql = if include_inactive {
            format!(
                "{QUESTION_SELECT_SQL}
                 WHERE user_uuid = ?1
                 ORDER BY is_active DESC, sort_order ASC, uuid ASC;"
            )
        } else {
            format!(
                "{QUESTION_SELECT_SQL}
                 WHERE user_uuid = ?1
                   AND is_active = 1
                 ORDER BY sort_order ASC, uuid ASC;"
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(row)?);
        }
        Ok(questions)
    }

    fn update_question_prompt(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        prompt: &str,
    ) -> RepoResult<PerformanceQuestion> {
        check_owner(self.conn, "performance_questions", question_uuid, user_uuid)?;

        let changed = self.conn.execute(
            "UPDATE performance_questions
             SET prompt = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_active = 1;",
            params![question_uuid.to_string(), prompt],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(question_uuid));
        }

        load_required_question(self.conn, question_uuid)
    }

    fn reorder_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        target_index: Option<i64>,
    ) -> RepoResult<Vec<PerformanceQuestion>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "performance_questions", question_uuid, user_uuid)?;

        let current = load_required_question(&tx, question_uuid)?;
        if !current.is_active {
            return Err(RepoError::NotFound(question_uuid));
        }

        let mut active_ids = list_active_question_ids(&tx, user_uuid)?;
        active_ids.retain(|id| *id != question_uuid);

        let target = target_index
            .unwrap_or(active_ids.len() as i64)
            .clamp(0, active_ids.len() as i64) as usize;
        active_ids.insert(target, question_uuid);

        rewrite_sort_orders(&tx, &active_ids)?;

        let reordered = list_active_questions(&tx, user_uuid)?;
        tx.commit()?;
        Ok(reordered)
    }

    fn delete_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<QuestionDeleteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "performance_questions", question_uuid, user_uuid)?;

        let response_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM performance_responses WHERE question_uuid = ?1;",
            [question_uuid.to_string()],
            |row| row.get(0),
        )?;

        let outcome = if response_count > 0 {
            tx.execute(
                "UPDATE performance_questions
                 SET is_active = 0,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                [question_uuid.to_string()],
            )?;
            QuestionDeleteOutcome::Deactivated
        } else {
            tx.execute(
                "DELETE FROM performance_questions WHERE uuid = ?1;",
                [question_uuid.to_string()],
            )?;
            QuestionDeleteOutcome::Removed
        };

        let remaining = list_active_question_ids(&tx, user_uuid)?;
        rewrite_sort_orders(&tx, &remaining)?;

        tx.commit()?;
        Ok(outcome)
    }

    fn upsert_response(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        period: &str,
        answer: &RichText,
    ) -> RepoResult<PerformanceResponse> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_owner(&tx, "performance_questions", question_uuid, user_uuid)?;

        tx.execute(
            "INSERT INTO performance_responses (
                uuid,
                user_uuid,
                question_uuid,
                period,
                answer_plain,
                answer_html,
                answer_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(question_uuid, period) DO UPDATE SET
                answer_plain = excluded.answer_plain,
                answer_html = excluded.answer_html,
                answer_json = excluded.answer_json,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                Uuid::new_v4().to_string(),
                user_uuid.to_string(),
                question_uuid.to_string(),
                period,
                answer.plain.as_str(),
                answer.html.as_str(),
                answer.json.as_str(),
            ],
        )?;

        let saved = load_response_by_key(&tx, question_uuid, period)?;
        tx.commit()?;
        Ok(saved)
    }

    fn list_responses_for_period(
        &self,
        user_uuid: UserId,
        period: &str,
    ) -> RepoResult<Vec<PerformanceResponse>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RESPONSE_SELECT_SQL}
             WHERE user_uuid = ?1
               AND period = ?2
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![user_uuid.to_string(), period])?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(parse_response_row(row)?);
        }
        Ok(responses)
    }

    fn list_responses_for_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> RepoResult<Vec<PerformanceResponse>> {
        check_owner(self.conn, "performance_questions", question_uuid, user_uuid)?;

        let mut stmt = self.conn.prepare(&format!(
            "{RESPONSE_SELECT_SQL}
             WHERE question_uuid = ?1
             ORDER BY period DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([question_uuid.to_string()])?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(parse_response_row(row)?);
        }
        Ok(responses)
    }
}

fn next_sort_order(conn: &Connection, user_uuid: UserId) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM performance_questions
         WHERE user_uuid = ?1
           AND is_active = 1;",
        [user_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_active_question_ids(conn: &Connection, user_uuid: UserId) -> RepoResult<Vec<QuestionId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM performance_questions
         WHERE user_uuid = ?1
           AND is_active = 1
         ORDER BY sort_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([user_uuid.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "performance_questions.uuid")?);
    }
    Ok(ids)
}

fn list_active_questions(
    conn: &Connection,
    user_uuid: UserId,
) -> RepoResult<Vec<PerformanceQuestion>> {
    let mut stmt = conn.prepare(&format!(
        "{QUESTION_SELECT_SQL}
         WHERE user_uuid = ?1
           AND is_active = 1
         ORDER BY sort_order ASC, uuid ASC;"
    ))?;
    let mut rows = stmt.query([user_uuid.to_string()])?;
    let mut questions = Vec::new();
    while let Some(row) = rows.next()? {
        questions.push(parse_question_row(row)?);
    }
    Ok(questions)
}

fn rewrite_sort_orders(conn: &Connection, ordered_ids: &[QuestionId]) -> RepoResult<()> {
    for (index, id) in ordered_ids.iter().enumerate() {
        conn.execute(
            "UPDATE performance_questions
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), index as i64],
        )?;
    }
    Ok(())
}

fn load_required_question(
    conn: &Connection,
    question_uuid: QuestionId,
) -> RepoResult<PerformanceQuestion> {
    let mut stmt = conn.prepare(&format!("{QUESTION_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([question_uuid.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_question_row(row);
    }
    Err(RepoError::NotFound(question_uuid))
}

fn load_response_by_key(
    conn: &Connection,
    question_uuid: QuestionId,
    period: &str,
) -> RepoResult<PerformanceResponse> {
    let mut stmt = conn.prepare(&format!(
        "{RESPONSE_SELECT_SQL}
         WHERE question_uuid = ?1
           AND period = ?2;"
    ))?;
    let response = stmt
        .query_row(params![question_uuid.to_string(), period], |row| {
            Ok(parse_response_row(row))
        })
        .optional()?;
    match response {
        Some(result) => result,
        None => Err(RepoError::NotFound(question_uuid)),
    }
}

fn parse_question_row(row: &Row<'_>) -> RepoResult<PerformanceQuestion> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let is_active = parse_bool(row.get("is_active")?, "performance_questions.is_active")?;
    let is_default = parse_bool(row.get("is_default")?, "performance_questions.is_default")?;

    Ok(PerformanceQuestion {
        uuid: parse_uuid(&uuid_text, "performance_questions.uuid")?,
        user_uuid: parse_uuid(&user_text, "performance_questions.user_uuid")?,
        prompt: row.get("prompt")?,
        sort_order: row.get("sort_order")?,
        is_active,
        is_default,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_response_row(row: &Row<'_>) -> RepoResult<PerformanceResponse> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let question_text: String = row.get("question_uuid")?;

    Ok(PerformanceResponse {
        uuid: parse_uuid(&uuid_text, "performance_responses.uuid")?,
        user_uuid: parse_uuid(&user_text, "performance_responses.user_uuid")?,
        question_uuid: parse_uuid(&question_text, "performance_responses.question_uuid")?,
        period: row.get("period")?,
        answer: RichText {
            plain: row.get("answer_plain")?,
            html: row.get("answer_html")?,
            json: row.get("answer_json")?,
        },
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
