//! Performance review use-case service.
//!
//! # Responsibility
//! - Seed the default question set and manage the ordered question list.
//! - Validate review periods and route the soft/hard delete decision.
//!
//! # Invariants
//! - Periods are `YYYY-MM` strings with a real month component.
//! - Responses can only target active questions.

use crate::model::content::RichText;
use crate::model::performance::{
    PerformanceQuestion, PerformanceResponse, QuestionDeleteOutcome, QuestionId,
};
use crate::model::user::UserId;
use crate::repo::performance_repo::PerformanceRepository;
use crate::repo::RepoError;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prompt set seeded for users with no questions yet.
pub const DEFAULT_QUESTIONS: &[&str] = &[
    "What accomplishments are you most proud of this period?",
    "Where did you have the most impact outside your own projects?",
    "What skill did you invest in, and how has it shown up in your work?",
    "What feedback have you received, and what did you change because of it?",
    "What do you want to focus on next period?",
];

static PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid period regex"));

/// Service error for performance review use-cases.
#[derive(Debug)]
pub enum PerformanceServiceError {
    /// Prompt is empty after trimming.
    EmptyPrompt,
    /// Period is not a `YYYY-MM` string.
    InvalidPeriod(String),
    /// Response target has been deactivated.
    QuestionInactive(QuestionId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for PerformanceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPrompt => write!(f, "question prompt must not be empty"),
            Self::InvalidPeriod(value) => {
                write!(f, "invalid review period `{value}`; expected YYYY-MM")
            }
            Self::QuestionInactive(id) => write!(f, "question is no longer active: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PerformanceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PerformanceServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Performance review service facade over repository implementations.
pub struct PerformanceService<R: PerformanceRepository> {
    repo: R,
}

impl<R: PerformanceRepository> PerformanceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Seeds [`DEFAULT_QUESTIONS`] for users with no questions yet.
    ///
    /// Idempotent: returns zero when the user already has any question,
    /// active or not.
    pub fn seed_defaults(&self, user_uuid: UserId) -> Result<u32, PerformanceServiceError> {
        let inserted = self.repo.seed_default_questions(user_uuid, DEFAULT_QUESTIONS)?;
        if inserted > 0 {
            info!(
                "event=question_seed module=performance status=ok user={user_uuid} inserted={inserted}"
            );
        }
        Ok(inserted)
    }

    /// Appends one custom question at the end of the active ordering.
    pub fn add_question(
        &self,
        user_uuid: UserId,
        prompt: &str,
    ) -> Result<PerformanceQuestion, PerformanceServiceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PerformanceServiceError::EmptyPrompt);
        }
        Ok(self.repo.create_question(user_uuid, prompt, false)?)
    }

    /// Lists active questions in `sort_order` position.
    pub fn list_questions(
        &self,
        user_uuid: UserId,
    ) -> Result<Vec<PerformanceQuestion>, PerformanceServiceError> {
        Ok(self.repo.list_questions(user_uuid, false)?)
    }

    /// Lists every question including deactivated ones.
    pub fn list_all_questions(
        &self,
        user_uuid: UserId,
    ) -> Result<Vec<PerformanceQuestion>, PerformanceServiceError> {
        Ok(self.repo.list_questions(user_uuid, true)?)
    }

    /// Replaces one active question's prompt.
    pub fn update_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        prompt: &str,
    ) -> Result<PerformanceQuestion, PerformanceServiceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PerformanceServiceError::EmptyPrompt);
        }
        Ok(self
            .repo
            .update_question_prompt(user_uuid, question_uuid, prompt)?)
    }

    /// Moves one active question to `target_index` in the ordering.
    pub fn reorder_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        target_index: Option<i64>,
    ) -> Result<Vec<PerformanceQuestion>, PerformanceServiceError> {
        Ok(self
            .repo
            .reorder_question(user_uuid, question_uuid, target_index)?)
    }

    /// Deletes one question, deactivating instead when responses exist.
    pub fn delete_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> Result<QuestionDeleteOutcome, PerformanceServiceError> {
        let outcome = self.repo.delete_question(user_uuid, question_uuid)?;
        let decision = match outcome {
            QuestionDeleteOutcome::Deactivated => "soft",
            QuestionDeleteOutcome::Removed => "hard",
        };
        info!(
            "event=question_delete module=performance status=ok question={question_uuid} decision={decision}"
        );
        Ok(outcome)
    }

    /// Records or replaces the response for `(question, period)`.
    pub fn record_response(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
        period: &str,
        answer: RichText,
    ) -> Result<PerformanceResponse, PerformanceServiceError> {
        let period = period.trim();
        if !PERIOD_RE.is_match(period) {
            return Err(PerformanceServiceError::InvalidPeriod(period.to_string()));
        }

        let question = self.repo.get_question(user_uuid, question_uuid)?;
        if !question.is_active {
            return Err(PerformanceServiceError::QuestionInactive(question_uuid));
        }

        Ok(self
            .repo
            .upsert_response(user_uuid, question_uuid, period, &answer)?)
    }

    /// Lists responses recorded for one period, oldest first.
    pub fn list_responses_for_period(
        &self,
        user_uuid: UserId,
        period: &str,
    ) -> Result<Vec<PerformanceResponse>, PerformanceServiceError> {
        let period = period.trim();
        if !PERIOD_RE.is_match(period) {
            return Err(PerformanceServiceError::InvalidPeriod(period.to_string()));
        }
        Ok(self.repo.list_responses_for_period(user_uuid, period)?)
    }

    /// Lists responses for one question, newest period first.
    pub fn list_responses_for_question(
        &self,
        user_uuid: UserId,
        question_uuid: QuestionId,
    ) -> Result<Vec<PerformanceResponse>, PerformanceServiceError> {
        Ok(self
            .repo
            .list_responses_for_question(user_uuid, question_uuid)?)
    }
}
