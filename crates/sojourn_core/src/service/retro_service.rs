//! Weekly retro use-case service.
//!
//! # Responsibility
//! - Normalize caller timestamps to configured week boundaries.
//! - Validate slider ratings before persistence.
//!
//! # Invariants
//! - Ratings are integers in `1..=10`.
//! - Any timestamp inside a week saves to that week's configured start
//!   day, so repeated saves within one week hit the same row.

use crate::model::retro::Retro;
use crate::model::user::UserId;
use crate::repo::retro_repo::{RetroDraft, RetroRepository};
use crate::repo::RepoError;
use crate::timeutil::{week_start_of, WeekStartDay};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for retro use-cases.
#[derive(Debug)]
pub enum RetroServiceError {
    /// A slider rating is outside `1..=10`.
    InvalidRating { name: &'static str, value: u8 },
    /// Timestamp is outside the representable date range.
    InvalidTimestamp(i64),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RetroServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRating { name, value } => {
                write!(f, "rating `{name}` must be 1-10, got {value}")
            }
            Self::InvalidTimestamp(value) => write!(f, "timestamp out of range: {value}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RetroServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RetroServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Retro service facade over repository implementations.
pub struct RetroService<R: RetroRepository> {
    repo: R,
}

impl<R: RetroRepository> RetroService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves the retro for the week containing `at_ms`.
    ///
    /// The timestamp is normalized to the configured week start, so
    /// repeated saves within one week upsert the same record.
    pub fn save_retro(
        &self,
        user_uuid: UserId,
        at_ms: i64,
        week_starts_on: WeekStartDay,
        draft: RetroDraft,
    ) -> Result<Retro, RetroServiceError> {
        if let Some((name, value)) = draft.ratings.first_out_of_range() {
            return Err(RetroServiceError::InvalidRating { name, value });
        }

        let week_start = week_start_of(at_ms, week_starts_on)
            .ok_or(RetroServiceError::InvalidTimestamp(at_ms))?;
        Ok(self.repo.upsert_retro(user_uuid, week_start, &draft)?)
    }

    /// Loads the retro covering `at_ms`, if recorded.
    pub fn get_retro_for(
        &self,
        user_uuid: UserId,
        at_ms: i64,
        week_starts_on: WeekStartDay,
    ) -> Result<Option<Retro>, RetroServiceError> {
        let week_start = week_start_of(at_ms, week_starts_on)
            .ok_or(RetroServiceError::InvalidTimestamp(at_ms))?;
        Ok(self.repo.get_retro(user_uuid, week_start)?)
    }

    /// Loads the retro for an exact week-start day.
    pub fn get_retro(
        &self,
        user_uuid: UserId,
        week_start: i64,
    ) -> Result<Option<Retro>, RetroServiceError> {
        Ok(self.repo.get_retro(user_uuid, week_start)?)
    }

    /// Lists retros, newest week first.
    pub fn list_retros(
        &self,
        user_uuid: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Retro>, RetroServiceError> {
        Ok(self.repo.list_retros(user_uuid, limit)?)
    }
}
