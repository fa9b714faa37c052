//! Identity and account-settings use-case service.
//!
//! # Responsibility
//! - Map authenticated subjects to user rows (get-or-create).
//! - Validate settings input against the static timezone table.
//!
//! # Invariants
//! - Subjects are trimmed and must be non-empty.
//! - `update_settings` rejects timezones outside `SUPPORTED_TIMEZONES`.

use crate::model::user::{AccountSettings, ClockFormat, UserId, UserProfile};
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use crate::timeutil::{is_supported_timezone, WeekStartDay};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// Auth subject is empty after trimming.
    InvalidSubject,
    /// Timezone is not in the supported table.
    UnsupportedTimezone(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSubject => write!(f, "auth subject must not be empty"),
            Self::UnsupportedTimezone(value) => write!(f, "unsupported timezone: `{value}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Account service facade over the user repository.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets or creates the user for an authenticated subject.
    ///
    /// Returns the profile and whether a new user row was created.
    pub fn ensure_user(
        &self,
        subject: &str,
        email: &str,
        display_name: &str,
    ) -> Result<(UserProfile, bool), AccountServiceError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AccountServiceError::InvalidSubject);
        }

        let (profile, created) = self.repo.ensure_user(subject, email, display_name)?;
        if created {
            info!(
                "event=user_created module=account status=ok user={}",
                profile.uuid
            );
        }
        Ok((profile, created))
    }

    /// Loads one user by stable id.
    pub fn get_user(&self, user_uuid: UserId) -> RepoResult<Option<UserProfile>> {
        self.repo.get_user(user_uuid)
    }

    /// Replaces email and display name.
    pub fn update_profile(
        &self,
        user_uuid: UserId,
        email: &str,
        display_name: &str,
    ) -> RepoResult<UserProfile> {
        self.repo.update_profile(user_uuid, email, display_name)
    }

    /// Loads settings, falling back to the documented defaults.
    pub fn get_settings(&self, user_uuid: UserId) -> RepoResult<AccountSettings> {
        self.repo.get_settings(user_uuid)
    }

    /// Validates and upserts the settings row.
    pub fn update_settings(
        &self,
        user_uuid: UserId,
        timezone: &str,
        clock: ClockFormat,
        week_starts_on: WeekStartDay,
    ) -> Result<AccountSettings, AccountServiceError> {
        let timezone = timezone.trim();
        if !is_supported_timezone(timezone) {
            return Err(AccountServiceError::UnsupportedTimezone(
                timezone.to_string(),
            ));
        }

        let settings = self
            .repo
            .update_settings(user_uuid, timezone, clock, week_starts_on)?;
        Ok(settings)
    }
}
