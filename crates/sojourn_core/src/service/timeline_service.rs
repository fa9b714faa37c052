//! Timeline read-side service.
//!
//! # Responsibility
//! - Serve filtered event listings and the day-grouped activity feed.
//!
//! # Invariants
//! - Feed buckets are ordered newest day first; events inside a bucket
//!   keep their `created_at DESC, uuid ASC` order.
//! - The service only reads; events are appended by goal mutations.

use crate::model::timeline::TimelineEvent;
use crate::model::user::UserId;
use crate::repo::timeline_repo::{TimelineListQuery, TimelineRepository};
use crate::repo::RepoResult;
use crate::timeutil::epoch_day_from_ms;

/// One day of activity in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDay {
    /// Epoch day the bucket covers.
    pub day: i64,
    /// Events of that day, newest first.
    pub events: Vec<TimelineEvent>,
}

/// Timeline service facade over repository implementations.
pub struct TimelineService<R: TimelineRepository> {
    repo: R,
}

impl<R: TimelineRepository> TimelineService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists events newest first using filter and pagination options.
    pub fn list_events(
        &self,
        user_uuid: UserId,
        query: &TimelineListQuery,
    ) -> RepoResult<Vec<TimelineEvent>> {
        self.repo.list_events(user_uuid, query)
    }

    /// Builds the activity feed: recent events grouped by day.
    pub fn activity_feed(
        &self,
        user_uuid: UserId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<ActivityDay>> {
        let query = TimelineListQuery {
            limit,
            ..TimelineListQuery::default()
        };
        let events = self.repo.list_events(user_uuid, &query)?;
        Ok(group_by_day(events))
    }
}

/// Groups a newest-first event list into day buckets.
///
/// Events arrive sorted by `created_at DESC`, so same-day entries are
/// contiguous and one pass suffices.
pub fn group_by_day(events: Vec<TimelineEvent>) -> Vec<ActivityDay> {
    let mut days: Vec<ActivityDay> = Vec::new();
    for event in events {
        let day = epoch_day_from_ms(event.created_at);
        match days.last_mut() {
            Some(bucket) if bucket.day == day => bucket.events.push(event),
            _ => days.push(ActivityDay {
                day,
                events: vec![event],
            }),
        }
    }
    days
}
