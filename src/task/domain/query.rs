//! Listing filters for task records.

use super::{TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Filter and pagination options for listing task records.
///
/// Results are ordered most-recently-updated first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Only records with this status.
    pub status: Option<TaskStatus>,
    /// Only records sent to this actor.
    pub actor_name: Option<String>,
    /// Only records sent through this queue.
    pub queue_name: Option<String>,
    /// Only records updated at or after this instant.
    pub updated_after: Option<DateTime<Utc>>,
    /// Only records updated strictly before this instant.
    pub updated_before: Option<DateTime<Utc>>,
    /// Maximum number of records returned.
    pub limit: Option<u32>,
    /// Number of matching records skipped.
    pub offset: u32,
}

impl TaskQuery {
    /// Creates a query matching every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the query to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the query to one actor.
    #[must_use]
    pub fn with_actor_name(mut self, actor_name: impl Into<String>) -> Self {
        self.actor_name = Some(actor_name.into());
        self
    }

    /// Restricts the query to one queue.
    #[must_use]
    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    /// Restricts the query to records updated within `[after, before)`.
    #[must_use]
    pub const fn updated_between(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.updated_after = after;
        self.updated_before = before;
        self
    }

    /// Sets the page window.
    #[must_use]
    pub const fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Returns whether a record satisfies every filter, ignoring pagination.
    #[must_use]
    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.status.is_none_or(|status| record.status() == status)
            && self
                .actor_name
                .as_deref()
                .is_none_or(|actor| record.actor_name() == Some(actor))
            && self
                .queue_name
                .as_deref()
                .is_none_or(|queue| record.queue_name() == Some(queue))
            && self
                .updated_after
                .is_none_or(|after| record.updated_at() >= after)
            && self
                .updated_before
                .is_none_or(|before| record.updated_at() < before)
    }
}

/// Listing order: newest `updated_at` first, ties broken by identifier.
#[must_use]
pub fn listing_order(left: &TaskRecord, right: &TaskRecord) -> Ordering {
    right
        .updated_at()
        .cmp(&left.updated_at())
        .then_with(|| left.id().cmp(&right.id()))
}
