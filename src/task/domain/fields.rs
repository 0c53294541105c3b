//! Field sets merged into task records on each lifecycle write.

use super::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};

/// Extra fields supplied alongside the message payload on an upsert.
///
/// Only fields that are set are written when an existing record is updated;
/// unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    status: Option<TaskStatus>,
    actor_name: Option<String>,
    queue_name: Option<String>,
}

impl TaskFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a field set carrying only a status.
    #[must_use]
    pub const fn with_status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            actor_name: None,
            queue_name: None,
        }
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the actor name.
    #[must_use]
    pub fn with_actor_name(mut self, actor_name: impl Into<String>) -> Self {
        self.actor_name = Some(actor_name.into());
        self
    }

    /// Sets the queue name.
    #[must_use]
    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    /// Returns the supplied status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the supplied actor name, if any.
    #[must_use]
    pub fn actor_name(&self) -> Option<&str> {
        self.actor_name.as_deref()
    }

    /// Returns the supplied queue name, if any.
    #[must_use]
    pub fn queue_name(&self) -> Option<&str> {
        self.queue_name.as_deref()
    }
}

/// Parameter object describing one insert-or-update of a task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpsert {
    /// Identifier used as the conflict target.
    pub id: TaskId,
    /// Encoded message payload, always overwritten.
    pub message_data: Vec<u8>,
    /// Extra fields merged into the record.
    pub fields: TaskFields,
    /// Write time; becomes `created_at` on insert and `updated_at` always.
    pub timestamp: DateTime<Utc>,
}
