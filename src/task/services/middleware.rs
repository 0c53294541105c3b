//! Queue lifecycle hooks that record task status through the manager.

use super::manager::{TaskManager, TaskManagerResult};
use crate::task::{
    domain::{TaskFields, TaskRecord, TaskStatus},
    ports::{TaskMessage, TaskRecordRepository},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Result of running a message through its actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The actor returned normally.
    Succeeded,
    /// The actor raised an error.
    Failed,
}

/// Broker middleware translating lifecycle hooks into status writes.
///
/// Every hook honours the manager's actor exclusions and returns `None` for
/// excluded actors.
pub struct TaskStatusMiddleware<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    manager: Arc<TaskManager<R, C>>,
}

impl<R, C> TaskStatusMiddleware<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    /// Creates middleware writing through `manager`.
    #[must_use]
    pub const fn new(manager: Arc<TaskManager<R, C>>) -> Self {
        Self { manager }
    }

    /// Returns the wrapped manager.
    #[must_use]
    pub fn manager(&self) -> &TaskManager<R, C> {
        &self.manager
    }

    /// Records a freshly enqueued message; a non-zero `delay` marks it
    /// delayed.
    ///
    /// # Errors
    ///
    /// Propagates manager failures.
    pub async fn after_enqueue<M>(
        &self,
        message: &M,
        delay: Option<Duration>,
    ) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        let status = if delay.is_some_and(|delay| !delay.is_zero()) {
            TaskStatus::Delayed
        } else {
            TaskStatus::Enqueued
        };
        self.record(message, status).await
    }

    /// Records that a worker picked the message up.
    ///
    /// # Errors
    ///
    /// Propagates manager failures.
    pub async fn before_process_message<M>(
        &self,
        message: &M,
    ) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        self.record(message, TaskStatus::Running).await
    }

    /// Records that a middleware skipped the message.
    ///
    /// # Errors
    ///
    /// Propagates manager failures.
    pub async fn after_skip_message<M>(&self, message: &M) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        self.record(message, TaskStatus::Skipped).await
    }

    /// Records the outcome of processing the message.
    ///
    /// # Errors
    ///
    /// Propagates manager failures.
    pub async fn after_process_message<M>(
        &self,
        message: &M,
        outcome: ProcessOutcome,
    ) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        let status = match outcome {
            ProcessOutcome::Succeeded => TaskStatus::Done,
            ProcessOutcome::Failed => TaskStatus::Failed,
        };
        self.record(message, status).await
    }

    async fn record<M>(&self, message: &M, status: TaskStatus) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        let fields = TaskFields::with_status_only(status)
            .with_actor_name(message.actor_name())
            .with_queue_name(message.queue_name());
        self.manager.upsert_from_message(message, fields).await
    }
}
