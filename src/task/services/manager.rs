//! Task manager: upserts task records from queue messages and purges old
//! ones.

use crate::config::{ExcludedActors, TaskTrackingConfig};
use crate::task::{
    domain::{MessageEncodeError, TaskFields, TaskId, TaskQuery, TaskRecord, TaskUpsert},
    ports::{
        TaskMessage, TaskRecordRepository, TaskRecordRepositoryError, UpsertCapability,
    },
};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// How the manager reconciles concurrent writes, chosen once per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStrategy {
    /// One atomic insert-or-update statement keyed by task identifier.
    OnConflict,
    /// Locked lookup followed by update or insert, retried after a
    /// concurrent first insert.
    UpdateOrCreate,
}

/// Service-level errors for task status tracking.
#[derive(Debug, Error)]
pub enum TaskManagerError {
    /// The repository supports no usable upsert strategy.
    #[error("unsupported task record backend: {0}")]
    UnsupportedBackend(String),

    /// The message could not be encoded for storage.
    #[error(transparent)]
    Encode(#[from] MessageEncodeError),

    /// The retention age cannot be represented as a cutoff time.
    #[error("maximum task age of {0} seconds is out of range")]
    InvalidMaxAge(u64),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRecordRepositoryError),
}

/// Result type for task manager operations.
pub type TaskManagerResult<T> = Result<T, TaskManagerError>;

/// Access layer for task records.
///
/// All writes to the task record store go through this type.
pub struct TaskManager<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    excluded_actors: ExcludedActors,
    strategy: UpsertStrategy,
    upsert_retry_limit: u32,
}

impl<R, C> Clone for TaskManager<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            excluded_actors: self.excluded_actors.clone(),
            strategy: self.strategy,
            upsert_retry_limit: self.upsert_retry_limit,
        }
    }
}

impl<R, C> TaskManager<R, C>
where
    R: TaskRecordRepository,
    C: Clock + Send + Sync,
{
    /// Creates a manager, probing the repository once for its upsert
    /// capability.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::UnsupportedBackend`] when the repository
    /// supports neither strategy, or [`TaskManagerError::Repository`] when
    /// capability detection fails.
    pub async fn new(
        repository: Arc<R>,
        clock: Arc<C>,
        config: &TaskTrackingConfig,
    ) -> TaskManagerResult<Self> {
        let strategy = match repository.upsert_capability().await? {
            UpsertCapability::NativeUpsert => UpsertStrategy::OnConflict,
            UpsertCapability::UpdateOrCreate => UpsertStrategy::UpdateOrCreate,
            UpsertCapability::Unsupported(reason) => {
                return Err(TaskManagerError::UnsupportedBackend(reason));
            }
        };
        info!(
            ?strategy,
            database = config.database_label(),
            excluded_actors = config.excluded_actors().len(),
            "task manager ready"
        );

        Ok(Self {
            repository,
            clock,
            excluded_actors: config.excluded_actors().clone(),
            strategy,
            upsert_retry_limit: config.upsert_retry_limit(),
        })
    }

    /// Returns the upsert strategy selected at construction.
    #[must_use]
    pub const fn strategy(&self) -> UpsertStrategy {
        self.strategy
    }

    /// Returns whether tasks of `actor_name` are excluded from tracking.
    #[must_use]
    pub fn is_excluded(&self, actor_name: &str) -> bool {
        self.excluded_actors.contains(actor_name)
    }

    /// Records a lifecycle event for the message.
    ///
    /// Returns `Ok(None)` without touching storage when the message's actor
    /// is excluded, otherwise the record as stored after the write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError`] when encoding or persistence fails.
    #[instrument(
        skip_all,
        fields(task_id = %message.message_id(), actor_name = message.actor_name())
    )]
    pub async fn upsert_from_message<M>(
        &self,
        message: &M,
        fields: TaskFields,
    ) -> TaskManagerResult<Option<TaskRecord>>
    where
        M: TaskMessage + ?Sized,
    {
        if self.is_excluded(message.actor_name()) {
            debug!("actor excluded from task tracking");
            return Ok(None);
        }

        self.upsert(message, fields).await.map(Some)
    }

    /// Creates or updates the record for the message and returns it.
    ///
    /// Unlike [`Self::upsert_from_message`] this ignores the exclusion set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError`] when encoding or persistence fails.
    #[instrument(
        skip_all,
        fields(task_id = %message.message_id(), actor_name = message.actor_name())
    )]
    pub async fn create_or_update_from_message<M>(
        &self,
        message: &M,
        fields: TaskFields,
    ) -> TaskManagerResult<TaskRecord>
    where
        M: TaskMessage + ?Sized,
    {
        self.upsert(message, fields).await
    }

    /// Deletes every record created at or before `now - max_task_age_secs`,
    /// regardless of status, and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::InvalidMaxAge`] when the age overflows the
    /// clock range, or [`TaskManagerError::Repository`] when deletion fails.
    #[instrument(skip(self))]
    pub async fn delete_old_tasks(&self, max_task_age_secs: u64) -> TaskManagerResult<u64> {
        let max_age = i64::try_from(max_task_age_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or(TaskManagerError::InvalidMaxAge(max_task_age_secs))?;
        let cutoff = self
            .clock
            .utc()
            .checked_sub_signed(max_age)
            .ok_or(TaskManagerError::InvalidMaxAge(max_task_age_secs))?;

        let deleted = self.repository.delete_created_before(cutoff).await?;
        info!(deleted, %cutoff, "deleted old task records");
        Ok(deleted)
    }

    /// Finds a record by task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::Repository`] when the lookup fails.
    pub async fn find_by_id(&self, id: TaskId) -> TaskManagerResult<Option<TaskRecord>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Lists matching records, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::Repository`] when the lookup fails.
    pub async fn list(&self, query: &TaskQuery) -> TaskManagerResult<Vec<TaskRecord>> {
        Ok(self.repository.list(query).await?)
    }

    /// Counts matching records, ignoring pagination.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::Repository`] when the lookup fails.
    pub async fn count(&self, query: &TaskQuery) -> TaskManagerResult<u64> {
        Ok(self.repository.count(query).await?)
    }

    async fn upsert<M>(&self, message: &M, fields: TaskFields) -> TaskManagerResult<TaskRecord>
    where
        M: TaskMessage + ?Sized,
    {
        let upsert = TaskUpsert {
            id: message.message_id(),
            message_data: message.encode()?,
            fields,
            timestamp: self.clock.utc(),
        };
        debug!(strategy = ?self.strategy, status = ?upsert.fields.status(), "upserting task record");

        match self.strategy {
            UpsertStrategy::OnConflict => Ok(self.repository.upsert_on_conflict(upsert).await?),
            UpsertStrategy::UpdateOrCreate => self.update_or_create_with_retry(upsert).await,
        }
    }

    async fn update_or_create_with_retry(
        &self,
        upsert: TaskUpsert,
    ) -> TaskManagerResult<TaskRecord> {
        let mut attempt: u32 = 0;
        loop {
            match self.repository.update_or_create(upsert.clone()).await {
                Err(err) if err.is_retryable() && attempt < self.upsert_retry_limit => {
                    attempt += 1;
                    warn!(attempt, error = %err, "retrying update-or-create after concurrent insert");
                }
                result => return Ok(result?),
            }
        }
    }
}
