//! Repository port for task record persistence and retention.

use crate::task::domain::{TaskId, TaskQuery, TaskRecord, TaskUpsert};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task record repository operations.
pub type TaskRecordRepositoryResult<T> = Result<T, TaskRecordRepositoryError>;

/// How a backend can reconcile concurrent writes to the same task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertCapability {
    /// The store supports a single atomic insert-with-conflict-resolution.
    NativeUpsert,
    /// The store only supports a locked read followed by insert or update.
    UpdateOrCreate,
    /// Neither strategy is available; the reason is reported at startup.
    Unsupported(String),
}

/// Task record persistence contract.
#[async_trait]
pub trait TaskRecordRepository: Send + Sync {
    /// Reports which upsert strategy the backend supports.
    ///
    /// Callers ask once and cache the answer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::Persistence`] when the backend
    /// cannot be queried.
    async fn upsert_capability(&self) -> TaskRecordRepositoryResult<UpsertCapability>;

    /// Inserts the record or, on an identifier conflict, overwrites the
    /// payload, `updated_at` and supplied fields in one atomic statement.
    ///
    /// Returns the row as stored after the statement.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::Persistence`] on storage failure.
    async fn upsert_on_conflict(&self, upsert: TaskUpsert)
    -> TaskRecordRepositoryResult<TaskRecord>;

    /// Updates the existing record under a row lock, or inserts it when
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::DuplicateInsert`] when a
    /// concurrent writer inserted the same identifier first. The caller may
    /// retry.
    async fn update_or_create(&self, upsert: TaskUpsert)
    -> TaskRecordRepositoryResult<TaskRecord>;

    /// Finds a record by identifier.
    ///
    /// Returns `None` when the record does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRecordRepositoryResult<Option<TaskRecord>>;

    /// Returns the matching records, most recently updated first.
    async fn list(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<Vec<TaskRecord>>;

    /// Counts the matching records, ignoring pagination.
    async fn count(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<u64>;

    /// Deletes every record created at or before `cutoff` and returns how
    /// many were removed.
    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> TaskRecordRepositoryResult<u64>;
}

/// Errors returned by task record repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRecordRepositoryError {
    /// A concurrent writer created the record between lookup and insert.
    #[error("task record {0} was inserted concurrently")]
    DuplicateInsert(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRecordRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether repeating the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateInsert(_))
    }
}
