//! In-memory repository for task status tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{TaskId, TaskQuery, TaskRecord, TaskUpsert, listing_order},
    ports::{
        TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
        UpsertCapability,
    },
};

/// Thread-safe in-memory task record repository.
///
/// Both upsert strategies run under one write lock, so either is atomic.
/// The advertised capability is configurable to exercise each strategy.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRecordRepository {
    records: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
    capability: UpsertCapability,
}

impl InMemoryTaskRecordRepository {
    /// Creates an empty repository advertising native upsert support.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capability(UpsertCapability::NativeUpsert)
    }

    /// Creates an empty repository advertising the given capability.
    #[must_use]
    pub fn with_capability(capability: UpsertCapability) -> Self {
        Self {
            records: Arc::default(),
            capability,
        }
    }

    fn read(&self) -> TaskRecordRepositoryResult<RwLockReadGuard<'_, HashMap<TaskId, TaskRecord>>> {
        self.records.read().map_err(|err| {
            TaskRecordRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> TaskRecordRepositoryResult<RwLockWriteGuard<'_, HashMap<TaskId, TaskRecord>>> {
        self.records.write().map_err(|err| {
            TaskRecordRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn upsert(&self, upsert: &TaskUpsert) -> TaskRecordRepositoryResult<TaskRecord> {
        let mut records = self.write()?;
        let record = records
            .entry(upsert.id)
            .and_modify(|existing| existing.apply_upsert(upsert))
            .or_insert_with(|| TaskRecord::from_upsert(upsert));
        Ok(record.clone())
    }
}

impl Default for InMemoryTaskRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRecordRepository for InMemoryTaskRecordRepository {
    async fn upsert_capability(&self) -> TaskRecordRepositoryResult<UpsertCapability> {
        Ok(self.capability.clone())
    }

    async fn upsert_on_conflict(
        &self,
        upsert: TaskUpsert,
    ) -> TaskRecordRepositoryResult<TaskRecord> {
        self.upsert(&upsert)
    }

    async fn update_or_create(
        &self,
        upsert: TaskUpsert,
    ) -> TaskRecordRepositoryResult<TaskRecord> {
        self.upsert(&upsert)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRecordRepositoryResult<Option<TaskRecord>> {
        let records = self.read()?;
        Ok(records.get(&id).cloned())
    }

    async fn list(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<Vec<TaskRecord>> {
        let records = self.read()?;
        let mut matching = records
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by(listing_order);

        let skip = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(matching.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<u64> {
        let records = self.read()?;
        let count = records.values().filter(|record| query.matches(record)).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> TaskRecordRepositoryResult<u64> {
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, record| record.created_at() > cutoff);
        let removed = before.saturating_sub(records.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
