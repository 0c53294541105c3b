//! `PostgreSQL` repository implementation for task record storage.

use super::{
    models::{NewTaskRecordRow, TaskRecordChangeset, TaskRecordRow},
    schema::task_records,
};
use crate::task::{
    domain::{PersistedTaskRecord, TaskId, TaskQuery, TaskRecord, TaskStatus, TaskUpsert},
    ports::{
        TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
        UpsertCapability,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// First server version (`server_version_num`) with `INSERT ... ON CONFLICT`.
const NATIVE_UPSERT_MIN_VERSION: i32 = 90_500;

/// `PostgreSQL`-backed task record repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRecordRepository {
    pool: TaskPgPool,
    pinned_capability: Option<UpsertCapability>,
}

impl PostgresTaskRecordRepository {
    /// Creates a repository that detects the server's upsert capability.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self {
            pool,
            pinned_capability: None,
        }
    }

    /// Creates a repository that reports `capability` without probing.
    #[must_use]
    pub const fn with_capability(pool: TaskPgPool, capability: UpsertCapability) -> Self {
        Self {
            pool,
            pinned_capability: Some(capability),
        }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRecordRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRecordRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(TaskRecordRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRecordRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRecordRepository for PostgresTaskRecordRepository {
    async fn upsert_capability(&self) -> TaskRecordRepositoryResult<UpsertCapability> {
        if let Some(capability) = &self.pinned_capability {
            return Ok(capability.clone());
        }

        self.run_blocking(|connection| {
            let version = server_version_num(connection)?;
            debug!(server_version_num = version, "detected PostgreSQL upsert support");
            if version >= NATIVE_UPSERT_MIN_VERSION {
                Ok(UpsertCapability::NativeUpsert)
            } else {
                Ok(UpsertCapability::UpdateOrCreate)
            }
        })
        .await
    }

    async fn upsert_on_conflict(
        &self,
        upsert: TaskUpsert,
    ) -> TaskRecordRepositoryResult<TaskRecord> {
        let new_row = to_new_row(&upsert);
        let changeset = to_changeset(&upsert);

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(task_records::table)
                .values(&new_row)
                .on_conflict(task_records::id)
                .do_update()
                .set(&changeset)
                .returning(TaskRecordRow::as_returning())
                .get_result::<TaskRecordRow>(connection)
                .map_err(TaskRecordRepositoryError::persistence)?;
            row_to_record(row)
        })
        .await
    }

    async fn update_or_create(
        &self,
        upsert: TaskUpsert,
    ) -> TaskRecordRepositoryResult<TaskRecord> {
        let task_id = upsert.id;
        let new_row = to_new_row(&upsert);
        let changeset = to_changeset(&upsert);

        self.run_blocking(move |connection| {
            let row = connection
                .transaction::<TaskRecordRow, DieselError, _>(|conn| {
                    let existing = task_records::table
                        .find(new_row.id)
                        .select(task_records::id)
                        .for_update()
                        .first::<uuid::Uuid>(conn)
                        .optional()?;

                    if existing.is_some() {
                        diesel::update(task_records::table.find(new_row.id))
                            .set(&changeset)
                            .returning(TaskRecordRow::as_returning())
                            .get_result(conn)
                    } else {
                        diesel::insert_into(task_records::table)
                            .values(&new_row)
                            .returning(TaskRecordRow::as_returning())
                            .get_result(conn)
                    }
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRecordRepositoryError::DuplicateInsert(task_id)
                    }
                    _ => TaskRecordRepositoryError::persistence(err),
                })?;
            row_to_record(row)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRecordRepositoryResult<Option<TaskRecord>> {
        self.run_blocking(move |connection| {
            let row = task_records::table
                .find(id.into_inner())
                .select(TaskRecordRow::as_select())
                .first::<TaskRecordRow>(connection)
                .optional()
                .map_err(TaskRecordRepositoryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn list(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<Vec<TaskRecord>> {
        let lookup = query.clone();
        self.run_blocking(move |connection| {
            let mut statement = filtered(&lookup)
                .select(TaskRecordRow::as_select())
                .order((task_records::updated_at.desc(), task_records::id.asc()))
                .offset(i64::from(lookup.offset));
            if let Some(limit) = lookup.limit {
                statement = statement.limit(i64::from(limit));
            }

            let rows = statement
                .load::<TaskRecordRow>(connection)
                .map_err(TaskRecordRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }

    async fn count(&self, query: &TaskQuery) -> TaskRecordRepositoryResult<u64> {
        let lookup = query.clone();
        self.run_blocking(move |connection| {
            let count = filtered(&lookup)
                .count()
                .get_result::<i64>(connection)
                .map_err(TaskRecordRepositoryError::persistence)?;
            u64::try_from(count).map_err(TaskRecordRepositoryError::persistence)
        })
        .await
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> TaskRecordRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let deleted =
                diesel::delete(task_records::table.filter(task_records::created_at.le(cutoff)))
                    .execute(connection)
                    .map_err(TaskRecordRepositoryError::persistence)?;
            u64::try_from(deleted).map_err(TaskRecordRepositoryError::persistence)
        })
        .await
    }
}

fn to_new_row(upsert: &TaskUpsert) -> NewTaskRecordRow {
    NewTaskRecordRow {
        id: upsert.id.into_inner(),
        status: upsert
            .fields
            .status()
            .unwrap_or_default()
            .as_str()
            .to_owned(),
        created_at: upsert.timestamp,
        updated_at: upsert.timestamp,
        message_data: upsert.message_data.clone(),
        actor_name: upsert.fields.actor_name().map(str::to_owned),
        queue_name: upsert.fields.queue_name().map(str::to_owned),
    }
}

fn to_changeset(upsert: &TaskUpsert) -> TaskRecordChangeset {
    TaskRecordChangeset {
        message_data: upsert.message_data.clone(),
        updated_at: upsert.timestamp,
        status: upsert.fields.status().map(|status| status.as_str().to_owned()),
        actor_name: upsert.fields.actor_name().map(str::to_owned),
        queue_name: upsert.fields.queue_name().map(str::to_owned),
    }
}

fn row_to_record(row: TaskRecordRow) -> TaskRecordRepositoryResult<TaskRecord> {
    let TaskRecordRow {
        id,
        status: persisted_status,
        created_at,
        updated_at,
        message_data,
        actor_name,
        queue_name,
    } = row;

    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRecordRepositoryError::persistence)?;

    Ok(TaskRecord::from_persisted(PersistedTaskRecord {
        id: TaskId::from_uuid(id),
        status,
        created_at,
        updated_at,
        message_data,
        actor_name,
        queue_name,
    }))
}

fn filtered(query: &TaskQuery) -> task_records::BoxedQuery<'static, Pg> {
    let mut statement = task_records::table.into_boxed();
    if let Some(status) = query.status {
        statement = statement.filter(task_records::status.eq(status.as_str()));
    }
    if let Some(actor_name) = query.actor_name.clone() {
        statement = statement.filter(task_records::actor_name.eq(actor_name));
    }
    if let Some(queue_name) = query.queue_name.clone() {
        statement = statement.filter(task_records::queue_name.eq(queue_name));
    }
    if let Some(after) = query.updated_after {
        statement = statement.filter(task_records::updated_at.ge(after));
    }
    if let Some(before) = query.updated_before {
        statement = statement.filter(task_records::updated_at.lt(before));
    }
    statement
}

fn server_version_num(connection: &mut PgConnection) -> TaskRecordRepositoryResult<i32> {
    #[derive(QueryableByName)]
    struct ServerVersionRow {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        server_version_num: i32,
    }

    diesel::sql_query(
        "SELECT current_setting('server_version_num')::INTEGER AS server_version_num",
    )
    .get_result::<ServerVersionRow>(connection)
    .map(|row| row.server_version_num)
    .map_err(TaskRecordRepositoryError::persistence)
}
