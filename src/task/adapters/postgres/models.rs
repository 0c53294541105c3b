//! Diesel row models for task record persistence.

use super::schema::task_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRecordRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
    /// Encoded message payload.
    pub message_data: Vec<u8>,
    /// Actor name.
    pub actor_name: Option<String>,
    /// Queue name.
    pub queue_name: Option<String>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_records)]
pub struct NewTaskRecordRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
    /// Encoded message payload.
    pub message_data: Vec<u8>,
    /// Actor name.
    pub actor_name: Option<String>,
    /// Queue name.
    pub queue_name: Option<String>,
}

/// Update set applied to an existing row.
///
/// `None` fields are left out of the `SET` clause, so only supplied fields
/// overwrite stored values.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = task_records)]
pub struct TaskRecordChangeset {
    /// Encoded message payload.
    pub message_data: Vec<u8>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
    /// Lifecycle status, when supplied.
    pub status: Option<String>,
    /// Actor name, when supplied.
    pub actor_name: Option<String>,
    /// Queue name, when supplied.
    pub queue_name: Option<String>,
}
