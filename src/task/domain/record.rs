//! Durable task record and its lazily decoded message.

use super::{Message, MessageDecodeError, TaskId, TaskStatus, TaskUpsert};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::OnceLock;

/// Stored lifecycle status of one queue message.
///
/// The decoded [`Message`] is cached per instance: decoding runs at most once,
/// and a decode failure is cached as well.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    id: TaskId,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    message_data: Vec<u8>,
    actor_name: Option<String>,
    queue_name: Option<String>,
    decoded: OnceLock<Result<Message, MessageDecodeError>>,
}

/// Parameter object for reconstructing a persisted task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskRecord {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest write timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted encoded message.
    pub message_data: Vec<u8>,
    /// Persisted actor name, if recorded.
    pub actor_name: Option<String>,
    /// Persisted queue name, if recorded.
    pub queue_name: Option<String>,
}

impl TaskRecord {
    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskRecord) -> Self {
        Self {
            id: data.id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
            message_data: data.message_data,
            actor_name: data.actor_name,
            queue_name: data.queue_name,
            decoded: OnceLock::new(),
        }
    }

    /// Builds the record that an upsert inserts when no row exists yet.
    ///
    /// A missing status falls back to [`TaskStatus::Enqueued`].
    #[must_use]
    pub fn from_upsert(upsert: &TaskUpsert) -> Self {
        Self::from_persisted(PersistedTaskRecord {
            id: upsert.id,
            status: upsert.fields.status().unwrap_or_default(),
            created_at: upsert.timestamp,
            updated_at: upsert.timestamp,
            message_data: upsert.message_data.clone(),
            actor_name: upsert.fields.actor_name().map(str::to_owned),
            queue_name: upsert.fields.queue_name().map(str::to_owned),
        })
    }

    /// Applies an upsert to an existing record.
    ///
    /// Overwrites the payload and `updated_at`, and only those extra fields
    /// the upsert supplies. `created_at` is left untouched.
    pub fn apply_upsert(&mut self, upsert: &TaskUpsert) {
        self.message_data.clone_from(&upsert.message_data);
        self.updated_at = upsert.timestamp;
        if let Some(status) = upsert.fields.status() {
            self.status = status;
        }
        if let Some(actor_name) = upsert.fields.actor_name() {
            self.actor_name = Some(actor_name.to_owned());
        }
        if let Some(queue_name) = upsert.fields.queue_name() {
            self.queue_name = Some(queue_name.to_owned());
        }
        self.decoded = OnceLock::new();
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest write timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the encoded message payload.
    #[must_use]
    pub fn message_data(&self) -> &[u8] {
        &self.message_data
    }

    /// Returns the recorded actor name, if any.
    #[must_use]
    pub fn actor_name(&self) -> Option<&str> {
        self.actor_name.as_deref()
    }

    /// Returns the recorded queue name, if any.
    #[must_use]
    pub fn queue_name(&self) -> Option<&str> {
        self.queue_name.as_deref()
    }

    /// Returns the decoded message, decoding the payload on first access.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDecodeError`] when the stored payload is malformed.
    /// The error is cached; later calls return it without decoding again.
    pub fn message(&self) -> Result<&Message, MessageDecodeError> {
        self.message_with(Message::decode)
    }

    /// Returns the decoded message, running `decode` only if no result has
    /// been cached for this instance yet.
    ///
    /// # Errors
    ///
    /// Returns the cached or freshly produced [`MessageDecodeError`].
    pub fn message_with<F>(&self, decode: F) -> Result<&Message, MessageDecodeError>
    where
        F: FnOnce(&[u8]) -> Result<Message, MessageDecodeError>,
    {
        self.decoded
            .get_or_init(|| decode(&self.message_data))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl PartialEq for TaskRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.status == other.status
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.message_data == other.message_data
            && self.actor_name == other.actor_name
            && self.queue_name == other.queue_name
    }
}

impl Eq for TaskRecord {}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Ok(message) => write!(f, "{message}"),
            Err(_) => write!(f, "<undecodable message {}>", self.id),
        }
    }
}
