//! Queue message as carried through the broker and stored on task records.

use super::{MessageDecodeError, MessageEncodeError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Option key holding the delivery time of a delayed message.
const ETA_OPTION: &str = "eta";

/// A unit of work dispatched to an actor through a named queue.
///
/// The JSON form produced by [`Message::encode`] is what task records store
/// in `message_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    queue_name: String,
    actor_name: String,
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default)]
    kwargs: Map<String, Value>,
    #[serde(default)]
    options: Map<String, Value>,
    message_id: TaskId,
    message_timestamp: i64,
}

impl Message {
    /// Creates a message with a fresh identifier stamped with the clock time.
    #[must_use]
    pub fn new(
        queue_name: impl Into<String>,
        actor_name: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            queue_name: queue_name.into(),
            actor_name: actor_name.into(),
            args: Vec::new(),
            kwargs: Map::new(),
            options: Map::new(),
            message_id: TaskId::new(),
            message_timestamp: clock.utc().timestamp_millis(),
        }
    }

    /// Replaces the message identifier, e.g. when re-creating a redelivery.
    #[must_use]
    pub const fn with_message_id(mut self, message_id: TaskId) -> Self {
        self.message_id = message_id;
        self
    }

    /// Sets positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Adds a keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Adds a broker option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Records the time at which a delayed message becomes deliverable.
    #[must_use]
    pub fn with_eta(self, eta: DateTime<Utc>) -> Self {
        self.with_option(ETA_OPTION, Value::from(eta.timestamp_millis()))
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn message_id(&self) -> TaskId {
        self.message_id
    }

    /// Returns the name of the queue the message was sent to.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Returns the name of the actor that processes the message.
    #[must_use]
    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    /// Returns positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns keyword arguments.
    #[must_use]
    pub const fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    /// Returns broker options.
    #[must_use]
    pub const fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Returns the creation time in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn message_timestamp(&self) -> i64 {
        self.message_timestamp
    }

    /// Returns the delivery time of a delayed message, if one was set.
    #[must_use]
    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.options
            .get(ETA_OPTION)
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Encodes the message into its stored byte form.
    ///
    /// # Errors
    ///
    /// Returns [`MessageEncodeError`] when serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, MessageEncodeError> {
        serde_json::to_vec(self).map_err(MessageEncodeError::new)
    }

    /// Reconstructs a message from its stored byte form.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDecodeError`] when the payload is not a valid
    /// encoded message.
    pub fn decode(data: &[u8]) -> Result<Self, MessageDecodeError> {
        serde_json::from_slice(data).map_err(MessageDecodeError::new)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .args
            .iter()
            .map(ToString::to_string)
            .chain(
                self.kwargs
                    .iter()
                    .map(|(key, value)| format!("{key}={value}")),
            )
            .collect::<Vec<_>>();
        write!(f, "{}({})", self.actor_name, params.join(", "))
    }
}
