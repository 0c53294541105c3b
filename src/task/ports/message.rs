//! Message port consumed from the task queue.

use crate::task::domain::{Message, MessageEncodeError, TaskId};

/// What the task manager needs from a queue message.
pub trait TaskMessage: Send + Sync {
    /// Returns the identifier shared by every delivery of the message.
    fn message_id(&self) -> TaskId;

    /// Returns the name of the actor that processes the message.
    fn actor_name(&self) -> &str;

    /// Returns the name of the queue the message travels through.
    fn queue_name(&self) -> &str;

    /// Encodes the message into the opaque payload stored on the record.
    ///
    /// # Errors
    ///
    /// Returns [`MessageEncodeError`] when the message cannot be serialized.
    fn encode(&self) -> Result<Vec<u8>, MessageEncodeError>;
}

impl TaskMessage for Message {
    fn message_id(&self) -> TaskId {
        Self::message_id(self)
    }

    fn actor_name(&self) -> &str {
        Self::actor_name(self)
    }

    fn queue_name(&self) -> &str {
        Self::queue_name(self)
    }

    fn encode(&self) -> Result<Vec<u8>, MessageEncodeError> {
        Self::encode(self)
    }
}
