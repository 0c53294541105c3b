//! Error types for task record parsing and message coding.

use std::sync::Arc;
use thiserror::Error;

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned when a stored payload cannot be decoded into a message.
///
/// The wrapped source is shared so cached decode results stay cloneable.
#[derive(Debug, Clone, Error)]
#[error("failed to decode task message: {0}")]
pub struct MessageDecodeError(Arc<dyn std::error::Error + Send + Sync>);

impl MessageDecodeError {
    /// Wraps the underlying decoder failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Error returned when a message cannot be encoded for storage.
#[derive(Debug, Error)]
#[error("failed to encode task message: {0}")]
pub struct MessageEncodeError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl MessageEncodeError {
    /// Wraps the underlying encoder failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }
}
