//! Lifecycle status recorded for each tracked task.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The message has been put on its queue.
    #[default]
    Enqueued,
    /// The message has been enqueued with a delay.
    Delayed,
    /// A worker is processing the message.
    Running,
    /// Processing raised an error.
    Failed,
    /// Processing completed successfully.
    Done,
    /// A middleware skipped the message.
    Skipped,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Enqueued,
        Self::Delayed,
        Self::Running,
        Self::Failed,
        Self::Done,
        Self::Skipped,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::Delayed => "delayed",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }

    /// Returns the human-readable label shown in listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Enqueued => "Enqueued",
            Self::Delayed => "Delayed",
            Self::Running => "Running",
            Self::Failed => "Failed",
            Self::Done => "Done",
            Self::Skipped => "Skipped",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "enqueued" => Ok(Self::Enqueued),
            "delayed" => Ok(Self::Delayed),
            "running" => Ok(Self::Running),
            "failed" => Ok(Self::Failed),
            "done" => Ok(Self::Done),
            "skipped" => Ok(Self::Skipped),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
