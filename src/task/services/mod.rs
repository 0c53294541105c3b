//! Application services for task status tracking.

mod manager;
mod middleware;

pub use manager::{TaskManager, TaskManagerError, TaskManagerResult, UpsertStrategy};
pub use middleware::{ProcessOutcome, TaskStatusMiddleware};
