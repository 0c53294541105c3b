//! Shared world state for task tracking BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use crate::test_helpers::{StepClock, epoch};
use rstest::fixture;
use tasktrail::config::TaskTrackingConfig;
use tasktrail::task::{
    adapters::memory::InMemoryTaskRecordRepository,
    domain::{Message, TaskRecord},
    services::{TaskManager, TaskStatusMiddleware},
};

/// Middleware type used by the BDD world.
pub type TestMiddleware = TaskStatusMiddleware<InMemoryTaskRecordRepository, StepClock>;

/// Scenario world for task tracking behaviour tests.
pub struct TrackingWorld {
    pub clock: Arc<StepClock>,
    pub middleware: Option<TestMiddleware>,
    pub messages: HashMap<String, Message>,
    pub last_deleted: Option<u64>,
}

impl TrackingWorld {
    /// Creates a world with no middleware configured yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(StepClock::at(epoch())),
            middleware: None,
            messages: HashMap::new(),
            last_deleted: None,
        }
    }

    /// Builds the middleware over a fresh in-memory repository.
    pub fn configure(&mut self, config: &TaskTrackingConfig) -> Result<(), eyre::Report> {
        let manager = run_async(TaskManager::new(
            Arc::new(InMemoryTaskRecordRepository::new()),
            Arc::clone(&self.clock),
            config,
        ))
        .map_err(|err| eyre::eyre!("task manager construction failed: {err}"))?;
        self.middleware = Some(TaskStatusMiddleware::new(Arc::new(manager)));
        Ok(())
    }

    /// Returns the configured middleware.
    pub fn middleware(&self) -> Result<&TestMiddleware, eyre::Report> {
        self.middleware
            .as_ref()
            .ok_or_else(|| eyre::eyre!("task tracking has not been configured"))
    }

    /// Returns the message sent for `actor_name`, creating it on first use.
    pub fn message_for(&mut self, actor_name: &str) -> Message {
        let clock = Arc::clone(&self.clock);
        self.messages
            .entry(actor_name.to_owned())
            .or_insert_with(|| Message::new("default", actor_name, &*clock))
            .clone()
    }

    /// Returns a previously sent message for `actor_name`.
    pub fn sent_message(&self, actor_name: &str) -> Result<&Message, eyre::Report> {
        self.messages
            .get(actor_name)
            .ok_or_else(|| eyre::eyre!("no message was sent for actor {actor_name}"))
    }

    /// Looks up the stored record for a previously sent message.
    pub fn record_for(&self, actor_name: &str) -> Result<Option<TaskRecord>, eyre::Report> {
        let id = self.sent_message(actor_name)?.message_id();
        run_async(self.middleware()?.manager().find_by_id(id))
            .map_err(|err| eyre::eyre!("task lookup failed: {err}"))
    }
}

impl Default for TrackingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TrackingWorld {
    TrackingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
