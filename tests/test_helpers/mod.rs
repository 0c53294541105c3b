//! Shared helpers for integration tests.

#[path = "../../src/task/tests/support.rs"]
mod support;

pub use support::{StepClock, epoch};
