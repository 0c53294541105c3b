//! Task status tracking.
//!
//! Records the queue lifecycle of each message (enqueued, delayed, running,
//! failed, done, skipped) as one durable row per task identifier, and purges
//! rows past a retention age. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
