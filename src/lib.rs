//! Tasktrail: durable lifecycle tracking for task-queue messages.
//!
//! Every message dispatched through the queue gets one row recording its
//! current status (enqueued, delayed, running, failed, done, skipped), kept
//! up to date by broker middleware and purged by a retention job.
//!
//! # Architecture
//!
//! Tasktrail follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, in-memory)
//!
//! # Modules
//!
//! - [`config`]: Environment-driven tracking settings
//! - [`task`]: Task records, the task manager, and status middleware

pub mod config;
pub mod task;
