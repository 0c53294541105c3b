//! Port contracts for task status tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod message;
pub mod repository;

pub use message::TaskMessage;
pub use repository::{
    TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
    UpsertCapability,
};
