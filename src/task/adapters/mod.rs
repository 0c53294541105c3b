//! Adapter implementations of the task record repository port.

pub mod memory;
pub mod postgres;
