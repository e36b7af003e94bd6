//! Snapshot persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the load/save contract the store depends on.
//! - Provide in-memory and SQLite gateways.
//! - Run saves off the mutation path through a background queue.
//!
//! # Invariants
//! - A save always writes a full snapshot, never a delta.
//! - Persistence failures never roll back in-memory state.

pub mod gateway;
pub mod memory;
pub mod save_queue;
pub mod sqlite;
