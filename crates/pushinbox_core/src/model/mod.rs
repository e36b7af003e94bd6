//! Normalized notification model shared by ingestion, store and persistence.
//!
//! # Responsibility
//! - Define the single record shape every delivery channel is reduced to.
//! - Own the default-substitution rules applied during normalization.
//!
//! # Invariants
//! - `title`, `body` and `data` are immutable once a record is created.
//! - `read` is the only mutable field and starts as `false`.

pub mod notification;
