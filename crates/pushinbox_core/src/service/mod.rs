//! Use-case services.
//!
//! # Responsibility
//! - Wire one store and one router into a presentation-facing facade.
//! - Keep FFI/CLI layers decoupled from store and ingestion details.

pub mod inbox_service;
