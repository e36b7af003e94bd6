//! Channel ingestion.
//!
//! # Responsibility
//! - Model the two delivery channel payload shapes as one tagged union.
//! - Normalize payloads and forward them into the store.
//!
//! # Invariants
//! - Malformed display fields are defaulted, never surfaced as errors.
//! - Ingestion order is arrival order; there is no cross-channel reordering.

pub mod payload;
pub mod router;
pub mod simulate;
