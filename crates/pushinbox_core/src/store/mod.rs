//! Bounded, ordered notification store.
//!
//! # Responsibility
//! - Own the newest-first notification sequence.
//! - Enforce the retention cap and the derived badge count.
//! - Publish read-only snapshots to observers after every mutation.
//!
//! # Invariants
//! - Length never exceeds the configured retention cap.
//! - `badge_count` equals the number of unread records after every call.
//! - Ids are unique within the sequence.

pub mod notification_store;
