//! Flutter bridge for the PushInbox core.

pub mod api;
