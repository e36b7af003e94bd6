//! Core domain logic for PushInbox.
//! This crate owns notification ingestion, the bounded inbox store and its
//! persistence contract.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod persist;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig, MAX_RETAINED};
pub use ingest::payload::{
    Channel, ChannelPayload, EventMessage, ForegroundMessage, ForegroundNotification,
    PayloadError,
};
pub use ingest::router::{AlertNotice, IdSequencer, Ingested, IngestionRouter};
pub use ingest::simulate::SimulationPreset;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::notification::{
    format_timestamp, normalize, Clock, IngestionStamp, NotificationData, NotificationDefaults,
    NotificationId, NotificationKind, NotificationRecord, RawNotification, SystemClock,
    DEFAULT_BODY, DEFAULT_TITLE,
};
pub use persist::gateway::{PersistResult, PersistenceError, PersistenceGateway};
pub use persist::memory::MemoryGateway;
pub use persist::save_queue::{ErrorReporter, SaveQueue};
pub use persist::sqlite::SqliteGateway;
pub use service::inbox_service::InboxService;
pub use store::notification_store::{ListenerId, NotificationStore, StoreListener, StoreSnapshot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
