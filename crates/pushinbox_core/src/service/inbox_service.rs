//! Inbox use-case service.
//!
//! # Responsibility
//! - Own the single `NotificationStore` and inject it into the router.
//! - Attach delivery channels at startup and detach them at shutdown.
//! - Track the latest-message banner shown after each ingestion.
//!
//! # Invariants
//! - Presentation mutations go through store operations only.
//! - The banner never points at a record the store no longer holds.

use crate::config::{ConfigError, StoreConfig};
use crate::ingest::payload::{ChannelPayload, EventMessage, ForegroundMessage};
use crate::ingest::router::{Ingested, IngestionRouter};
use crate::ingest::simulate::SimulationPreset;
use crate::model::notification::{Clock, NotificationId, NotificationRecord, SystemClock};
use crate::persist::gateway::PersistenceGateway;
use crate::persist::save_queue::ErrorReporter;
use crate::store::notification_store::{
    ListenerId, NotificationStore, StoreListener, StoreSnapshot,
};
use log::info;

/// Presentation-facing inbox facade.
pub struct InboxService {
    store: NotificationStore,
    router: IngestionRouter,
    clock: Box<dyn Clock>,
    latest: Option<NotificationId>,
}

impl InboxService {
    /// Restores the store from `gateway` and attaches both channels.
    pub fn start(
        gateway: Box<dyn PersistenceGateway>,
        config: StoreConfig,
        reporter: Option<ErrorReporter>,
    ) -> Result<Self, ConfigError> {
        Self::start_with_clocks(
            gateway,
            config,
            reporter,
            Box::new(SystemClock),
            Box::new(SystemClock),
        )
    }

    /// Same as `start`, with injected time sources for ingestion and
    /// simulation.
    pub fn start_with_clocks(
        gateway: Box<dyn PersistenceGateway>,
        config: StoreConfig,
        reporter: Option<ErrorReporter>,
        ingest_clock: Box<dyn Clock>,
        simulation_clock: Box<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = NotificationStore::open(gateway, &config, reporter);
        let mut router = IngestionRouter::with_clock(&config, ingest_clock);
        router.seed_from(&store);
        router.attach_all();

        info!(
            "event=inbox_start module=service status=ok len={} badge={}",
            store.len(),
            store.badge_count()
        );

        Ok(Self {
            store,
            router,
            clock: simulation_clock,
            latest: None,
        })
    }

    /// Delivers a channel A message.
    pub fn on_event_message(&mut self, message: EventMessage) -> Option<Ingested> {
        self.deliver(ChannelPayload::Event(message))
    }

    /// Delivers a channel B message.
    pub fn on_foreground_message(&mut self, message: ForegroundMessage) -> Option<Ingested> {
        self.deliver(ChannelPayload::Foreground(message))
    }

    /// Routes a tagged payload; `None` when its channel is detached.
    pub fn deliver(&mut self, payload: ChannelPayload) -> Option<Ingested> {
        let ingested = self.router.route(&mut self.store, payload)?;
        self.latest = Some(ingested.record.id().to_string());
        Some(ingested)
    }

    /// Ingests a simulated backend notification, bypassing attachment.
    pub fn simulate(&mut self, preset: SimulationPreset) -> Ingested {
        let payload = preset.payload(self.clock.now());
        let ingested = self.router.ingest(&mut self.store, payload);
        self.latest = Some(ingested.record.id().to_string());
        ingested
    }

    /// Record currently shown in the latest-message banner.
    pub fn latest(&self) -> Option<&NotificationRecord> {
        self.latest.as_deref().and_then(|id| self.store.get(id))
    }

    /// Closes the banner, marking its record read.
    ///
    /// Returns the dismissed record id, if a banner was shown.
    pub fn dismiss_latest(&mut self) -> Option<NotificationId> {
        let id = self.latest.take()?;
        self.store.mark_read(&id);
        Some(id)
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        self.store.mark_read(id)
    }

    pub fn mark_all_read(&mut self) {
        self.store.mark_all_read();
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let found = self.store.delete(id);
        self.sync_banner();
        found
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.latest = None;
    }

    pub fn badge_count(&self) -> usize {
        self.store.badge_count()
    }

    pub fn records(&self) -> &[NotificationRecord] {
        self.store.records()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn subscribe(&mut self, listener: StoreListener) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Detaches both channels and waits for queued saves.
    pub fn shutdown(&mut self) {
        self.router.detach_all();
        let flushed = self.store.flush_saves();
        info!(
            "event=inbox_shutdown module=service status=ok flushed={} len={}",
            flushed,
            self.store.len()
        );
    }

    fn sync_banner(&mut self) {
        if let Some(id) = &self.latest {
            if !self.store.contains(id) {
                self.latest = None;
            }
        }
    }
}
