//! Ingestion router.
//!
//! # Responsibility
//! - Track which delivery channels are attached.
//! - Stamp unique, monotonic ids and normalize payloads.
//! - Insert normalized records into the injected store.
//!
//! # Invariants
//! - Issued ids strictly increase, even within one millisecond.
//! - Payloads from detached channels never reach the store.

use crate::config::StoreConfig;
use crate::ingest::payload::{Channel, ChannelPayload};
use crate::model::notification::{
    normalize, Clock, IngestionStamp, NotificationDefaults, NotificationRecord, SystemClock,
};
use crate::store::notification_store::NotificationStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Issues ids derived from ingestion time.
#[derive(Debug, Clone)]
pub struct IdSequencer {
    last_issued: i64,
}

impl Default for IdSequencer {
    fn default() -> Self {
        Self {
            last_issued: i64::MIN,
        }
    }
}

impl IdSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stamp for `at`, bumping the id past the last issued one.
    ///
    /// Once the id space is exhausted (an observed id at `i64::MAX`), the
    /// sequence restarts from `at`.
    pub fn next(&mut self, at: DateTime<Utc>) -> IngestionStamp {
        let now = at.timestamp_millis();
        let millis = match self.last_issued.checked_add(1) {
            Some(floor) => now.max(floor),
            None => {
                warn!("event=id_sequence module=ingest status=reseeded reason=exhausted");
                now
            }
        };
        self.last_issued = millis;
        IngestionStamp::new(millis.to_string(), at)
    }

    /// Records an existing id so later stamps never collide with it.
    ///
    /// Non-numeric ids are ignored.
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last_issued = self.last_issued.max(value);
        }
    }
}

/// Alert-style notice the presentation layer shows for channel A events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertNotice {
    pub title: String,
    pub body: String,
}

/// Result of one successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    /// Copy of the record as inserted.
    pub record: NotificationRecord,
    /// Present only for channel A deliveries.
    pub alert: Option<AlertNotice>,
}

/// Routes channel payloads into a `NotificationStore`.
pub struct IngestionRouter {
    clock: Box<dyn Clock>,
    sequencer: IdSequencer,
    defaults: NotificationDefaults,
    attached: BTreeSet<Channel>,
}

impl IngestionRouter {
    /// Creates a router using wall-clock time. No channel is attached.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: &StoreConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            sequencer: IdSequencer::new(),
            defaults: config.defaults(),
            attached: BTreeSet::new(),
        }
    }

    /// Advances the id sequencer past every id already held by `store`.
    pub fn seed_from(&mut self, store: &NotificationStore) {
        for record in store.records() {
            self.sequencer.observe(record.id());
        }
    }

    /// Starts accepting payloads from `channel`.
    pub fn attach(&mut self, channel: Channel) {
        if self.attached.insert(channel) {
            debug!(
                "event=channel_attach module=ingest channel={} status=ok",
                channel.as_str()
            );
        }
    }

    /// Stops accepting payloads from `channel`.
    pub fn detach(&mut self, channel: Channel) {
        if self.attached.remove(&channel) {
            debug!(
                "event=channel_detach module=ingest channel={} status=ok",
                channel.as_str()
            );
        }
    }

    pub fn attach_all(&mut self) {
        for channel in Channel::ALL {
            self.attach(channel);
        }
    }

    pub fn detach_all(&mut self) {
        for channel in Channel::ALL {
            self.detach(channel);
        }
    }

    pub fn is_attached(&self, channel: Channel) -> bool {
        self.attached.contains(&channel)
    }

    /// Normalizes `payload` into a fresh unread record.
    pub fn normalize(&mut self, payload: ChannelPayload) -> NotificationRecord {
        let stamp = self.sequencer.next(self.clock.now());
        normalize(payload.into_raw(), &self.defaults, stamp)
    }

    /// Next stamp whose id is not already held by `store`.
    fn unused_stamp(&mut self, store: &NotificationStore) -> IngestionStamp {
        loop {
            let stamp = self.sequencer.next(self.clock.now());
            if !store.contains(&stamp.id) {
                return stamp;
            }
            debug!(
                "event=id_sequence module=ingest status=skipped reason=held id={}",
                stamp.id
            );
        }
    }

    /// Routes a payload delivered by its channel.
    ///
    /// Returns `None` when the payload's channel is not attached.
    pub fn route(
        &mut self,
        store: &mut NotificationStore,
        payload: ChannelPayload,
    ) -> Option<Ingested> {
        let channel = payload.channel();
        if !self.is_attached(channel) {
            warn!(
                "event=ingest module=ingest channel={} status=dropped reason=channel_detached",
                channel.as_str()
            );
            return None;
        }
        Some(self.ingest(store, payload))
    }

    /// Normalizes and inserts `payload` regardless of channel attachment.
    pub fn ingest(&mut self, store: &mut NotificationStore, payload: ChannelPayload) -> Ingested {
        let channel = payload.channel();
        let stamp = self.unused_stamp(store);
        let record = normalize(payload.into_raw(), &self.defaults, stamp);
        let alert = match channel {
            Channel::Event => Some(AlertNotice {
                title: record.title().to_string(),
                body: record.body().to_string(),
            }),
            Channel::Foreground => None,
        };

        let evicted = store.insert(record.clone());
        debug!(
            "event=ingest module=ingest channel={} status=ok id={} evicted={}",
            channel.as_str(),
            record.id(),
            evicted
        );

        Ingested { record, alert }
    }
}
