//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the inbox presentation surface to Dart via FRB.
//! - Own the one process-level `InboxService` behind a mutex.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Record insertion is reachable only through channel delivery and
//!   simulation, never as a direct call.

use log::{error, info};
use pushinbox_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ChannelPayload, ErrorReporter, InboxService, Ingested, NotificationRecord, PersistenceError,
    SimulationPreset, SqliteGateway, StoreConfig,
};
use std::sync::{Arc, Mutex, OnceLock};

static INBOX: OnceLock<Mutex<InboxService>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One notification as rendered by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxItem {
    pub id: String,
    pub title: String,
    pub body: String,
    /// JSON object text, or empty when the record has no data.
    pub data_json: String,
    /// ISO-8601 ingestion time.
    pub timestamp: String,
    pub read: bool,
    /// `text_message|voice_call|video_call|generic`.
    pub kind: String,
}

/// Full inbox state envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxListResponse {
    /// Records newest-first.
    pub items: Vec<InboxItem>,
    pub badge_count: u32,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxActionResponse {
    pub ok: bool,
    /// Affected notification id, when one applies.
    pub notification_id: Option<String>,
    pub badge_count: u32,
    pub message: String,
}

impl InboxActionResponse {
    fn success(message: impl Into<String>, notification_id: Option<String>, badge: usize) -> Self {
        Self {
            ok: true,
            notification_id,
            badge_count: badge_to_u32(badge),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            notification_id: None,
            badge_count: 0,
            message: message.into(),
        }
    }
}

/// Ingestion response; alert fields are set for event-channel deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxIngestResponse {
    pub ok: bool,
    pub item: Option<InboxItem>,
    pub alert_title: Option<String>,
    pub alert_body: Option<String>,
    pub badge_count: u32,
    pub message: String,
}

impl InboxIngestResponse {
    fn ingested(ingested: Ingested, badge: usize) -> Self {
        let (alert_title, alert_body) = match ingested.alert {
            Some(alert) => (Some(alert.title), Some(alert.body)),
            None => (None, None),
        };
        Self {
            ok: true,
            item: Some(to_inbox_item(&ingested.record)),
            alert_title,
            alert_body,
            badge_count: badge_to_u32(badge),
            message: "Notification stored.".to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item: None,
            alert_title: None,
            alert_body: None,
            badge_count: 0,
            message: message.into(),
        }
    }
}

/// Opens the inbox backed by the SQLite file at `db_path`.
///
/// `config_json` is a `StoreConfig` JSON document; `None` or blank text
/// selects the default configuration.
///
/// # FFI contract
/// - Idempotent: later calls keep the already opened inbox and ignore
///   `config_json`.
/// - Invalid config fails without opening anything.
/// - Restores stored notifications and attaches both delivery channels.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_open(db_path: String, config_json: Option<String>) -> InboxActionResponse {
    if let Some(inbox) = INBOX.get() {
        return match inbox.lock() {
            Ok(inbox) => {
                InboxActionResponse::success("Inbox already open.", None, inbox.badge_count())
            }
            Err(_) => InboxActionResponse::failure("inbox_open failed: inbox lock poisoned"),
        };
    }

    let config = match config_json.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => match StoreConfig::from_json(text) {
            Ok(config) => config,
            Err(err) => {
                return InboxActionResponse::failure(format!("inbox_open failed: {err}"))
            }
        },
        _ => StoreConfig::default(),
    };

    let gateway = match SqliteGateway::open(db_path.trim()) {
        Ok(gateway) => gateway,
        Err(err) => return InboxActionResponse::failure(format!("inbox_open failed: {err}")),
    };
    let reporter: ErrorReporter = Arc::new(|err: &PersistenceError| {
        error!("event=inbox_persist module=ffi status=error error={err}");
    });
    let started = InboxService::start(Box::new(gateway), config, Some(reporter));
    let service = match started {
        Ok(service) => service,
        Err(err) => return InboxActionResponse::failure(format!("inbox_open failed: {err}")),
    };

    let badge = service.badge_count();
    if INBOX.set(Mutex::new(service)).is_err() {
        info!("event=inbox_open module=ffi status=skipped reason=already_open");
        return InboxActionResponse::success("Inbox already open.", None, badge);
    }
    InboxActionResponse::success("Inbox opened.", None, badge)
}

/// Delivers a channel A (event emitter) JSON payload.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_ingest_event(payload_json: String) -> InboxIngestResponse {
    match ChannelPayload::event_from_json(payload_json.as_str()) {
        Ok(payload) => deliver(payload, "inbox_ingest_event"),
        Err(err) => InboxIngestResponse::failure(format!("inbox_ingest_event failed: {err}")),
    }
}

/// Delivers a channel B (foreground messaging) JSON payload.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_ingest_foreground(payload_json: String) -> InboxIngestResponse {
    match ChannelPayload::foreground_from_json(payload_json.as_str()) {
        Ok(payload) => deliver(payload, "inbox_ingest_foreground"),
        Err(err) => InboxIngestResponse::failure(format!("inbox_ingest_foreground failed: {err}")),
    }
}

/// Ingests a simulated backend notification (`text|voice|video|test`).
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_simulate(kind: String) -> InboxIngestResponse {
    let preset = SimulationPreset::parse(kind.as_str());
    match with_inbox(|inbox| {
        let ingested = inbox.simulate(preset);
        InboxIngestResponse::ingested(ingested, inbox.badge_count())
    }) {
        Ok(response) => response,
        Err(err) => InboxIngestResponse::failure(format!("inbox_simulate failed: {err}")),
    }
}

/// Returns all notifications newest-first with the badge count.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_list() -> InboxListResponse {
    match with_inbox(|inbox| {
        let items = inbox.records().iter().map(to_inbox_item).collect::<Vec<_>>();
        (items, inbox.badge_count())
    }) {
        Ok((items, badge)) => {
            let message = if items.is_empty() {
                "No notifications.".to_string()
            } else {
                format!("{} notification(s).", items.len())
            };
            InboxListResponse {
                items,
                badge_count: badge_to_u32(badge),
                message,
            }
        }
        Err(err) => InboxListResponse {
            items: Vec::new(),
            badge_count: 0,
            message: format!("inbox_list failed: {err}"),
        },
    }
}

/// Returns the unread count, or 0 when the inbox is not open.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_badge_count() -> u32 {
    with_inbox(|inbox| badge_to_u32(inbox.badge_count())).unwrap_or(0)
}

/// Marks one notification read; unknown ids succeed as no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_mark_read(notification_id: String) -> InboxActionResponse {
    run_action("inbox_mark_read", |inbox| {
        let found = inbox.mark_read(notification_id.as_str());
        (
            if found { "Marked as read." } else { "Notification not found." },
            Some(notification_id.clone()),
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn inbox_mark_all_read() -> InboxActionResponse {
    run_action("inbox_mark_all_read", |inbox| {
        inbox.mark_all_read();
        ("All marked as read.", None)
    })
}

/// Deletes one notification; unknown ids succeed as no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_delete(notification_id: String) -> InboxActionResponse {
    run_action("inbox_delete", |inbox| {
        let found = inbox.delete(notification_id.as_str());
        (
            if found { "Notification deleted." } else { "Notification not found." },
            Some(notification_id.clone()),
        )
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn inbox_clear() -> InboxActionResponse {
    run_action("inbox_clear", |inbox| {
        inbox.clear();
        ("All notifications cleared.", None)
    })
}

/// Returns the record shown in the latest-message banner, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_latest() -> Option<InboxItem> {
    with_inbox(|inbox| inbox.latest().map(to_inbox_item))
        .ok()
        .flatten()
}

/// Closes the latest-message banner and marks its record read.
#[flutter_rust_bridge::frb(sync)]
pub fn inbox_dismiss_latest() -> InboxActionResponse {
    run_action("inbox_dismiss_latest", |inbox| match inbox.dismiss_latest() {
        Some(id) => ("Banner dismissed.", Some(id)),
        None => ("No banner to dismiss.", None),
    })
}

fn deliver(payload: ChannelPayload, operation: &str) -> InboxIngestResponse {
    match with_inbox(|inbox| {
        inbox
            .deliver(payload)
            .map(|ingested| InboxIngestResponse::ingested(ingested, inbox.badge_count()))
    }) {
        Ok(Some(response)) => response,
        Ok(None) => InboxIngestResponse::failure(format!("{operation} failed: channel detached")),
        Err(err) => InboxIngestResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn run_action<F>(operation: &str, action: F) -> InboxActionResponse
where
    F: FnOnce(&mut InboxService) -> (&'static str, Option<String>),
{
    match with_inbox(|inbox| {
        let (message, notification_id) = action(inbox);
        InboxActionResponse::success(message, notification_id, inbox.badge_count())
    }) {
        Ok(response) => response,
        Err(err) => InboxActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn with_inbox<T>(f: impl FnOnce(&mut InboxService) -> T) -> Result<T, String> {
    let inbox = INBOX
        .get()
        .ok_or_else(|| "inbox is not open; call inbox_open first".to_string())?;
    let mut guard = inbox
        .lock()
        .map_err(|_| "inbox lock poisoned".to_string())?;
    Ok(f(&mut *guard))
}

fn to_inbox_item(record: &NotificationRecord) -> InboxItem {
    InboxItem {
        id: record.id().to_string(),
        title: record.title().to_string(),
        body: record.body().to_string(),
        data_json: record
            .data()
            .and_then(|data| serde_json::to_string(data).ok())
            .unwrap_or_default(),
        timestamp: record.timestamp().to_string(),
        read: record.is_read(),
        kind: record.kind().as_str().to_string(),
    }
}

fn badge_to_u32(badge: usize) -> u32 {
    u32::try_from(badge).unwrap_or(u32::MAX)
}
