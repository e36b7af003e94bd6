//! Notification record model and normalization.
//!
//! # Responsibility
//! - Define `NotificationRecord`, the unit stored and rendered by the inbox.
//! - Convert raw, possibly incomplete channel fields into a complete record.
//!
//! # Invariants
//! - A normalized record never has an empty `title` or `body`.
//! - `id` and `timestamp` come from one `IngestionStamp`.
//! - `data` is carried through unmodified.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when a channel payload carries no usable title.
pub const DEFAULT_TITLE: &str = "New Message";
/// Body used when a channel payload carries no usable body.
pub const DEFAULT_BODY: &str = "You have a new message";

/// Store-unique notification identifier (epoch milliseconds as text).
pub type NotificationId = String;

/// Opaque routing/payload metadata attached by the sender.
pub type NotificationData = Map<String, Value>;

/// Source of ingestion time.
///
/// Injected into the router so tests can pin timestamps.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Identity and time assigned to one ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStamp {
    pub id: NotificationId,
    pub at: DateTime<Utc>,
}

impl IngestionStamp {
    pub fn new(id: impl Into<NotificationId>, at: DateTime<Utc>) -> Self {
        Self { id: id.into(), at }
    }

    /// Builds a stamp whose id is the decimal form of `millis`.
    ///
    /// Out-of-range values fall back to the unix epoch for `at`.
    pub fn from_millis(millis: i64) -> Self {
        let at = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
        Self::new(millis.to_string(), at)
    }
}

/// Raw display and metadata fields extracted from a channel payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<NotificationData>,
}

/// Placeholder texts substituted for missing title/body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

/// Presentation category derived from `data.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TextMessage,
    VoiceCall,
    VideoCall,
    Generic,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextMessage => "text_message",
            Self::VoiceCall => "voice_call",
            Self::VideoCall => "video_call",
            Self::Generic => "generic",
        }
    }

    fn from_data(data: Option<&NotificationData>) -> Self {
        match data.and_then(|map| map.get("type")).and_then(Value::as_str) {
            Some("text_message") => Self::TextMessage,
            Some("voice_call") => Self::VoiceCall,
            Some("video_call") => Self::VideoCall,
            _ => Self::Generic,
        }
    }
}

/// Canonical notification record.
///
/// Fields are private so that only the store can flip `read`, and nothing can
/// rewrite content after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    id: NotificationId,
    title: String,
    body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<NotificationData>,
    /// ISO-8601 ingestion time, UTC with millisecond precision.
    timestamp: String,
    read: bool,
}

impl NotificationRecord {
    /// Rebuilds a record from persisted fields.
    ///
    /// Used by persistence gateways; performs no default substitution.
    pub fn restore(
        id: impl Into<NotificationId>,
        title: impl Into<String>,
        body: impl Into<String>,
        data: Option<NotificationData>,
        timestamp: impl Into<String>,
        read: bool,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            data,
            timestamp: timestamp.into(),
            read,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn data(&self) -> Option<&NotificationData> {
        self.data.as_ref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn kind(&self) -> NotificationKind {
        NotificationKind::from_data(self.data.as_ref())
    }

    /// Marks this record read. Returns whether the flag changed.
    pub(crate) fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }
}

/// Normalizes raw channel fields into a complete unread record.
///
/// # Contract
/// - Absent or whitespace-only `title`/`body` are replaced by `defaults`.
/// - `id` and `timestamp` are taken from `stamp`.
/// - `data` is moved into the record as-is.
pub fn normalize(
    raw: RawNotification,
    defaults: &NotificationDefaults,
    stamp: IngestionStamp,
) -> NotificationRecord {
    NotificationRecord {
        id: stamp.id,
        title: text_or_default(raw.title, &defaults.title),
        body: text_or_default(raw.body, &defaults.body),
        data: raw.data,
        timestamp: format_timestamp(stamp.at),
        read: false,
    }
}

/// Formats an instant the way JavaScript `Date.toISOString` does.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn text_or_default(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => fallback.to_string(),
    }
}
