//! Delivery channel payload shapes.
//!
//! Channel A (`Channel::Event`) carries an already-shaped message object.
//! Channel B (`Channel::Foreground`) carries a `notification` display object
//! and a separate `data` routing object.

use crate::model::notification::{NotificationData, RawNotification};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Keys of an event message that are re-stamped at ingestion and therefore
/// never copied into `data`.
const RESTAMPED_KEYS: &[&str] = &["id", "timestamp", "read"];

/// Delivery channel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Generic event-emission path.
    Event,
    /// Messaging SDK foreground callback.
    Foreground,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Event, Channel::Foreground];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Foreground => "foreground",
        }
    }
}

/// Payload text could not be read as a JSON object.
#[derive(Debug)]
pub enum PayloadError {
    Json(serde_json::Error),
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid channel payload: {err}"),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Channel A message: `{title?, body?, ...extra}`.
///
/// Non-string `title`/`body` values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventMessage {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(flatten)]
    pub extra: NotificationData,
}

impl EventMessage {
    /// Extracts raw record fields.
    ///
    /// The extra fields, minus re-stamped keys, become the record data. An
    /// object-valued `data` field is merged into them, its keys winning on
    /// conflict. A non-object `data` value is dropped.
    pub fn into_raw(mut self) -> RawNotification {
        let nested = self.extra.remove("data");
        for key in RESTAMPED_KEYS {
            self.extra.remove(*key);
        }
        if let Some(Value::Object(map)) = nested {
            self.extra.extend(map);
        }
        let data = if self.extra.is_empty() {
            None
        } else {
            Some(self.extra)
        };

        RawNotification {
            title: self.title,
            body: self.body,
            data,
        }
    }
}

/// Display part of a channel B message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ForegroundNotification {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
}

/// Channel B message: `{notification?: {title?, body?}, data?: object}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForegroundMessage {
    #[serde(default, deserialize_with = "lenient_notification")]
    pub notification: Option<ForegroundNotification>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub data: Option<NotificationData>,
}

impl ForegroundMessage {
    pub fn into_raw(self) -> RawNotification {
        let (title, body) = match self.notification {
            Some(notification) => (notification.title, notification.body),
            None => (None, None),
        };
        RawNotification {
            title,
            body,
            data: self.data,
        }
    }
}

/// Payload tagged with the channel that delivered it.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelPayload {
    Event(EventMessage),
    Foreground(ForegroundMessage),
}

impl ChannelPayload {
    /// Parses channel A JSON text.
    pub fn event_from_json(text: &str) -> Result<Self, PayloadError> {
        Ok(Self::Event(serde_json::from_str(text)?))
    }

    /// Parses channel B JSON text.
    pub fn foreground_from_json(text: &str) -> Result<Self, PayloadError> {
        Ok(Self::Foreground(serde_json::from_str(text)?))
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Event(_) => Channel::Event,
            Self::Foreground(_) => Channel::Foreground,
        }
    }

    pub fn into_raw(self) -> RawNotification {
        match self {
            Self::Event(message) => message.into_raw(),
            Self::Foreground(message) => message.into_raw(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Option<NotificationData>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    })
}

fn lenient_notification<'de, D>(
    deserializer: D,
) -> Result<Option<ForegroundNotification>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{Channel, ChannelPayload};
    use serde_json::json;

    #[test]
    fn event_message_uses_data_field_when_present() {
        let payload = ChannelPayload::event_from_json(
            r#"{"title":"Hi","body":"There","data":{"screen":"messages"},"id":"old"}"#,
        )
        .expect("valid payload");
        assert_eq!(payload.channel(), Channel::Event);

        let raw = payload.into_raw();
        assert_eq!(raw.title.as_deref(), Some("Hi"));
        assert_eq!(raw.body.as_deref(), Some("There"));
        let data = raw.data.expect("data should be present");
        assert_eq!(data.get("screen"), Some(&json!("messages")));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn event_message_merges_sibling_extras_into_data_field() {
        let raw = ChannelPayload::event_from_json(
            r#"{"title":"x","data":{"a":1,"callId":"inner"},"callId":"c","screen":"calls"}"#,
        )
        .expect("valid payload")
        .into_raw();

        let data = raw.data.expect("data should be present");
        assert_eq!(data.get("a"), Some(&json!(1)));
        assert_eq!(data.get("screen"), Some(&json!("calls")));
        assert_eq!(data.get("callId"), Some(&json!("inner")));
        assert!(data.get("data").is_none());
    }

    #[test]
    fn event_message_falls_back_to_extra_fields_without_restamped_keys() {
        let raw = ChannelPayload::event_from_json(
            r#"{"title":42,"id":"old","timestamp":"x","read":true,"callId":"c-1"}"#,
        )
        .expect("valid payload")
        .into_raw();

        assert!(raw.title.is_none());
        let data = raw.data.expect("extra fields should become data");
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("callId"), Some(&json!("c-1")));
    }

    #[test]
    fn event_message_without_extras_has_no_data() {
        let raw = ChannelPayload::event_from_json("{}")
            .expect("valid payload")
            .into_raw();
        assert_eq!(raw, Default::default());
    }

    #[test]
    fn foreground_message_splits_display_and_data() {
        let raw = ChannelPayload::foreground_from_json(
            r#"{"notification":{"title":"Call","body":"Ringing"},"data":{"type":"voice_call"}}"#,
        )
        .expect("valid payload")
        .into_raw();

        assert_eq!(raw.title.as_deref(), Some("Call"));
        assert_eq!(raw.body.as_deref(), Some("Ringing"));
        assert_eq!(
            raw.data.and_then(|data| data.get("type").cloned()),
            Some(json!("voice_call"))
        );
    }

    #[test]
    fn foreground_message_tolerates_malformed_fields() {
        let raw = ChannelPayload::foreground_from_json(r#"{"notification":"oops","data":[1,2]}"#)
            .expect("malformed fields are tolerated")
            .into_raw();
        assert!(raw.title.is_none());
        assert!(raw.body.is_none());
        assert!(raw.data.is_none());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(ChannelPayload::foreground_from_json("42").is_err());
        assert!(ChannelPayload::event_from_json("not json").is_err());
    }
}
