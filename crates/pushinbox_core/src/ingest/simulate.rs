//! Backend simulation presets.
//!
//! Builds channel B payloads that mimic what the push backend sends for
//! text messages and calls, so the inbox can be exercised without a device.

use crate::ingest::payload::{ChannelPayload, ForegroundMessage, ForegroundNotification};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Simulated notification preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPreset {
    Text,
    Voice,
    Video,
    Test,
}

impl SimulationPreset {
    /// Parses a preset name; unknown names select `Test`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "voice" => Self::Voice,
            "video" => Self::Video,
            _ => Self::Test,
        }
    }

    /// Builds the foreground payload for this preset at time `at`.
    pub fn payload(self, at: DateTime<Utc>) -> ChannelPayload {
        let (title, body, data) = match self {
            Self::Text => (
                "New Text Message 💬".to_string(),
                "You have received a new text message from John Doe".to_string(),
                json!({ "screen": "messages", "senderId": "123", "type": "text_message" }),
            ),
            Self::Voice => (
                "Incoming Voice Call 📞".to_string(),
                "John Doe is calling you...".to_string(),
                json!({ "screen": "voice_call", "callerId": "123", "type": "voice_call" }),
            ),
            Self::Video => (
                "Incoming Video Call 📹".to_string(),
                "John Doe wants to video chat with you".to_string(),
                json!({ "screen": "video_call", "callerId": "123", "type": "video_call" }),
            ),
            Self::Test => (
                "Test Notification".to_string(),
                format!("Backend simulation test at {}", at.format("%H:%M:%S")),
                json!({
                    "screen": "notifications",
                    "test": "true",
                    "timestamp": at.timestamp_millis(),
                }),
            ),
        };

        ChannelPayload::Foreground(ForegroundMessage {
            notification: Some(ForegroundNotification {
                title: Some(title),
                body: Some(body),
            }),
            data: data.as_object().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationPreset;
    use crate::ingest::payload::ChannelPayload;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    #[test]
    fn parse_defaults_unknown_names_to_test() {
        assert_eq!(SimulationPreset::parse(" Voice "), SimulationPreset::Voice);
        assert_eq!(SimulationPreset::parse("scheduled"), SimulationPreset::Test);
    }

    #[test]
    fn test_preset_embeds_time() {
        let at = DateTime::<Utc>::from_timestamp_millis(3_723_000).expect("valid millis");
        let payload = SimulationPreset::Test.payload(at);
        assert!(matches!(payload, ChannelPayload::Foreground(_)));

        let raw = payload.into_raw();
        assert_eq!(raw.body.as_deref(), Some("Backend simulation test at 01:02:03"));
        assert_eq!(
            raw.data.and_then(|data| data.get("timestamp").cloned()),
            Some(json!(3_723_000))
        );
    }
}
