//! Wire types for the server channel.
//!
//! Inbound messages are JSON objects discriminated by a `type` field. They are
//! parsed into [`InboundEvent`] in two steps: first into a generic JSON value to
//! read the discriminator, then into the kind-specific payload. This keeps an
//! unknown `type` distinguishable from a malformed payload, which matters for
//! logging only; both are dropped by the router.
//!
//! Outbound commands are flat JSON objects `{"type": ..., ...fields}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DashboardError, Result};

/// Kind of an inbound event, as named by its `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Initial snapshot sent by the server when the channel opens
    ConnectionEstablished,
    /// Periodic statistics snapshot
    StatsUpdate,
    /// Motion detected by the camera
    MotionAlert,
    /// Sound detected by the microphone
    AudioAlert,
    /// A photo was stored on the server
    PhotoCaptured,
    /// An audio recording was stored on the server
    RecordingSaved,
    /// Motion sensitivity changed
    SensitivityChanged,
    /// A voice message was played on the server speaker
    VoiceMessage,
}

impl EventKind {
    /// Wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "connection_established",
            Self::StatsUpdate => "stats_update",
            Self::MotionAlert => "motion_alert",
            Self::AudioAlert => "audio_alert",
            Self::PhotoCaptured => "photo_captured",
            Self::RecordingSaved => "recording_saved",
            Self::SensitivityChanged => "sensitivity_changed",
            Self::VoiceMessage => "voice_message",
        }
    }

    /// Look up a kind by its wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Some(match name {
            "connection_established" => Self::ConnectionEstablished,
            "stats_update" => Self::StatsUpdate,
            "motion_alert" => Self::MotionAlert,
            "audio_alert" => Self::AudioAlert,
            "photo_captured" => Self::PhotoCaptured,
            "recording_saved" => Self::RecordingSaved,
            "sensitivity_changed" => Self::SensitivityChanged,
            "voice_message" => Self::VoiceMessage,
            _ => return None,
        })
    }
}

/// Partial status snapshot. Every field is optional; absent fields leave the
/// corresponding view state untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Total motion detections since server start
    pub motion_count: Option<u64>,
    /// Total sound alerts since server start
    pub sound_alerts: Option<u64>,
    /// ISO-8601 time of the most recent motion
    pub last_motion: Option<String>,
    /// ISO-8601 time the server started
    pub uptime: Option<String>,
    /// Microphone statistics
    pub audio_stats: Option<AudioStats>,
    /// Motion detector statistics
    pub motion_stats: Option<MotionStats>,
    /// Whether the camera is running
    pub camera_active: Option<bool>,
    /// Whether the microphone is running
    pub audio_active: Option<bool>,
    /// Whether an audio recording is in progress
    pub is_recording: Option<bool>,
}

impl StatsSnapshot {
    /// True when the snapshot carries anything for the activity series.
    #[must_use]
    pub fn has_activity(&self) -> bool {
        self.audio_stats.is_some() || self.motion_stats.is_some()
    }
}

/// Microphone statistics inside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStats {
    /// Normalised volume, nominally 0.0..=1.0
    pub current_volume: Option<f64>,
    /// Current level in dB
    pub current_db: Option<f64>,
    /// Sound alerts in the recent window
    pub alerts_count: Option<f64>,
}

/// Motion detector statistics inside a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionStats {
    /// Motion detections in the recent window
    pub recent_count: Option<f64>,
    /// Motion detections since server start
    pub total_count: Option<u64>,
}

/// Payload of a `motion_alert` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionAlert {
    /// Area of the detected motion, in pixels
    pub area: f64,
    /// Number of moving regions
    #[serde(default)]
    pub count: Option<u64>,
    /// ISO-8601 detection time
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Payload of an `audio_alert` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAlert {
    /// Measured level in dB
    pub db_level: f64,
    /// Classifier label for the sound
    #[serde(default = "default_sound_type")]
    pub sound_type: String,
    /// ISO-8601 detection time
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn default_sound_type() -> String {
    "unknown".to_string()
}

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `stats_update` or `connection_established`
    StatsUpdate(StatsSnapshot),
    /// `motion_alert`
    MotionAlert(MotionAlert),
    /// `audio_alert`
    AudioAlert(AudioAlert),
    /// `photo_captured`
    PhotoCaptured,
    /// `recording_saved`
    RecordingSaved,
    /// `sensitivity_changed`; the level is shown as sent
    SensitivityChanged {
        /// New level as text
        level: String,
    },
    /// `voice_message`
    VoiceMessage {
        /// Text that was spoken
        text: String,
    },
}

impl InboundEvent {
    /// Parse one raw channel message.
    ///
    /// Returns the decoded kind alongside the event so callers can log it.
    pub fn parse(raw: &str) -> Result<(EventKind, Self)> {
        let value: Value = serde_json::from_str(raw)?;
        let name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DashboardError::UnknownEventType("<missing>".to_string()))?;
        let kind = EventKind::from_wire(name)
            .ok_or_else(|| DashboardError::UnknownEventType(name.to_string()))?;

        let event = match kind {
            EventKind::ConnectionEstablished | EventKind::StatsUpdate => {
                Self::StatsUpdate(snapshot_from(value)?)
            }
            EventKind::MotionAlert => Self::MotionAlert(serde_json::from_value(value)?),
            EventKind::AudioAlert => Self::AudioAlert(serde_json::from_value(value)?),
            EventKind::PhotoCaptured => Self::PhotoCaptured,
            EventKind::RecordingSaved => Self::RecordingSaved,
            EventKind::SensitivityChanged => Self::SensitivityChanged {
                level: value.get("level").map(display_value).unwrap_or_default(),
            },
            EventKind::VoiceMessage => Self::VoiceMessage {
                text: value.get("text").map(display_value).unwrap_or_default(),
            },
        };
        Ok((kind, event))
    }
}

/// The server nests snapshots under `data`; accept them inline too.
fn snapshot_from(mut value: Value) -> Result<StatsSnapshot> {
    if value.get("data").is_some_and(Value::is_object) {
        value = value["data"].take();
    }
    Ok(serde_json::from_value(value)?)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Motion detection sensitivity understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    /// Only large movements
    Low,
    /// Default
    Medium,
    /// Small movements too
    High,
}

/// User command sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Turn the camera on or off
    ToggleCamera {
        /// Desired state
        enabled: bool,
    },
    /// Turn the microphone on or off
    ToggleAudio {
        /// Desired state
        enabled: bool,
    },
    /// Turn motion detection on or off
    ToggleMotion {
        /// Desired state
        enabled: bool,
    },
    /// Change motion detection sensitivity
    ChangeSensitivity {
        /// New level
        level: SensitivityLevel,
    },
    /// Change the audio alert threshold
    ChangeAudioSensitivity {
        /// Normalised volume threshold
        threshold: f64,
    },
    /// Take a photo now
    CapturePhoto,
    /// Start an audio recording
    StartRecording,
    /// Stop the running audio recording
    StopRecording,
    /// Speak a message through the server speaker
    PlayVoice {
        /// Message to speak
        text: String,
    },
}

impl Command {
    /// Wire name of this command.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToggleCamera { .. } => "toggle_camera",
            Self::ToggleAudio { .. } => "toggle_audio",
            Self::ToggleMotion { .. } => "toggle_motion",
            Self::ChangeSensitivity { .. } => "change_sensitivity",
            Self::ChangeAudioSensitivity { .. } => "change_audio_sensitivity",
            Self::CapturePhoto => "capture_photo",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::PlayVoice { .. } => "play_voice",
        }
    }

    /// Flat JSON object for this command.
    pub fn to_object(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(DashboardError::Transport(format!(
                "command encoded as non-object: {other}"
            ))),
        }
    }
}

/// Merge a type discriminator with extra fields into one flat object.
///
/// Extra fields are spread after the discriminator, so an extra `type`
/// overrides it.
#[must_use]
pub fn merge_command(kind: &str, extra: Map<String, Value>) -> Map<String, Value> {
    let mut object = Map::with_capacity(extra.len() + 1);
    object.insert("type".to_string(), Value::String(kind.to_string()));
    object.extend(extra);
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_stats_update() {
        let raw = r#"{"type":"stats_update","data":{"motion_count":4,"camera_active":false,
            "audio_stats":{"current_volume":0.1,"current_db":30.0,"alerts_count":2}}}"#;
        let (kind, event) = InboundEvent::parse(raw).unwrap();
        assert_eq!(kind, EventKind::StatsUpdate);
        let InboundEvent::StatsUpdate(snapshot) = event else {
            panic!("expected stats update");
        };
        assert_eq!(snapshot.motion_count, Some(4));
        assert_eq!(snapshot.camera_active, Some(false));
        assert_eq!(snapshot.sound_alerts, None);
        assert_eq!(
            snapshot.audio_stats.and_then(|a| a.current_volume),
            Some(0.1)
        );
    }

    #[test]
    fn test_parse_inline_stats_update() {
        let raw = r#"{"type":"stats_update","motion_count":7,"is_recording":true}"#;
        let (_, event) = InboundEvent::parse(raw).unwrap();
        let InboundEvent::StatsUpdate(snapshot) = event else {
            panic!("expected stats update");
        };
        assert_eq!(snapshot.motion_count, Some(7));
        assert_eq!(snapshot.is_recording, Some(true));
        assert!(!snapshot.has_activity());
    }

    #[test]
    fn test_connection_established_is_a_snapshot() {
        let raw =
            r#"{"type":"connection_established","message":"hi","data":{"audio_active":true}}"#;
        let (kind, event) = InboundEvent::parse(raw).unwrap();
        assert_eq!(kind, EventKind::ConnectionEstablished);
        assert!(matches!(event, InboundEvent::StatsUpdate(s) if s.audio_active == Some(true)));
    }

    #[test]
    fn test_parse_alerts() {
        let (_, event) =
            InboundEvent::parse(r#"{"type":"motion_alert","area":500,"count":3}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::MotionAlert(MotionAlert {
                area: 500.0,
                count: Some(3),
                timestamp: None
            })
        );

        let (_, event) = InboundEvent::parse(r#"{"type":"audio_alert","db_level":71.25}"#).unwrap();
        let InboundEvent::AudioAlert(alert) = event else {
            panic!("expected audio alert");
        };
        assert_eq!(alert.sound_type, "unknown");
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(matches!(
            InboundEvent::parse(r#"{"type":"door_opened"}"#),
            Err(DashboardError::UnknownEventType(t)) if t == "door_opened"
        ));
        assert!(matches!(
            InboundEvent::parse(r#"{"area":1}"#),
            Err(DashboardError::UnknownEventType(_))
        ));
        assert!(matches!(
            InboundEvent::parse("not json"),
            Err(DashboardError::Json(_))
        ));
        // Known type, wrong payload shape
        assert!(InboundEvent::parse(r#"{"type":"motion_alert","area":"big"}"#).is_err());
    }

    #[test]
    fn test_notification_payloads() {
        let (_, event) =
            InboundEvent::parse(r#"{"type":"sensitivity_changed","level":"high"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::SensitivityChanged {
                level: "high".into()
            }
        );
        let (_, event) =
            InboundEvent::parse(r#"{"type":"sensitivity_changed","level":7}"#).unwrap();
        assert_eq!(event, InboundEvent::SensitivityChanged { level: "7".into() });
    }

    #[test]
    fn test_command_encoding_is_flat() {
        let object = Command::ToggleCamera { enabled: false }.to_object().unwrap();
        assert_eq!(Value::Object(object), json!({"type": "toggle_camera", "enabled": false}));

        let object = Command::CapturePhoto.to_object().unwrap();
        assert_eq!(Value::Object(object), json!({"type": "capture_photo"}));

        let object = Command::ChangeSensitivity {
            level: SensitivityLevel::High,
        }
        .to_object()
        .unwrap();
        assert_eq!(Value::Object(object), json!({"type": "change_sensitivity", "level": "high"}));
    }

    #[test]
    fn test_merge_command() {
        let mut extra = Map::new();
        extra.insert("text".into(), json!("hello"));
        let merged = merge_command("play_voice", extra);
        assert_eq!(Value::Object(merged), json!({"type": "play_voice", "text": "hello"}));
    }

    #[test]
    fn test_command_kind_matches_wire_name() {
        let command = Command::PlayVoice { text: "x".into() };
        let object = command.to_object().unwrap();
        assert_eq!(object["type"], json!(command.kind()));
    }
}
