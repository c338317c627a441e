//! Inbound event routing.
//!
//! Each raw channel message is parsed, classified by its `type` and handed
//! to the part of [`ViewState`] it concerns. Messages that cannot be parsed
//! or carry an unknown `type` are logged and dropped; routing never fails.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::alerts::AlertRecord;
use crate::display;
use crate::error::DashboardError;
use crate::frontend::{Effect, Effects, Notification, Region};
use crate::media::MediaKind;
use crate::protocol::{EventKind, InboundEvent};
use crate::state::ViewState;

/// Default time the motion badge stays lit after an alert.
pub const DEFAULT_LIVE_FLAG: Duration = Duration::from_millis(3000);

/// Dispatches inbound events to view state.
#[derive(Debug, Clone, Copy)]
pub struct EventRouter {
    live_flag: Duration,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_FLAG)
    }
}

impl EventRouter {
    /// Router whose motion badge stays lit for `live_flag`.
    #[must_use]
    pub fn new(live_flag: Duration) -> Self {
        Self { live_flag }
    }

    /// Parse and dispatch one raw message.
    ///
    /// Returns the kind that was routed, or `None` if the message was dropped.
    pub fn route(
        &self,
        raw: &str,
        view: &mut ViewState,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> Option<EventKind> {
        match InboundEvent::parse(raw) {
            Ok((kind, event)) => {
                tracing::debug!("Routing {}", kind.as_str());
                if kind == EventKind::ConnectionEstablished {
                    tracing::debug!("Received initial snapshot");
                }
                self.dispatch(event, view, now, effects);
                Some(kind)
            }
            Err(DashboardError::UnknownEventType(name)) => {
                tracing::debug!("Dropping message with unknown type {:?}", name);
                None
            }
            Err(e) => {
                tracing::warn!("Dropping malformed message: {}", e);
                None
            }
        }
    }

    /// Apply an already decoded event.
    pub fn dispatch(
        &self,
        event: InboundEvent,
        view: &mut ViewState,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) {
        match event {
            InboundEvent::StatsUpdate(snapshot) => {
                view.apply(&snapshot, now, effects);
                view.record_activity(&snapshot, now, effects);
            }
            InboundEvent::MotionAlert(alert) => {
                let at = event_time(alert.timestamp.as_deref(), now);
                view.alerts.push(AlertRecord::motion(&alert, at));
                effects.render(Region::Alerts);

                view.set_motion_live(effects);
                effects.push(Effect::ClearLiveFlagAfter(self.live_flag));

                if view.controls.notifications {
                    effects.notify(Notification::warning(
                        "Motion detected!",
                        format!("Area: {} px", display::format_thousands(alert.area)),
                    ));
                }
            }
            InboundEvent::AudioAlert(alert) => {
                let at = event_time(alert.timestamp.as_deref(), now);
                view.alerts.push(AlertRecord::sound(&alert, at));
                effects.render(Region::Alerts);

                if view.controls.notifications {
                    effects.notify(Notification::info(
                        "Sound detected!",
                        format!("Level: {:.1} dB ({})", alert.db_level, alert.sound_type),
                    ));
                }
            }
            InboundEvent::PhotoCaptured => {
                effects.notify(Notification::success("Photo captured", "Photo saved successfully"));
                effects.refresh_media(MediaKind::Photos);
            }
            InboundEvent::RecordingSaved => {
                effects.notify(Notification::success(
                    "Recording saved",
                    "Audio recording saved successfully",
                ));
                effects.refresh_media(MediaKind::Recordings);
            }
            InboundEvent::SensitivityChanged { level } => {
                effects.notify(Notification::info(
                    "Settings updated",
                    format!("Motion sensitivity set to {level}"),
                ));
            }
            InboundEvent::VoiceMessage { text } => {
                effects.notify(Notification::info("Voice message", format!("Played: \"{text}\"")));
            }
        }
    }
}

fn event_time(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(display::parse_timestamp).unwrap_or(now)
}
