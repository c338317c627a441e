//! Outbound commands and the user actions that produce them.
//!
//! Commands are fire-and-forget: nothing tracks acknowledgements and nothing
//! is retried. A command that cannot be sent produces exactly one error
//! notification and is then forgotten.

use serde_json::{Map, Value};

use crate::connection::ConnectionManager;
use crate::display;
use crate::error::Result;
use crate::frontend::{Effects, Notification, Region};
use crate::protocol::{merge_command, Command};
use crate::state::{Control, ViewState};

/// An action taken by the user on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum UserIntent {
    /// Flip a toggle
    Toggle(Control),
    /// Motion sensitivity slider released at 1..=10
    SetMotionSensitivity(u8),
    /// Audio sensitivity slider released at 1..=10
    SetAudioSensitivity(u8),
    /// Take a photo
    CapturePhoto,
    /// Start an audio recording
    StartRecording,
    /// Stop the running audio recording
    StopRecording,
    /// Speak a message through the server speaker
    PlayVoice(String),
}

/// Serializes commands onto the server channel.
#[derive(Debug)]
pub struct CommandSender<'a> {
    connection: &'a mut ConnectionManager,
}

impl<'a> CommandSender<'a> {
    /// Sender over `connection`.
    pub fn new(connection: &'a mut ConnectionManager) -> Self {
        Self { connection }
    }

    /// Send `{type: kind, ...extra}`.
    ///
    /// On failure one error notification is recorded and the error returned.
    pub fn send(
        &mut self,
        kind: &str,
        extra: Map<String, Value>,
        effects: &mut Effects,
    ) -> Result<()> {
        let object = merge_command(kind, extra);
        self.transmit(kind, Value::Object(object), effects)
    }

    /// Send a typed command.
    pub fn send_command(&mut self, command: &Command, effects: &mut Effects) -> Result<()> {
        let result = command
            .to_object()
            .and_then(|object| self.deliver(command.kind(), Value::Object(object)));
        self.report(command.kind(), result, effects)
    }

    fn transmit(&mut self, kind: &str, payload: Value, effects: &mut Effects) -> Result<()> {
        let result = self.deliver(kind, payload);
        self.report(kind, result, effects)
    }

    fn deliver(&mut self, kind: &str, payload: Value) -> Result<()> {
        self.connection.send(payload.to_string())?;
        tracing::debug!("Sent command {}", kind);
        Ok(())
    }

    fn report(&self, kind: &str, result: Result<()>, effects: &mut Effects) -> Result<()> {
        if let Err(e) = &result {
            tracing::warn!("Command {} not sent: {}", kind, e);
            effects.notify(Notification::error(
                "Communication error",
                "Cannot send command - not connected to server",
            ));
        }
        result
    }
}

/// Apply a user action: update local state, then send the matching command.
///
/// Toggles and the recording flag change optimistically and are not rolled
/// back if the send fails; the next server snapshot corrects them.
pub fn apply_intent(
    intent: UserIntent,
    view: &mut ViewState,
    connection: &mut ConnectionManager,
    effects: &mut Effects,
) {
    let mut sender = CommandSender::new(connection);
    let command = match intent {
        UserIntent::Toggle(control) => {
            let enabled = view.controls.toggle(control);
            effects.render(Region::Controls);
            match control {
                Control::Camera => Command::ToggleCamera { enabled },
                Control::Audio => Command::ToggleAudio { enabled },
                Control::Motion => Command::ToggleMotion { enabled },
                Control::Notifications => {
                    if enabled {
                        effects.notify(Notification::success(
                            "Notifications enabled",
                            "System notifications turned on",
                        ));
                    }
                    return;
                }
            }
        }
        UserIntent::SetMotionSensitivity(slider) => Command::ChangeSensitivity {
            level: display::motion_level(slider),
        },
        UserIntent::SetAudioSensitivity(slider) => Command::ChangeAudioSensitivity {
            threshold: display::audio_threshold(slider),
        },
        UserIntent::CapturePhoto => Command::CapturePhoto,
        UserIntent::StartRecording => {
            if view.is_recording {
                tracing::debug!("Already recording");
                return;
            }
            view.is_recording = true;
            effects.render(Region::Recording);
            Command::StartRecording
        }
        UserIntent::StopRecording => {
            if !view.is_recording {
                tracing::debug!("Not recording");
                return;
            }
            view.is_recording = false;
            effects.render(Region::Recording);
            Command::StopRecording
        }
        UserIntent::PlayVoice(text) => {
            if text.is_empty() {
                return;
            }
            Command::PlayVoice { text }
        }
    };
    // Failures are already reported to the user
    let _ = sender.send_command(&command, effects);
}
