//! Boundary between state updates and whatever displays them.
//!
//! State-mutating code never draws. It records [`Effect`]s: which region of
//! the dashboard needs a redraw, which notification to show, which media
//! listing to re-fetch, when to drop the motion badge. The session drains
//! those effects, hands render and notify calls to a [`Frontend`], and runs
//! the I/O itself.

use std::fmt;
use std::time::Duration;

use crate::connection::ConnectionState;
use crate::display;
use crate::media::MediaKind;
use crate::state::ViewState;

/// Part of the dashboard that needs redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Counters, uptime, last motion, volume meter
    Stats,
    /// Camera/audio/motion/notification toggles
    Controls,
    /// Recording indicator and buttons
    Recording,
    /// Activity chart
    Series,
    /// Alert list
    Alerts,
    /// Motion "live" badge
    MotionBadge,
    /// A media gallery
    Media(MediaKind),
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information
    Info,
    /// Something the user asked for succeeded
    Success,
    /// Attention needed (detections)
    Warning,
    /// Something failed
    Error,
}

/// User-visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short heading
    pub title: String,
    /// Body text
    pub message: String,
    /// How it should be styled
    pub severity: Severity,
}

impl Notification {
    /// Build a notification.
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    /// Informational notification.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Info)
    }

    /// Success notification.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Success)
    }

    /// Warning notification.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Warning)
    }

    /// Error notification.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Error)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Side effect requested by a state update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Redraw a region
    Render(Region),
    /// Show a notification
    Notify(Notification),
    /// Fetch a media listing again
    RefreshMedia(MediaKind),
    /// Clear the motion badge after the given delay
    ClearLiveFlagAfter(Duration),
}

/// Ordered list of effects produced by one state update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects(Vec<Effect>);

impl Effects {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect.
    pub fn push(&mut self, effect: Effect) {
        self.0.push(effect);
    }

    /// Request a redraw. A region already queued is not queued twice.
    pub fn render(&mut self, region: Region) {
        if !self.0.contains(&Effect::Render(region)) {
            self.0.push(Effect::Render(region));
        }
    }

    /// Request a notification.
    pub fn notify(&mut self, notification: Notification) {
        self.0.push(Effect::Notify(notification));
    }

    /// Request a media re-fetch.
    pub fn refresh_media(&mut self, kind: MediaKind) {
        self.0.push(Effect::RefreshMedia(kind));
    }

    /// Notifications in the order they were requested.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.0.iter().filter_map(|effect| match effect {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
    }

    /// True if a redraw of `region` was requested.
    #[must_use]
    pub fn renders(&self, region: Region) -> bool {
        self.0.contains(&Effect::Render(region))
    }

    /// Borrow the effects.
    #[must_use]
    pub fn as_slice(&self) -> &[Effect] {
        &self.0
    }

    /// Number of effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take all effects, leaving the list empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Effect> {
        self.0.drain(..)
    }
}

impl IntoIterator for Effects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Something that displays the dashboard.
pub trait Frontend: Send {
    /// Redraw `region` from `view`.
    fn render(&mut self, view: &ViewState, region: Region);

    /// Show a notification.
    fn notify(&mut self, notification: &Notification);

    /// The channel state changed.
    fn connection_changed(&mut self, _state: ConnectionState) {}
}

/// Frontend that writes everything to the log. Used by the binary.
#[derive(Debug, Default)]
pub struct LogFrontend;

impl Frontend for LogFrontend {
    fn render(&mut self, view: &ViewState, region: Region) {
        match region {
            Region::Stats => tracing::info!(
                motion_count = ?view.stats.motion_count,
                sound_alerts = ?view.stats.sound_alerts,
                uptime = view.stats.uptime.as_deref().unwrap_or("--:--"),
                volume_percent = view.stats.volume_percent,
                db = %view.stats.current_db.map(display::format_db).unwrap_or_default(),
                sound_detected = view.stats.sound_detected,
                "stats"
            ),
            Region::Controls => tracing::info!(
                camera = view.controls.camera,
                audio = view.controls.audio,
                motion = view.controls.motion,
                notifications = view.controls.notifications,
                "controls"
            ),
            Region::Recording => tracing::info!(recording = view.is_recording, "recording"),
            Region::Series => {
                if let Some(point) = view.series.last() {
                    tracing::debug!(
                        label = %point.label,
                        motion = point.motion,
                        sound = point.sound,
                        points = view.series.len(),
                        "activity"
                    );
                }
            }
            Region::Alerts => {
                if let Some(alert) = view.alerts.latest() {
                    tracing::info!(
                        at = %display::clock_time(alert.timestamp),
                        total = view.alerts.len(),
                        "{}",
                        alert.details
                    );
                }
            }
            Region::MotionBadge => tracing::debug!(live = view.motion_live, "motion badge"),
            Region::Media(kind) => {
                tracing::info!(count = view.media.items(kind).len(), "{} listing", kind);
            }
        }
    }

    fn notify(&mut self, notification: &Notification) {
        match notification.severity {
            Severity::Error => tracing::error!("{}", notification),
            Severity::Warning => tracing::warn!("{}", notification),
            Severity::Info | Severity::Success => tracing::info!("{}", notification),
        }
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        tracing::info!(status = %state, "connection");
    }
}
