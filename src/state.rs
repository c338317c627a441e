//! Dashboard view state and the snapshot reducer.
//!
//! [`ViewState`] is the single owned aggregate behind the dashboard: control
//! toggles, counters, the activity series, the alert log and the media
//! catalog. It is created when the session starts and dropped with it.
//!
//! Snapshots are merged, not replaced: a field absent from a snapshot leaves
//! the corresponding state untouched.

use chrono::{DateTime, Utc};

use crate::alerts::AlertLog;
use crate::config::{DashboardConfig, SoundSeriesSource};
use crate::display;
use crate::frontend::{Effects, Region};
use crate::media::MediaCatalog;
use crate::protocol::StatsSnapshot;
use crate::series::RollingSeries;

/// A user-facing toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Camera on/off (server side)
    Camera,
    /// Microphone on/off (server side)
    Audio,
    /// Motion detection on/off (server side)
    Motion,
    /// Detection notifications on/off (local only)
    Notifications,
}

impl Control {
    /// Display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Audio => "Audio",
            Self::Motion => "Motion detection",
            Self::Notifications => "Notifications",
        }
    }
}

/// Current value of every toggle. Everything starts enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemControls {
    /// Camera enabled
    pub camera: bool,
    /// Microphone enabled
    pub audio: bool,
    /// Motion detection enabled
    pub motion: bool,
    /// Detection notifications enabled
    pub notifications: bool,
}

impl Default for SystemControls {
    fn default() -> Self {
        Self {
            camera: true,
            audio: true,
            motion: true,
            notifications: true,
        }
    }
}

impl SystemControls {
    /// Read one toggle.
    #[must_use]
    pub fn get(&self, control: Control) -> bool {
        match control {
            Control::Camera => self.camera,
            Control::Audio => self.audio,
            Control::Motion => self.motion,
            Control::Notifications => self.notifications,
        }
    }

    /// Set one toggle.
    pub fn set(&mut self, control: Control, enabled: bool) {
        match control {
            Control::Camera => self.camera = enabled,
            Control::Audio => self.audio = enabled,
            Control::Motion => self.motion = enabled,
            Control::Notifications => self.notifications = enabled,
        }
    }

    /// Flip one toggle and return its new value.
    pub fn toggle(&mut self, control: Control) -> bool {
        let enabled = !self.get(control);
        self.set(control, enabled);
        enabled
    }
}

/// Counters and derived values shown in the statistics panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsView {
    /// Motion detections since server start
    pub motion_count: Option<u64>,
    /// Sound alerts since server start
    pub sound_alerts: Option<u64>,
    /// Most recent motion
    pub last_motion: Option<DateTime<Utc>>,
    /// Server start time
    pub started_at: Option<DateTime<Utc>>,
    /// Elapsed time since `started_at`, `HH:MM`
    pub uptime: Option<String>,
    /// Volume bar width, 0..=100
    pub volume_percent: f64,
    /// Current level in dB
    pub current_db: Option<f64>,
    /// Volume above the detection floor
    pub sound_detected: bool,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Toggles
    pub controls: SystemControls,
    /// Statistics panel
    pub stats: StatsView,
    /// Audio recording in progress
    pub is_recording: bool,
    /// Motion badge lit by a recent motion alert
    pub motion_live: bool,
    /// Activity chart
    pub series: RollingSeries,
    /// Alert list
    pub alerts: AlertLog,
    /// Photos and recordings
    pub media: MediaCatalog,
    sound_source: SoundSeriesSource,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl ViewState {
    /// Fresh state sized from `config`.
    #[must_use]
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            controls: SystemControls::default(),
            stats: StatsView::default(),
            is_recording: false,
            motion_live: false,
            series: RollingSeries::new(config.series_capacity),
            alerts: AlertLog::new(config.alert_capacity),
            media: MediaCatalog::default(),
            sound_source: config.sound_series_source,
        }
    }

    /// Merge a partial snapshot.
    ///
    /// Device-active flags from the server override any toggle the user
    /// flipped locally.
    pub fn apply(&mut self, snapshot: &StatsSnapshot, now: DateTime<Utc>, effects: &mut Effects) {
        if let Some(count) = snapshot.motion_count {
            self.stats.motion_count = Some(count);
        }
        if let Some(count) = snapshot.sound_alerts {
            self.stats.sound_alerts = Some(count);
        }
        if let Some(raw) = snapshot.last_motion.as_deref() {
            match display::parse_timestamp(raw) {
                Some(ts) => self.stats.last_motion = Some(ts),
                None => tracing::debug!("Ignoring unreadable last_motion {:?}", raw),
            }
        }
        if let Some(raw) = snapshot.uptime.as_deref() {
            match display::parse_timestamp(raw) {
                Some(ts) => self.stats.started_at = Some(ts),
                None => tracing::debug!("Ignoring unreadable uptime {:?}", raw),
            }
        }
        self.refresh_uptime(now);

        if let Some(audio) = &snapshot.audio_stats {
            if let Some(volume) = audio.current_volume {
                self.stats.volume_percent = display::volume_percent(volume);
                self.stats.sound_detected = display::is_sound_detected(volume);
            }
            if let Some(db) = audio.current_db {
                self.stats.current_db = Some(db);
            }
        }
        effects.render(Region::Stats);

        if let Some(recording) = snapshot.is_recording {
            self.is_recording = recording;
            effects.render(Region::Recording);
        }

        let mut controls_changed = false;
        if let Some(active) = snapshot.camera_active {
            self.controls.camera = active;
            controls_changed = true;
        }
        if let Some(active) = snapshot.audio_active {
            self.controls.audio = active;
            controls_changed = true;
        }
        if controls_changed {
            effects.render(Region::Controls);
        }
    }

    /// Append an activity point when the snapshot carries activity fields.
    ///
    /// Returns `true` if a point was appended.
    pub fn record_activity(
        &mut self,
        snapshot: &StatsSnapshot,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> bool {
        if !snapshot.has_activity() {
            return false;
        }
        let motion = snapshot.motion_stats.as_ref().and_then(|m| m.recent_count);
        let sound = snapshot.audio_stats.as_ref().and_then(|a| match self.sound_source {
            SoundSeriesSource::CurrentVolume => a.current_volume,
            SoundSeriesSource::AlertsCount => a.alerts_count,
        });
        self.series.append_sample(motion, sound, display::series_label(now));
        effects.render(Region::Series);
        true
    }

    /// Recompute the uptime clock. Returns `true` if the text changed.
    pub fn refresh_uptime(&mut self, now: DateTime<Utc>) -> bool {
        let Some(start) = self.stats.started_at else {
            return false;
        };
        let uptime = display::format_uptime(start, now);
        if self.stats.uptime.as_deref() == Some(uptime.as_str()) {
            return false;
        }
        self.stats.uptime = Some(uptime);
        true
    }

    /// Light the motion badge.
    pub fn set_motion_live(&mut self, effects: &mut Effects) {
        self.motion_live = true;
        effects.render(Region::MotionBadge);
    }

    /// Turn the motion badge off.
    pub fn clear_motion_live(&mut self, effects: &mut Effects) {
        self.motion_live = false;
        effects.render(Region::MotionBadge);
    }
}
