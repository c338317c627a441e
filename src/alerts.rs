//! Bounded alert log, most recent first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::display::format_thousands;
use crate::protocol::{AudioAlert, MotionAlert};

/// Number of alerts kept when no capacity is configured.
pub const DEFAULT_ALERT_CAPACITY: usize = 20;

/// What triggered an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Camera motion detection
    Motion,
    /// Microphone sound detection
    Sound,
}

/// Kind-specific fields carried by an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlertExtra {
    /// Motion alerts carry the number of moving regions
    Motion {
        /// Moving regions, if reported
        count: Option<u64>,
    },
    /// Sound alerts carry the classifier label
    Sound {
        /// Sound classifier label
        sound_type: String,
    },
}

/// One logged detection event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    /// Motion or sound
    pub kind: AlertKind,
    /// When the detection happened
    pub timestamp: DateTime<Utc>,
    /// Human-readable summary
    pub details: String,
    /// Kind-specific fields
    pub extra: AlertExtra,
}

impl AlertRecord {
    /// Build a record from a `motion_alert` payload.
    #[must_use]
    pub fn motion(alert: &MotionAlert, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: AlertKind::Motion,
            timestamp,
            details: format!(
                "Motion detected - area: {} px",
                format_thousands(alert.area)
            ),
            extra: AlertExtra::Motion { count: alert.count },
        }
    }

    /// Build a record from an `audio_alert` payload.
    #[must_use]
    pub fn sound(alert: &AudioAlert, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: AlertKind::Sound,
            timestamp,
            details: format!("Sound detected - level: {:.1} dB", alert.db_level),
            extra: AlertExtra::Sound {
                sound_type: alert.sound_type.clone(),
            },
        }
    }
}

/// Bounded alert list. New records go to the front; overflow drops the tail.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    records: VecDeque<AlertRecord>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

impl AlertLog {
    /// Create an empty log. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Prepend a record, truncating the oldest ones beyond capacity.
    ///
    /// No deduplication: identical consecutive alerts are both kept.
    pub fn push(&mut self, record: AlertRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// All records, most recent first.
    #[must_use]
    pub fn all(&self) -> &VecDeque<AlertRecord> {
        &self.records
    }

    /// Most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&AlertRecord> {
        self.records.front()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
