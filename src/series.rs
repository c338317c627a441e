//! Rolling activity series for the motion/sound chart.
//!
//! A fixed-capacity FIFO of [`SeriesPoint`]s, oldest first. Appending past
//! capacity evicts the oldest point, so the series never grows beyond
//! [`DEFAULT_SERIES_CAPACITY`] (or the configured capacity).

use serde::Serialize;
use std::collections::VecDeque;

/// Number of points kept when no capacity is configured.
pub const DEFAULT_SERIES_CAPACITY: usize = 10;

/// One sample of the activity chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// X-axis label (wall-clock `HH:MM` in the dashboard)
    pub label: String,
    /// Motion line value
    pub motion: f64,
    /// Sound line value
    pub sound: f64,
}

/// Fixed-capacity, chronologically ordered activity series.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    capacity: usize,
    points: VecDeque<SeriesPoint>,
}

impl Default for RollingSeries {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAPACITY)
    }
}

impl RollingSeries {
    /// Create an empty series. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a point, evicting the oldest one if the series is full.
    pub fn append(&mut self, motion: f64, sound: f64, label: impl Into<String>) {
        self.points.push_back(SeriesPoint {
            label: label.into(),
            motion,
            sound,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Append a point where either value may be missing.
    ///
    /// A missing value repeats the previous value of the same line, or 0 when
    /// the series is empty, so the chart draws a continuous line.
    pub fn append_sample(
        &mut self,
        motion: Option<f64>,
        sound: Option<f64>,
        label: impl Into<String>,
    ) {
        let (prev_motion, prev_sound) = self
            .points
            .back()
            .map_or((0.0, 0.0), |p| (p.motion, p.sound));
        self.append(
            motion.unwrap_or(prev_motion),
            sound.unwrap_or(prev_sound),
            label,
        );
    }

    /// Points in chronological order (oldest first).
    #[must_use]
    pub fn current(&self) -> &VecDeque<SeriesPoint> {
        &self.points
    }

    /// Most recent point.
    #[must_use]
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    /// Labels in chart order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.label.as_str())
    }

    /// Motion line in chart order.
    pub fn motion_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.motion)
    }

    /// Sound line in chart order.
    pub fn sound_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.sound)
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eleven_points_evict_the_first() {
        let mut series = RollingSeries::default();
        for i in 1..=11 {
            series.append(i as f64, 0.0, format!("L{i}"));
        }

        assert_eq!(series.len(), 10);
        let labels: Vec<&str> = series.labels().collect();
        let expected: Vec<String> = (2..=11).map(|i| format!("L{i}")).collect();
        assert_eq!(labels, expected);
        let motion: Vec<f64> = series.motion_values().collect();
        assert_eq!(motion, (2..=11).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut series = RollingSeries::new(4);
        for i in 0..50 {
            series.append(i as f64, (i * 2) as f64, i.to_string());
            assert!(series.len() <= 4);
            // Oldest first: values strictly increase front to back
            let motion: Vec<f64> = series.motion_values().collect();
            assert!(motion.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(series.last().map(|p| p.motion), Some(i as f64));
        }
    }

    #[test]
    fn test_missing_values_start_at_zero() {
        let mut series = RollingSeries::default();
        series.append_sample(Some(2.0), None, "a");
        assert_eq!(series.last().map(|p| (p.motion, p.sound)), Some((2.0, 0.0)));
    }

    #[test]
    fn test_missing_values_repeat_previous() {
        let mut series = RollingSeries::default();
        series.append_sample(Some(3.0), Some(0.4), "a");
        series.append_sample(None, Some(0.2), "b");
        series.append_sample(Some(5.0), None, "c");

        let points: Vec<(f64, f64)> =
            series.current().iter().map(|p| (p.motion, p.sound)).collect();
        assert_eq!(points, vec![(3.0, 0.4), (3.0, 0.2), (5.0, 0.2)]);
    }

    #[test]
    fn test_zero_capacity_keeps_one_point() {
        let mut series = RollingSeries::new(0);
        series.append(1.0, 1.0, "a");
        series.append(2.0, 2.0, "b");
        assert_eq!(series.capacity(), 1);
        assert_eq!(series.last().map(|p| p.label.as_str()), Some("b"));
    }
}
