//! Derived display values.
//!
//! Pure helpers that turn raw snapshot fields into what the dashboard shows:
//! uptime clock, volume bar width, dB text, alert wording and the sensitivity
//! slider mappings.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::protocol::SensitivityLevel;

/// Volume above which the audio indicator reports "sound detected".
pub const SOUND_DETECTED_VOLUME: f64 = 0.05;

/// Elapsed time between `start` and `now` as zero-padded `HH:MM`.
///
/// A start time in the future reads as `00:00`. Hours are not wrapped.
#[must_use]
pub fn format_uptime(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - start).num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Volume (nominally 0.0..=1.0) as a bar percentage clamped to `[0, 100]`.
#[must_use]
pub fn volume_percent(volume: f64) -> f64 {
    if volume.is_nan() {
        return 0.0;
    }
    (volume * 100.0).clamp(0.0, 100.0)
}

/// dB reading with one decimal, e.g. `"30.0 dB"`.
#[must_use]
pub fn format_db(db: f64) -> String {
    format!("{db:.1} dB")
}

/// Whether the audio indicator should show "sound detected".
#[must_use]
pub fn is_sound_detected(volume: f64) -> bool {
    volume > SOUND_DETECTED_VOLUME
}

/// Round to an integer and group digits by thousands: `12345.4` → `"12,345"`.
#[must_use]
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Parse a server timestamp. RFC 3339 with offset, or naive ISO-8601 read as
/// the client's local time (the server reports its own wall clock).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_in(raw, &Local)
}

/// [`parse_timestamp`] with naive values read in `tz`.
///
/// A naive time that falls twice in `tz` (clocks going back) resolves to the
/// earlier instant; one skipped by a forward jump does not parse.
#[must_use]
pub fn parse_timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    naive
        .and_local_timezone(tz.clone())
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Activity chart label for a sample taken at `at`: local `HH:MM`.
#[must_use]
pub fn series_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Local wall-clock `HH:MM:SS`, used for alert and media timestamps.
#[must_use]
pub fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Motion level sent for a 1..=10 slider position.
#[must_use]
pub fn motion_level(slider: u8) -> SensitivityLevel {
    match slider {
        0..=3 => SensitivityLevel::Low,
        4..=7 => SensitivityLevel::Medium,
        _ => SensitivityLevel::High,
    }
}

/// Audio volume threshold sent for a 1..=10 slider position.
///
/// Higher sensitivity means a lower threshold.
#[must_use]
pub fn audio_threshold(slider: u8) -> f64 {
    match slider {
        0..=3 => 0.2,
        4..=7 => 0.12,
        _ => 0.06,
    }
}

/// Threshold shown next to the audio slider, in dB.
#[must_use]
pub fn threshold_db(threshold: f64) -> i32 {
    (20.0 * threshold.log10() + 60.0).round() as i32
}

/// Slider caption, e.g. `"Medium sensitivity (5)"`.
#[must_use]
pub fn sensitivity_caption(slider: u8) -> String {
    let band = match motion_level(slider) {
        SensitivityLevel::Low => "Low",
        SensitivityLevel::Medium => "Medium",
        SensitivityLevel::High => "High",
    };
    format!("{band} sensitivity ({slider})")
}
