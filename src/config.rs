//! Dashboard configuration using Figment.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults ([`DashboardConfig::default`])
//! 2. An optional TOML file (`security-dashboard.toml` unless `--config` is given)
//! 3. Environment variables prefixed with `SECURITY_DASHBOARD_`
//!
//! # Example
//! ```no_run
//! use security_dashboard::config::DashboardConfig;
//!
//! let config = DashboardConfig::load()?;
//! println!("Server: {}", config.server);
//! # Ok::<(), security_dashboard::error::DashboardError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::logging::OutputFormat;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "security-dashboard.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "SECURITY_DASHBOARD_";

/// Which `audio_stats` field feeds the sound line of the activity chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundSeriesSource {
    /// Instantaneous microphone volume
    #[default]
    CurrentVolume,
    /// Running count of sound alerts
    AlertsCount,
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Monitoring server address (host:port, ws://, http:// ...)
    pub server: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: OutputFormat,
    /// Delay before reconnecting after the channel closes
    pub reconnect_delay_ms: u64,
    /// Statistics refresh tick
    pub stats_interval_ms: u64,
    /// Media catalog refresh tick
    pub media_refresh_interval_ms: u64,
    /// How long the motion "live" badge stays up after an alert
    pub live_flag_ms: u64,
    /// Number of points kept in the activity series
    pub series_capacity: usize,
    /// Number of alerts kept in the alert log
    pub alert_capacity: usize,
    /// Source of the sound series values
    pub sound_series_source: SoundSeriesSource,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
            log_format: OutputFormat::Pretty,
            reconnect_delay_ms: 3000,
            stats_interval_ms: 2000,
            media_refresh_interval_ms: 30000,
            live_flag_ms: 3000,
            series_capacity: 10,
            alert_capacity: 20,
            sound_series_source: SoundSeriesSource::CurrentVolume,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from the default file (if present) and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = Self::figment(path.as_ref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The layered provider stack, exposed for callers that merge extra sources.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<()> {
        crate::logging::parse_log_level(&self.log_level).map_err(DashboardError::Config)?;

        let durations = [
            ("reconnect_delay_ms", self.reconnect_delay_ms),
            ("stats_interval_ms", self.stats_interval_ms),
            ("media_refresh_interval_ms", self.media_refresh_interval_ms),
            ("live_flag_ms", self.live_flag_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(DashboardError::Config(format!("{name} must be > 0")));
            }
        }

        if self.series_capacity == 0 {
            return Err(DashboardError::Config("series_capacity must be > 0".into()));
        }
        if self.alert_capacity == 0 {
            return Err(DashboardError::Config("alert_capacity must be > 0".into()));
        }

        Ok(())
    }

    /// Reconnect delay as a `Duration`.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Statistics tick as a `Duration`.
    #[must_use]
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    /// Media refresh tick as a `Duration`.
    #[must_use]
    pub fn media_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.media_refresh_interval_ms)
    }

    /// Live badge duration as a `Duration`.
    #[must_use]
    pub fn live_flag_duration(&self) -> Duration {
        Duration::from_millis(self.live_flag_ms)
    }
}
