//! # Security Dashboard Client Library
//!
//! Client core for a home-security monitoring dashboard. It keeps a live view
//! of a remote monitoring server (camera and microphone statistics, motion
//! and sound alerts, captured media) and relays user commands back to it.
//! Rendering is left to a [`frontend::Frontend`] implementation; the library
//! only decides what changed.
//!
//! ## Crate Structure
//!
//! - **`address`**: Normalises server addresses into the WebSocket channel URL
//!   and the matching HTTP base for media endpoints.
//! - **`alerts`**: The bounded, most-recent-first alert log.
//! - **`command`**: Outbound commands and the user actions that produce them.
//! - **`config`**: Layered configuration (defaults, TOML file, environment).
//! - **`connection`**: The channel state machine with fixed-delay reconnects.
//! - **`display`**: Derived display values such as uptime and volume percent.
//! - **`error`**: The `DashboardError` enum shared by every module.
//! - **`frontend`**: Effects, notifications and the `Frontend` trait.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`media`**: The photo/recording catalog and its HTTP client.
//! - **`protocol`**: Inbound event and outbound command wire types.
//! - **`router`**: Dispatches inbound events onto view state.
//! - **`series`**: The rolling activity series behind the chart.
//! - **`session`**: The event loop that runs everything.
//! - **`state`**: `ViewState` and the snapshot reducer.
//! - **`transport`**: The `Connector` trait and its WebSocket implementation.

pub mod address;
pub mod alerts;
pub mod command;
pub mod config;
pub mod connection;
pub mod display;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod media;
pub mod protocol;
pub mod router;
pub mod series;
pub mod session;
pub mod state;
pub mod transport;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use session::{DashboardSession, SessionHandle, SessionRequest};
