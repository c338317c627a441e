//! Connection state machine and auto-reconnect logic.
//!
//! The manager owns the lifecycle of the single server channel. It does no
//! I/O itself: the session feeds it transport events (`handle_open`,
//! `handle_close`, `handle_message`) and asks it when to dial again, which
//! keeps every transition testable without a network.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──begin_connect()──> Connecting ──handle_open()──> Connected
//!      ▲                                 │                            │
//!      │                           handle_close()               handle_close()
//!      │                                 ▼                            │
//!      └──────────────────────── Disconnected <───────────────────────┘
//!                     (one reconnect scheduled after a fixed delay)
//! ```
//!
//! Reconnection is unconditional: a fixed delay, no backoff growth and no
//! attempt limit. At most one reconnect is pending at any time.

use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{DashboardError, Result};

/// Delay before reconnecting when nothing is configured.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Connection state of the server channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No open channel. A reconnect may be pending.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The channel is open and commands can be sent.
    Connected,
}

impl ConnectionState {
    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if a connection attempt is in progress.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Returns a short status label for display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle<'a> {
    /// The channel opened.
    Open,
    /// The channel closed (gracefully or not).
    Close,
    /// A raw message arrived.
    Message(&'a str),
}

/// Subscriber to channel lifecycle notifications.
pub trait ConnectionObserver: Send {
    /// Called for every open, close and inbound message.
    fn on_lifecycle(&mut self, event: &Lifecycle<'_>);
}

impl<F> ConnectionObserver for F
where
    F: FnMut(&Lifecycle<'_>) + Send,
{
    fn on_lifecycle(&mut self, event: &Lifecycle<'_>) {
        self(event)
    }
}

/// Outcome of a transport close reported to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// A reconnect was scheduled for the given instant.
    ReconnectScheduled(Instant),
    /// A reconnect was already pending; nothing new was scheduled.
    AlreadyPending,
    /// The manager was shut down; no reconnect.
    Stopped,
}

/// Manages connection state and the reconnect schedule.
pub struct ConnectionManager {
    state: ConnectionState,
    reconnect_delay: Duration,
    outbound: Option<mpsc::UnboundedSender<String>>,
    next_attempt_at: Option<Instant>,
    reconnects_scheduled: u64,
    stopped: bool,
    observers: Vec<Box<dyn ConnectionObserver>>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("next_attempt_at", &self.next_attempt_at)
            .field("reconnects_scheduled", &self.reconnects_scheduled)
            .field("stopped", &self.stopped)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state.
    #[must_use]
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            outbound: None,
            next_attempt_at: None,
            reconnects_scheduled: 0,
            stopped: false,
            observers: Vec::new(),
        }
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Delay between a close and the next attempt.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// When the pending reconnect is due, if one is scheduled.
    #[must_use]
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.next_attempt_at
    }

    /// Total reconnects scheduled over the manager's lifetime.
    #[must_use]
    pub fn reconnects_scheduled(&self) -> u64 {
        self.reconnects_scheduled
    }

    /// Register a lifecycle observer.
    pub fn subscribe(&mut self, observer: impl ConnectionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Start a connection attempt.
    ///
    /// Returns `false` if an attempt is already in progress, the channel is
    /// open, or the manager was shut down.
    pub fn begin_connect(&mut self) -> bool {
        if self.stopped || self.state != ConnectionState::Disconnected {
            tracing::debug!("Not connecting (state={}, stopped={})", self.state, self.stopped);
            return false;
        }
        self.next_attempt_at = None;
        self.state = ConnectionState::Connecting;
        tracing::debug!("Connecting to server");
        true
    }

    /// The channel opened; `outbound` carries text frames to the server.
    pub fn handle_open(&mut self, outbound: mpsc::UnboundedSender<String>) {
        if self.state != ConnectionState::Connecting {
            tracing::debug!("Open reported while {}", self.state);
        }
        self.state = ConnectionState::Connected;
        self.outbound = Some(outbound);
        self.next_attempt_at = None;
        tracing::info!("Connected to server");
        self.notify(&Lifecycle::Open);
    }

    /// The channel closed or failed to open. Schedules exactly one reconnect.
    pub fn handle_close(&mut self, now: Instant) -> CloseOutcome {
        let was = self.state;
        self.state = ConnectionState::Disconnected;
        self.outbound = None;
        self.notify(&Lifecycle::Close);

        if self.stopped {
            return CloseOutcome::Stopped;
        }
        if self.next_attempt_at.is_some() {
            tracing::debug!("Close reported while reconnect already pending");
            return CloseOutcome::AlreadyPending;
        }

        let at = now + self.reconnect_delay;
        self.next_attempt_at = Some(at);
        self.reconnects_scheduled += 1;
        tracing::info!(
            "Connection closed (was {}), reconnecting in {:.1}s",
            was,
            self.reconnect_delay.as_secs_f64()
        );
        CloseOutcome::ReconnectScheduled(at)
    }

    /// Forward a raw inbound message to observers.
    pub fn handle_message(&mut self, raw: &str) {
        self.notify(&Lifecycle::Message(raw));
    }

    /// Start the pending reconnect if it is due at `now`.
    ///
    /// Returns `true` when the caller should dial.
    pub fn poll_reconnect(&mut self, now: Instant) -> bool {
        match self.next_attempt_at {
            Some(at) if now >= at => {
                self.next_attempt_at = None;
                self.begin_connect()
            }
            _ => false,
        }
    }

    /// Send a text frame to the server.
    ///
    /// Fails with [`DashboardError::NotConnected`] unless the channel is open.
    /// Nothing is queued for later.
    pub fn send(&mut self, payload: String) -> Result<()> {
        if !self.state.is_connected() {
            return Err(DashboardError::NotConnected);
        }
        let outbound = self.outbound.as_ref().ok_or(DashboardError::NotConnected)?;
        outbound
            .send(payload)
            .map_err(|_| DashboardError::Transport("outbound channel closed".into()))
    }

    /// Tear down: drop the channel and cancel any pending reconnect.
    pub fn shutdown(&mut self) {
        self.stopped = true;
        self.next_attempt_at = None;
        self.outbound = None;
        self.state = ConnectionState::Disconnected;
        tracing::info!("Connection manager shut down");
    }

    fn notify(&mut self, event: &Lifecycle<'_>) {
        for observer in &mut self.observers {
            observer.on_lifecycle(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn connected() -> (ConnectionManager, mpsc::UnboundedReceiver<String>) {
        let mut manager = ConnectionManager::default();
        assert!(manager.begin_connect());
        let (tx, rx) = mpsc::unbounded_channel();
        manager.handle_open(tx);
        (manager, rx)
    }

    #[test]
    fn test_connection_state_labels() {
        assert_eq!(ConnectionState::Disconnected.label(), "Disconnected");
        assert_eq!(ConnectionState::Connecting.label(), "Connecting...");
        assert_eq!(ConnectionState::Connected.label(), "Connected");
    }

    #[test]
    fn test_open_transitions_to_connected() {
        let (manager, _rx) = connected();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.reconnect_deadline().is_none());
    }

    #[test]
    fn test_begin_connect_is_exclusive() {
        let mut manager = ConnectionManager::default();
        assert!(manager.begin_connect());
        assert!(!manager.begin_connect());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_exactly_one_reconnect() {
        let (mut manager, _rx) = connected();
        let closed_at = Instant::now();

        let outcome = manager.handle_close(closed_at);
        assert_eq!(
            outcome,
            CloseOutcome::ReconnectScheduled(closed_at + Duration::from_millis(3000))
        );
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        // A second close for the same lifecycle does not stack another attempt
        assert_eq!(manager.handle_close(closed_at), CloseOutcome::AlreadyPending);
        assert_eq!(manager.reconnects_scheduled(), 1);

        // Not due yet
        assert!(!manager.poll_reconnect(closed_at + Duration::from_millis(2999)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        // Due
        assert!(manager.poll_reconnect(closed_at + Duration::from_millis(3000)));
        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert!(manager.reconnect_deadline().is_none());
        assert!(!manager.poll_reconnect(closed_at + Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempt_retries_without_backoff() {
        let mut manager = ConnectionManager::new(Duration::from_millis(3000));
        let mut now = Instant::now();
        assert!(manager.begin_connect());

        for _ in 0..5 {
            let CloseOutcome::ReconnectScheduled(at) = manager.handle_close(now) else {
                panic!("expected a scheduled reconnect");
            };
            assert_eq!(at - now, Duration::from_millis(3000));
            now = at;
            assert!(manager.poll_reconnect(now));
        }
        assert_eq!(manager.reconnects_scheduled(), 5);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut manager = ConnectionManager::default();
        assert!(matches!(
            manager.send("{}".into()),
            Err(DashboardError::NotConnected)
        ));

        manager.begin_connect();
        assert!(matches!(
            manager.send("{}".into()),
            Err(DashboardError::NotConnected)
        ));
    }

    #[test]
    fn test_send_when_connected() {
        let (mut manager, mut rx) = connected();
        manager.send("hello".into()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_close_is_not_queued() {
        let (mut manager, mut rx) = connected();
        manager.handle_close(Instant::now());
        assert!(manager.send("late".into()).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_reconnect() {
        let (mut manager, _rx) = connected();
        manager.handle_close(Instant::now());
        manager.shutdown();
        assert!(manager.reconnect_deadline().is_none());
        assert!(!manager.begin_connect());
        assert_eq!(manager.handle_close(Instant::now()), CloseOutcome::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_see_lifecycle() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut manager = ConnectionManager::default();
        manager.subscribe(move |event: &Lifecycle<'_>| {
            let label = match event {
                Lifecycle::Open => "open".to_string(),
                Lifecycle::Close => "close".to_string(),
                Lifecycle::Message(raw) => format!("msg:{raw}"),
            };
            sink.lock().unwrap().push(label);
        });

        manager.begin_connect();
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.handle_open(tx);
        manager.handle_message("{\"type\":\"stats_update\"}");
        manager.handle_close(Instant::now());

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["open", "msg:{\"type\":\"stats_update\"}", "close"]
        );
    }
}
