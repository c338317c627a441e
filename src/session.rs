//! Dashboard session: the event loop that ties the client together.
//!
//! A [`DashboardSession`] owns the view state, the connection manager and the
//! frontend. [`DashboardSession::run`] drives them from a single
//! `tokio::select!` loop, so every state change happens on one task and
//! nothing needs a lock. The loop reacts to:
//!
//! - channel events from the connector task (open, message, close)
//! - user requests arriving through a [`SessionHandle`]
//! - the statistics tick and the media refresh tick
//! - the pending reconnect deadline
//! - motion badge expiry
//! - finished media fetches and deletions
//!
//! Media requests run on spawned tasks and report back when done. They are
//! never cancelled, so when two listings of the same kind overlap, whichever
//! response arrives last is what the catalog shows.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::address::ServerAddress;
use crate::command::{self, UserIntent};
use crate::config::DashboardConfig;
use crate::connection::{CloseOutcome, ConnectionManager, ConnectionObserver, ConnectionState};
use crate::error::{DashboardError, Result};
use crate::frontend::{Effect, Effects, Frontend, Notification, Region};
use crate::media::{MediaApi, MediaItem, MediaKind};
use crate::router::EventRouter;
use crate::state::ViewState;
use crate::transport::{ChannelEvent, Connector};

/// Request sent to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionRequest {
    /// A dashboard action
    Intent(UserIntent),
    /// Reload a media listing now
    RefreshMedia(MediaKind),
    /// Delete a stored file
    DeleteMedia {
        /// Listing the file belongs to
        kind: MediaKind,
        /// File to delete
        filename: String,
    },
    /// Stop the loop
    Shutdown,
}

/// Cloneable handle for sending requests to a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionRequest>,
}

impl SessionHandle {
    /// Queue a request.
    pub fn send(&self, request: SessionRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| DashboardError::SessionClosed)
    }

    /// Queue a dashboard action.
    pub fn intent(&self, intent: UserIntent) -> Result<()> {
        self.send(SessionRequest::Intent(intent))
    }

    /// Reload a media listing.
    pub fn refresh_media(&self, kind: MediaKind) -> Result<()> {
        self.send(SessionRequest::RefreshMedia(kind))
    }

    /// Delete a stored file.
    pub fn delete_media(&self, kind: MediaKind, filename: impl Into<String>) -> Result<()> {
        self.send(SessionRequest::DeleteMedia {
            kind,
            filename: filename.into(),
        })
    }

    /// Ask the session to stop.
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionRequest::Shutdown)
    }
}

#[derive(Debug)]
enum MediaOutcome {
    Listed(MediaKind, Result<Vec<MediaItem>>),
    Deleted(MediaKind, String, Result<()>),
}

/// A running dashboard client.
pub struct DashboardSession<F: Frontend> {
    config: DashboardConfig,
    address: ServerAddress,
    view: ViewState,
    connection: ConnectionManager,
    router: EventRouter,
    connector: Arc<dyn Connector>,
    media_api: Arc<dyn MediaApi>,
    frontend: F,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    media_tx: mpsc::UnboundedSender<MediaOutcome>,
    media_rx: mpsc::UnboundedReceiver<MediaOutcome>,
    request_tx: mpsc::UnboundedSender<SessionRequest>,
    request_rx: mpsc::UnboundedReceiver<SessionRequest>,
    live_flag_deadlines: VecDeque<Instant>,
}

impl<F: Frontend> DashboardSession<F> {
    /// Build a session. Nothing happens until [`run`](Self::run).
    pub fn new(
        config: DashboardConfig,
        address: ServerAddress,
        connector: Arc<dyn Connector>,
        media_api: Arc<dyn MediaApi>,
        frontend: F,
    ) -> Self {
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        Self {
            view: ViewState::new(&config),
            connection: ConnectionManager::new(config.reconnect_delay()),
            router: EventRouter::new(config.live_flag_duration()),
            config,
            address,
            connector,
            media_api,
            frontend,
            channel_tx,
            channel_rx,
            media_tx,
            media_rx,
            request_tx,
            request_rx,
            live_flag_deadlines: VecDeque::new(),
        }
    }

    /// Handle for sending requests while the session runs.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.request_tx.clone(),
        }
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Connection state machine.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// The frontend.
    #[must_use]
    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Server the session connects to.
    #[must_use]
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Register a channel lifecycle observer.
    pub fn subscribe(&mut self, observer: impl ConnectionObserver + 'static) {
        self.connection.subscribe(observer);
    }

    /// Run until a shutdown request arrives, then return the session so its
    /// final state can be inspected.
    pub async fn run(mut self) -> Self {
        tracing::info!("Starting dashboard session for {}", self.address);
        self.start();

        let stats_period = self.config.stats_interval();
        let mut stats_tick = time::interval_at(Instant::now() + stats_period, stats_period);
        stats_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let media_period = self.config.media_refresh_interval();
        let mut media_tick = time::interval_at(Instant::now() + media_period, media_period);
        media_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let reconnect_at = self.connection.reconnect_deadline();
            let live_flag_at = self.live_flag_deadlines.front().copied();

            tokio::select! {
                Some(event) = self.channel_rx.recv() => self.on_channel_event(event),
                Some(request) = self.request_rx.recv() => {
                    if request == SessionRequest::Shutdown {
                        break;
                    }
                    self.on_request(request);
                }
                Some(outcome) = self.media_rx.recv() => self.on_media_outcome(outcome),
                _ = stats_tick.tick() => self.on_stats_tick(),
                _ = media_tick.tick() => {
                    for kind in MediaKind::ALL {
                        self.spawn_list(kind);
                    }
                }
                _ = sleep_until(reconnect_at) => self.on_reconnect_due(),
                _ = sleep_until(live_flag_at) => self.on_live_flag_expired(),
            }
        }

        self.connection.shutdown();
        self.frontend.connection_changed(self.connection.state());
        tracing::info!("Dashboard session stopped");
        self
    }

    fn start(&mut self) {
        let mut effects = Effects::new();
        effects.notify(Notification::info(
            "Welcome to the security dashboard",
            "The system is active and monitoring.",
        ));
        self.apply_effects(effects);

        self.connect();
        for kind in MediaKind::ALL {
            self.spawn_list(kind);
        }
    }

    fn connect(&mut self) {
        if !self.connection.begin_connect() {
            return;
        }
        self.frontend.connection_changed(ConnectionState::Connecting);
        self.spawn_connector();
    }

    fn on_channel_event(&mut self, event: ChannelEvent) {
        let mut effects = Effects::new();
        match event {
            ChannelEvent::Opened(outbound) => {
                self.connection.handle_open(outbound);
                self.frontend.connection_changed(ConnectionState::Connected);
                effects.notify(Notification::success("Connected", "Connected to the server"));
            }
            ChannelEvent::Message(raw) => {
                self.connection.handle_message(&raw);
                self.router.route(&raw, &mut self.view, Utc::now(), &mut effects);
            }
            ChannelEvent::Closed(reason) => {
                if let Some(reason) = reason {
                    tracing::debug!("Channel closed: {}", reason);
                }
                let outcome = self.connection.handle_close(Instant::now());
                self.frontend.connection_changed(ConnectionState::Disconnected);
                if let CloseOutcome::ReconnectScheduled(_) = outcome {
                    effects.notify(Notification::error(
                        "Disconnected",
                        "Connection lost - reconnecting...",
                    ));
                }
            }
        }
        self.apply_effects(effects);
    }

    fn on_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Intent(intent) => {
                let mut effects = Effects::new();
                command::apply_intent(intent, &mut self.view, &mut self.connection, &mut effects);
                self.apply_effects(effects);
            }
            SessionRequest::RefreshMedia(kind) => self.spawn_list(kind),
            SessionRequest::DeleteMedia { kind, filename } => self.spawn_delete(kind, filename),
            SessionRequest::Shutdown => {}
        }
    }

    fn on_media_outcome(&mut self, outcome: MediaOutcome) {
        let mut effects = Effects::new();
        match outcome {
            MediaOutcome::Listed(kind, Ok(items)) => {
                tracing::debug!("Loaded {} {}", items.len(), kind);
                self.view.media.replace(kind, items);
                effects.render(Region::Media(kind));
            }
            MediaOutcome::Listed(kind, Err(e)) => {
                tracing::warn!("Failed to load {}: {}", kind, e);
                effects.notify(Notification::error(
                    "Media error",
                    format!("Could not load {kind}"),
                ));
            }
            MediaOutcome::Deleted(kind, filename, Ok(())) => {
                tracing::info!("Deleted {} {}", kind.noun(), filename);
                effects.notify(Notification::success(
                    "Deleted",
                    format!("The {} was deleted", kind.noun()),
                ));
                effects.refresh_media(kind);
            }
            MediaOutcome::Deleted(kind, filename, Err(e)) => {
                tracing::warn!("Failed to delete {} {}: {}", kind.noun(), filename, e);
                let message = match e {
                    DashboardError::MediaRejected(message) => message,
                    _ => "Error communicating with the server".to_string(),
                };
                effects.notify(Notification::error("Delete failed", message));
            }
        }
        self.apply_effects(effects);
    }

    fn on_stats_tick(&mut self) {
        self.view.refresh_uptime(Utc::now());
        self.frontend.render(&self.view, Region::Stats);
    }

    fn on_reconnect_due(&mut self) {
        if self.connection.poll_reconnect(Instant::now()) {
            tracing::info!("Reconnecting to {}", self.address);
            self.frontend.connection_changed(ConnectionState::Connecting);
            self.spawn_connector();
        }
    }

    fn on_live_flag_expired(&mut self) {
        self.live_flag_deadlines.pop_front();
        let mut effects = Effects::new();
        self.view.clear_motion_live(&mut effects);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Effects) {
        for effect in effects {
            match effect {
                Effect::Render(region) => self.frontend.render(&self.view, region),
                Effect::Notify(notification) => self.frontend.notify(&notification),
                Effect::RefreshMedia(kind) => self.spawn_list(kind),
                Effect::ClearLiveFlagAfter(delay) => {
                    self.live_flag_deadlines.push_back(Instant::now() + delay);
                }
            }
        }
    }

    fn spawn_connector(&self) {
        let connector = Arc::clone(&self.connector);
        let url = self.address.url().clone();
        let events = self.channel_tx.clone();
        tokio::spawn(async move { connector.run(url, events).await });
    }

    fn spawn_list(&self, kind: MediaKind) {
        let api = Arc::clone(&self.media_api);
        let results = self.media_tx.clone();
        tokio::spawn(async move {
            let outcome = api.list(kind).await;
            let _ = results.send(MediaOutcome::Listed(kind, outcome));
        });
    }

    fn spawn_delete(&self, kind: MediaKind, filename: String) {
        let api = Arc::clone(&self.media_api);
        let results = self.media_tx.clone();
        tokio::spawn(async move {
            let outcome = api.delete(kind, &filename).await;
            let _ = results.send(MediaOutcome::Deleted(kind, filename, outcome));
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
