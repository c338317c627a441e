//! Scripted collaborators for driving a `DashboardSession` without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use url::Url;

use security_dashboard::connection::ConnectionState;
use security_dashboard::error::{DashboardError, Result};
use security_dashboard::frontend::{Frontend, Notification, Region};
use security_dashboard::media::{MediaApi, MediaItem, MediaKind};
use security_dashboard::state::ViewState;
use security_dashboard::transport::{ChannelEvent, Connector};

/// How the scripted server answers one connection attempt.
#[derive(Debug, Clone)]
pub enum Attempt {
    /// Fail to connect
    Refuse,
    /// Accept and immediately deliver these messages
    Accept(Vec<String>),
}

#[derive(Default)]
struct ConnectorState {
    script: VecDeque<Attempt>,
    attempts: Vec<Instant>,
    sent: Vec<String>,
    close: Option<oneshot::Sender<()>>,
    events: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

/// Connector that follows a script. Attempts past the end of the script are refused.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Self {
        let connector = Self::default();
        connector.state.lock().unwrap().script = script.into_iter().collect();
        connector
    }

    /// Instants at which connection attempts started.
    pub fn attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().attempts.clone()
    }

    /// Frames the session transmitted, in order.
    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("session sent invalid JSON"))
            .collect()
    }

    /// Deliver a message on the open connection.
    pub fn push_message(&self, raw: &str) {
        let state = self.state.lock().unwrap();
        let events = state.events.as_ref().expect("no open connection");
        events
            .send(ChannelEvent::Message(raw.to_string()))
            .expect("session gone");
    }

    /// Close the open connection from the server side.
    pub fn drop_connection(&self) {
        let close = self.state.lock().unwrap().close.take();
        if let Some(close) = close {
            let _ = close.send(());
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn run(&self, _url: Url, events: mpsc::UnboundedSender<ChannelEvent>) {
        let attempt = {
            let mut state = self.state.lock().unwrap();
            state.attempts.push(Instant::now());
            state.script.pop_front().unwrap_or(Attempt::Refuse)
        };

        let messages = match attempt {
            Attempt::Refuse => {
                let _ = events.send(ChannelEvent::Closed(Some("connection refused".into())));
                return;
            }
            Attempt::Accept(messages) => messages,
        };

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let (close_tx, mut close_rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.close = Some(close_tx);
            state.events = Some(events.clone());
        }

        let _ = events.send(ChannelEvent::Opened(outbound_tx));
        for message in messages {
            let _ = events.send(ChannelEvent::Message(message));
        }

        loop {
            tokio::select! {
                frame = outbound_rx.recv() => match frame {
                    Some(frame) => self.state.lock().unwrap().sent.push(frame),
                    None => break,
                },
                _ = &mut close_rx => break,
            }
        }

        self.state.lock().unwrap().events = None;
        let _ = events.send(ChannelEvent::Closed(None));
    }
}

/// One scripted listing response: delay, then items or a failure.
#[derive(Debug, Clone)]
pub struct Listing {
    pub delay: Duration,
    pub items: Option<Vec<MediaItem>>,
}

impl Listing {
    pub fn ok(items: Vec<MediaItem>) -> Self {
        Self {
            delay: Duration::ZERO,
            items: Some(items),
        }
    }

    pub fn after(delay: Duration, items: Vec<MediaItem>) -> Self {
        Self {
            delay,
            items: Some(items),
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            items: None,
        }
    }
}

#[derive(Default)]
struct MediaState {
    listings: HashMap<MediaKind, VecDeque<Listing>>,
    list_calls: HashMap<MediaKind, usize>,
    deleted: Vec<(MediaKind, String)>,
    delete_reply: Option<String>,
}

/// Media API answering from scripted listings. Unscripted listings are empty.
#[derive(Clone, Default)]
pub struct StubMediaApi {
    state: Arc<Mutex<MediaState>>,
}

impl StubMediaApi {
    pub fn script(&self, kind: MediaKind, listings: impl IntoIterator<Item = Listing>) {
        self.state
            .lock()
            .unwrap()
            .listings
            .entry(kind)
            .or_default()
            .extend(listings);
    }

    /// Make deletions fail with this server message.
    pub fn reject_deletes(&self, message: &str) {
        self.state.lock().unwrap().delete_reply = Some(message.to_string());
    }

    pub fn list_calls(&self, kind: MediaKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn deleted(&self) -> Vec<(MediaKind, String)> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl MediaApi for StubMediaApi {
    async fn list(&self, kind: MediaKind) -> Result<Vec<MediaItem>> {
        let listing = {
            let mut state = self.state.lock().unwrap();
            *state.list_calls.entry(kind).or_default() += 1;
            state
                .listings
                .get_mut(&kind)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Listing::ok(Vec::new()))
        };
        tokio::time::sleep(listing.delay).await;
        listing
            .items
            .ok_or_else(|| DashboardError::Transport("media server unavailable".into()))
    }

    async fn delete(&self, kind: MediaKind, filename: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.delete_reply.clone() {
            return Err(DashboardError::MediaRejected(message));
        }
        state.deleted.push((kind, filename.to_string()));
        Ok(())
    }
}

/// Everything a frontend was asked to do.
#[derive(Debug, Default)]
pub struct FrontendLog {
    pub notifications: Vec<Notification>,
    pub renders: Vec<Region>,
    pub connection: Vec<ConnectionState>,
    pub motion_badge: Vec<bool>,
    pub photo_names: Vec<Vec<String>>,
}

impl FrontendLog {
    pub fn titled(&self, title: &str) -> usize {
        self.notifications.iter().filter(|n| n.title == title).count()
    }
}

/// Frontend that records every call.
#[derive(Clone, Default)]
pub struct RecordingFrontend {
    pub log: Arc<Mutex<FrontendLog>>,
}

impl RecordingFrontend {
    pub fn snapshot<T>(&self, f: impl FnOnce(&FrontendLog) -> T) -> T {
        f(&self.log.lock().unwrap())
    }
}

impl Frontend for RecordingFrontend {
    fn render(&mut self, view: &ViewState, region: Region) {
        let mut log = self.log.lock().unwrap();
        log.renders.push(region);
        match region {
            Region::MotionBadge => log.motion_badge.push(view.motion_live),
            Region::Media(MediaKind::Photos) => log.photo_names.push(
                view.media
                    .items(MediaKind::Photos)
                    .iter()
                    .map(|item| item.filename.clone())
                    .collect(),
            ),
            _ => {}
        }
    }

    fn notify(&mut self, notification: &Notification) {
        self.log.lock().unwrap().notifications.push(notification.clone());
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        self.log.lock().unwrap().connection.push(state);
    }
}

pub fn media_item(filename: &str) -> MediaItem {
    MediaItem {
        filename: filename.to_string(),
        created: "2026-03-01T10:00:00".to_string(),
        size: None,
    }
}
