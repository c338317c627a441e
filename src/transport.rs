//! Channel transport.
//!
//! A [`Connector`] opens one channel to the server and reports what happens
//! on it as [`ChannelEvent`]s. Every run ends with exactly one
//! [`ChannelEvent::Closed`], including runs where the connection never
//! opened, so the connection manager sees a close for each attempt.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::{DashboardError, Result};

/// Something that happened on the channel.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The channel opened; text sent on the sender goes to the server.
    Opened(mpsc::UnboundedSender<String>),
    /// A text frame arrived.
    Message(String),
    /// The channel closed or could not be opened.
    Closed(Option<String>),
}

/// Opens channels to the server.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `url` and pump the channel until it closes, reporting on
    /// `events`. Must send exactly one `Closed` before returning.
    async fn run(&self, url: Url, events: mpsc::UnboundedSender<ChannelEvent>);
}

/// [`Connector`] over WebSocket using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn run(&self, url: Url, events: mpsc::UnboundedSender<ChannelEvent>) {
        let reason = match pump(&url, &events).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Channel to {} ended: {}", url, e);
                Some(e.to_string())
            }
        };
        let _ = events.send(ChannelEvent::Closed(reason));
    }
}

async fn pump(url: &Url, events: &mpsc::UnboundedSender<ChannelEvent>) -> Result<()> {
    let (socket, _response) = connect_async(url.as_str()).await?;
    tracing::debug!("WebSocket open to {}", url);

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    events
        .send(ChannelEvent::Opened(outbound_tx))
        .map_err(|_| DashboardError::SessionClosed)?;

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    events
                        .send(ChannelEvent::Message(text))
                        .map_err(|_| DashboardError::SessionClosed)?;
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        tracing::debug!(
                            "Server closed the channel: {} {}",
                            frame.code,
                            frame.reason
                        );
                    }
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some(text) => sink.send(Message::Text(text)).await?,
                // The session dropped its sender: shut the socket.
                None => {
                    let _ = sink.close().await;
                    return Ok(());
                }
            },
        }
    }
}
